//! Network Module
//!
//! Hostname resolution for diagnostics and replication detection.

mod resolver;

pub use resolver::{Addresses, HostResolver, StaticResolver, SystemResolver};
