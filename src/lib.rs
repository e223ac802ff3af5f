//! dbpair - Primary/Replica Database Connectivity Demo
//!
//! Reads credentials and two hostnames (a writable primary and a read-only
//! replica) from a key source, connects on demand, lazily provisions a
//! one-table schema on the primary, writes to the primary and reads from
//! the replica.
//!
//! # Architecture
//!
//! Every request builds a fresh [`ConnectionInfo`] and its two
//! [`ConnectionDescriptor`]s; nothing is pooled or cached between requests.
//! Connection failures are classified into host-unreachable,
//! authentication-rejected or unknown, tagged with the role that failed so
//! the page layer can tell a read-path failure from a write-path failure.
//!
//! # Features
//!
//! - Lazy, idempotent schema creation on the primary
//! - Empty reads while the replica has not seen the schema yet
//! - Replication detection by comparing resolved address sets
//! - HTTP demo pages plus JSON status and health endpoints

pub mod api;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod network;

pub use config::DbPairConfig;
pub use connection::{ConnectionDescriptor, ConnectionInfo, FailureReason, Role};
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::DbPairConfig;
    pub use crate::connection::{
        ConnectionDescriptor, ConnectionInfo, DirectorySource, FailureReason, KeySource, Role,
    };
    pub use crate::error::{Error, Result};
    pub use crate::executor::{Connector, MySqlConnector};
    pub use crate::network::{HostResolver, SystemResolver};
}
