//! Connection Module
//!
//! Turns the four connection keys into a primary/replica descriptor pair,
//! opens connections on demand and classifies their failures.

pub mod classify;
mod descriptor;
mod info;
mod source;

pub use classify::FailureReason;
pub use descriptor::{
    truncate_value, ConnectionDescriptor, QueryHandle, Role, DATABASE_NAME, TABLE_NAME,
    VALUE_LENGTH,
};
pub use info::{
    ConnectionInfo, Credentials, ReplicationStatus, PASSWORD_KEY, PRIMARY_HOST_KEY,
    REPLICA_HOST_KEY, USERNAME_KEY,
};
pub use source::{DirectorySource, KeySource, MapSource};
