//! Database Executor Module
//!
//! The narrow seam between connection descriptors and the database client.
//! `MySqlConnector` talks to a real MariaDB/MySQL server through sqlx;
//! `MemoryConnector` is an in-process stand-in reporting the same codes.

mod memory;
mod mysql;

use async_trait::async_trait;
use thiserror::Error;

use crate::connection::ConnectionDescriptor;

pub use memory::MemoryConnector;
pub use mysql::{driver_code, MySqlConnector};

/// Low-level failure reported by the database client, reduced to its
/// MySQL client/server error number
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct DriverError {
    pub code: u16,
    pub message: String,
}

impl DriverError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Opens sessions against the host named by a descriptor
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open one session with the descriptor's host and credentials
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> std::result::Result<Box<dyn Session>, DriverError>;
}

/// A single open database session
#[async_trait]
pub trait Session: Send {
    /// `CREATE DATABASE IF NOT EXISTS`
    async fn create_database(&mut self, database: &str) -> std::result::Result<(), DriverError>;

    /// `USE`; fails with 1049 when the database is absent
    async fn use_database(&mut self, database: &str) -> std::result::Result<(), DriverError>;

    /// `CREATE TABLE IF NOT EXISTS` with a single fixed-width text column
    async fn create_table(
        &mut self,
        table: &str,
        value_length: usize,
    ) -> std::result::Result<(), DriverError>;

    /// Full scan of the value column, in retrieval order
    async fn select_values(&mut self, table: &str) -> std::result::Result<Vec<String>, DriverError>;

    /// Insert one row, returns affected rows
    async fn insert_value(
        &mut self,
        table: &str,
        value: &str,
    ) -> std::result::Result<u64, DriverError>;

    async fn commit(&mut self) -> std::result::Result<(), DriverError>;

    /// Close the session gracefully
    async fn close(self: Box<Self>) -> std::result::Result<(), DriverError>;
}
