//! dbpair Error Types

use thiserror::Error;

use crate::connection::{ConnectionDescriptor, FailureReason, Role};
use crate::executor::DriverError;

/// Result type alias for dbpair operations
pub type Result<T> = std::result::Result<T, Error>;

/// dbpair error types
#[derive(Error, Debug)]
pub enum Error {
    // Connection info errors
    #[error("Missing database connection info: {key} not found in {location}")]
    MissingConfiguration { key: String, location: String },

    // Connection errors
    #[error("{}", .reason.describe(.descriptor))]
    ConnectionFailed {
        reason: FailureReason,
        descriptor: ConnectionDescriptor,
    },

    // Database errors
    #[error("Database error: {0}")]
    Driver(#[from] DriverError),

    // Application configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),
}

impl Error {
    /// Check if this error means the connection info is not available yet
    pub fn is_missing_configuration(&self) -> bool {
        matches!(self, Error::MissingConfiguration { .. })
    }

    /// Role of the descriptor whose connection attempt failed, if any
    pub fn failed_role(&self) -> Option<Role> {
        match self {
            Error::ConnectionFailed { descriptor, .. } => Some(descriptor.role()),
            _ => None,
        }
    }

    /// Classified reason of a failed connection attempt, if any
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Error::ConnectionFailed { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
