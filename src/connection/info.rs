//! Connection Info
//!
//! Resolves the four connection keys into a credentials pair plus primary
//! and replica hostnames. Partial configuration is never a valid state.

use std::fmt;

use serde::Serialize;

use super::descriptor::{ConnectionDescriptor, Role};
use super::source::KeySource;
use crate::error::{Error, Result};
use crate::network::{Addresses, HostResolver};

pub const USERNAME_KEY: &str = "mysql-username";
pub const PASSWORD_KEY: &str = "mysql-password";
pub const PRIMARY_HOST_KEY: &str = "mysql-master";
pub const REPLICA_HOST_KEY: &str = "mysql-slave";

/// Username and password shared by both roles
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolved primary/replica connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    credentials: Credentials,
    primary_host: String,
    replica_host: String,
}

/// Address sets of both hosts and whether they differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicationStatus {
    pub primary: Addresses,
    pub replica: Addresses,
    pub replicating: bool,
}

impl ConnectionInfo {
    pub fn new(
        credentials: Credentials,
        primary_host: impl Into<String>,
        replica_host: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            primary_host: primary_host.into(),
            replica_host: replica_host.into(),
        }
    }

    /// Read all four keys; any absent key fails the whole load
    pub fn load(source: &dyn KeySource) -> Result<Self> {
        let read = |key: &str| {
            source.read(key).ok_or_else(|| Error::MissingConfiguration {
                key: key.to_string(),
                location: source.location(),
            })
        };

        let username = read(USERNAME_KEY)?;
        let password = read(PASSWORD_KEY)?;
        let primary_host = read(PRIMARY_HOST_KEY)?;
        let replica_host = read(REPLICA_HOST_KEY)?;

        Ok(Self::new(
            Credentials { username, password },
            primary_host,
            replica_host,
        ))
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn password(&self) -> &str {
        &self.credentials.password
    }

    pub fn primary_host(&self) -> &str {
        &self.primary_host
    }

    pub fn replica_host(&self) -> &str {
        &self.replica_host
    }

    /// Descriptor for `role`, built fresh on each call
    pub fn descriptor(&self, role: Role) -> ConnectionDescriptor {
        let hostname = match role {
            Role::Primary => &self.primary_host,
            Role::Replica => &self.replica_host,
        };
        ConnectionDescriptor::new(
            hostname.as_str(),
            self.credentials.username.as_str(),
            self.credentials.password.as_str(),
            role,
        )
    }

    pub fn primary(&self) -> ConnectionDescriptor {
        self.descriptor(Role::Primary)
    }

    pub fn replica(&self) -> ConnectionDescriptor {
        self.descriptor(Role::Replica)
    }

    /// Resolve both hostnames and compare the outcomes.
    ///
    /// This only tells "different host" from "same host"; it does not check
    /// that the replica actually follows the primary.
    pub async fn replication_status(&self, resolver: &dyn HostResolver) -> ReplicationStatus {
        let primary = self.primary().addresses(resolver).await;
        let replica = self.replica().addresses(resolver).await;
        let replicating = primary != replica;

        tracing::debug!(
            "Replication check: primary={} replica={} replicating={}",
            primary,
            replica,
            replicating
        );

        ReplicationStatus {
            primary,
            replica,
            replicating,
        }
    }

    /// True when primary and replica resolve to different address sets
    pub async fn is_replicating(&self, resolver: &dyn HostResolver) -> bool {
        self.replication_status(resolver).await.replicating
    }
}
