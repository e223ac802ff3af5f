//! Connection Descriptors
//!
//! A descriptor names one role's endpoint. Connecting is a separate step
//! performed fresh for every operation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::classify::{is_not_provisioned, FailureReason};
use crate::error::{Error, Result};
use crate::executor::{Connector, DriverError, Session};
use crate::network::{Addresses, HostResolver};

/// Database holding the demo table
pub const DATABASE_NAME: &str = "ScalrTest";

/// Table holding submitted values
pub const TABLE_NAME: &str = "ScalrValues";

/// Maximum stored length of a value, in characters
pub const VALUE_LENGTH: usize = 200;

/// Which side of the pair a descriptor points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Writable host; provisions schema and receives inserts
    Primary,
    /// Read-only host serving reads
    Replica,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Replica => "replica",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to reach one role's database endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    hostname: String,
    username: String,
    password: String,
    role: Role,
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl ConnectionDescriptor {
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            role,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Resolve the hostname now. Never cached.
    pub async fn addresses(&self, resolver: &dyn HostResolver) -> Addresses {
        resolver.addresses(&self.hostname).await
    }

    /// Open a connection and prepare the schema for this role.
    ///
    /// A primary creates the database and table if they are absent; a
    /// replica only selects the database. Any failure, whether opening the
    /// connection or running a schema statement, yields
    /// `Error::ConnectionFailed` tagged with this descriptor.
    pub async fn connect(&self, connector: &dyn Connector) -> Result<QueryHandle> {
        let mut session = connector
            .open(self)
            .await
            .map_err(|err| self.connection_failed(err))?;

        if let Err(err) = self.prepare(session.as_mut()).await {
            if let Err(e) = session.close().await {
                tracing::debug!("Error closing {} connection: {}", self.role, e);
            }
            return Err(self.connection_failed(err));
        }

        Ok(QueryHandle {
            session,
            role: self.role,
        })
    }

    async fn prepare(&self, session: &mut dyn Session) -> std::result::Result<(), DriverError> {
        match self.role {
            Role::Primary => {
                session.create_database(DATABASE_NAME).await?;
                session.use_database(DATABASE_NAME).await?;
                session.create_table(TABLE_NAME, VALUE_LENGTH).await
            }
            Role::Replica => session.use_database(DATABASE_NAME).await,
        }
    }

    fn connection_failed(&self, err: DriverError) -> Error {
        let reason = FailureReason::classify(err.code);
        if is_not_provisioned(err.code) {
            tracing::debug!("{} {} not provisioned: {}", self.role, self.hostname, err);
        } else {
            tracing::warn!(
                "Connection to {} {} failed ({}): {}",
                self.role,
                self.hostname,
                reason.as_str(),
                err
            );
        }
        Error::ConnectionFailed {
            reason,
            descriptor: self.clone(),
        }
    }

    /// All stored values in retrieval order.
    ///
    /// A database or table that does not exist yet reads as empty.
    pub async fn read_values(&self, connector: &dyn Connector) -> Result<Vec<String>> {
        let mut handle = match self.connect(connector).await {
            Ok(handle) => handle,
            Err(Error::ConnectionFailed {
                reason: FailureReason::Unknown(code),
                ..
            }) if is_not_provisioned(code) => {
                tracing::debug!("{} {} has no database yet (code {})", self.role, self.hostname, code);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let values = match handle.values().await {
            Ok(values) => values,
            Err(Error::Driver(err)) if is_not_provisioned(err.code) => {
                tracing::debug!("{} {} has no value table yet: {}", self.role, self.hostname, err);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        handle.close().await;
        Ok(values)
    }

    /// Store one value, truncated to `VALUE_LENGTH`, and commit.
    ///
    /// Precondition: this is the primary descriptor.
    pub async fn insert_value(&self, connector: &dyn Connector, value: &str) -> Result<()> {
        let mut handle = self.connect(connector).await?;
        handle.insert(value).await?;
        handle.close().await;
        Ok(())
    }
}

/// An open, schema-ready connection for one role
pub struct QueryHandle {
    session: Box<dyn Session>,
    role: Role,
}

impl QueryHandle {
    /// `SELECT val FROM ScalrValues`
    pub async fn values(&mut self) -> Result<Vec<String>> {
        Ok(self.session.select_values(TABLE_NAME).await?)
    }

    /// Insert a value truncated to `VALUE_LENGTH` characters, then commit
    pub async fn insert(&mut self, value: &str) -> Result<()> {
        let value = truncate_value(value);
        self.session.insert_value(TABLE_NAME, value).await?;
        self.session.commit().await?;
        tracing::info!("Inserted {} characters into {}", value.chars().count(), TABLE_NAME);
        Ok(())
    }

    /// Close the connection; a failed close is only logged
    pub async fn close(self) {
        if let Err(e) = self.session.close().await {
            tracing::debug!("Error closing {} connection: {}", self.role, e);
        }
    }
}

/// The first `VALUE_LENGTH` characters of `value`
pub fn truncate_value(value: &str) -> &str {
    match value.char_indices().nth(VALUE_LENGTH) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::classify::{
        CR_CONN_HOST_ERROR, ER_BAD_DB_ERROR, ER_DBACCESS_DENIED_ERROR, ER_NO_SUCH_TABLE,
    };
    use crate::executor::MemoryConnector;

    fn primary(hostname: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::new(hostname, "scalr", "pw", Role::Primary)
    }

    fn replica(hostname: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::new(hostname, "scalr", "pw", Role::Replica)
    }

    fn failure(result: Result<QueryHandle>) -> (FailureReason, ConnectionDescriptor) {
        match result {
            Err(Error::ConnectionFailed { reason, descriptor }) => (reason, descriptor),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("connection unexpectedly succeeded"),
        }
    }

    #[test]
    fn test_truncate_value() {
        let long = "x".repeat(500);
        assert_eq!(truncate_value(&long).len(), VALUE_LENGTH);
        assert_eq!(truncate_value("short"), "short");

        let exact = "y".repeat(VALUE_LENGTH);
        assert_eq!(truncate_value(&exact), exact);

        // multi-byte characters count once each
        let accents = "é".repeat(300);
        assert_eq!(truncate_value(&accents).chars().count(), VALUE_LENGTH);
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", primary("db"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("\"pw\""));
    }

    #[tokio::test]
    async fn test_connect_nonexistent_host() {
        let connector = MemoryConnector::new();
        let (reason, descriptor) = failure(replica("nowhere.invalid").connect(&connector).await);
        assert_eq!(reason, FailureReason::HostUnreachable);
        assert_eq!(descriptor.role(), Role::Replica);
        assert_eq!(descriptor.hostname(), "nowhere.invalid");
    }

    #[tokio::test]
    async fn test_connect_wrong_password() {
        let connector = MemoryConnector::new().with_server("db", "scalr", "other");
        let (reason, descriptor) = failure(primary("db").connect(&connector).await);
        assert_eq!(reason, FailureReason::AuthenticationRejected);
        assert_eq!(descriptor.role(), Role::Primary);
    }

    #[tokio::test]
    async fn test_connect_unknown_code() {
        let connector = MemoryConnector::new().with_failing("db", CR_CONN_HOST_ERROR);
        let (reason, _) = failure(primary("db").connect(&connector).await);
        assert_eq!(reason, FailureReason::Unknown(CR_CONN_HOST_ERROR));
    }

    #[tokio::test]
    async fn test_primary_provisions_schema_idempotently() {
        let connector = MemoryConnector::new().with_server("db", "scalr", "pw");

        primary("db").connect(&connector).await.unwrap().close().await;
        primary("db").connect(&connector).await.unwrap().close().await;

        assert_eq!(
            connector.tables("db", DATABASE_NAME).await,
            vec![TABLE_NAME.to_string()]
        );
    }

    #[tokio::test]
    async fn test_replica_creates_nothing() {
        let connector = MemoryConnector::new().with_server("db", "scalr", "pw");

        let (reason, descriptor) = failure(replica("db").connect(&connector).await);
        assert_eq!(reason, FailureReason::Unknown(ER_BAD_DB_ERROR));
        assert_eq!(descriptor.role(), Role::Replica);
        assert!(!connector.has_database("db", DATABASE_NAME).await);
    }

    #[tokio::test]
    async fn test_read_before_provisioning_is_empty() {
        let connector = MemoryConnector::new().with_server("db", "scalr", "pw");

        assert!(replica("db").read_values(&connector).await.unwrap().is_empty());
        assert!(primary("db").read_values(&connector).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_with_database_but_no_table_is_empty() {
        let connector = MemoryConnector::new().with_server("db", "scalr", "pw");
        let mut session = connector.open(&primary("db")).await.unwrap();
        session.create_database(DATABASE_NAME).await.unwrap();

        let mut handle = replica("db").connect(&connector).await.unwrap();
        match handle.values().await {
            Err(Error::Driver(err)) => assert_eq!(err.code, ER_NO_SUCH_TABLE),
            other => panic!("expected missing table, got {:?}", other.map(|v| v.len())),
        }

        assert!(replica("db").read_values(&connector).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_then_read_from_replica() {
        let connector = MemoryConnector::new()
            .with_server("primary", "scalr", "pw")
            .with_mirror("replica", "primary");

        primary("primary").insert_value(&connector, "first").await.unwrap();
        primary("primary").insert_value(&connector, "second").await.unwrap();
        primary("primary").insert_value(&connector, "first").await.unwrap();

        let values = replica("replica").read_values(&connector).await.unwrap();
        assert_eq!(values, vec!["first", "second", "first"]);
    }

    #[tokio::test]
    async fn test_insert_truncates() {
        let connector = MemoryConnector::new().with_server("db", "scalr", "pw");
        let value: String = ('a'..='z').cycle().take(500).collect();

        primary("db").insert_value(&connector, &value).await.unwrap();

        let rows = connector.rows("db", DATABASE_NAME, TABLE_NAME).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], value[..VALUE_LENGTH]);
    }

    #[tokio::test]
    async fn test_insert_connection_failure_names_primary() {
        let connector = MemoryConnector::new();
        let err = primary("gone").insert_value(&connector, "v").await.unwrap_err();
        assert_eq!(err.failed_role(), Some(Role::Primary));
        assert_eq!(err.failure_reason(), Some(FailureReason::HostUnreachable));
    }

    #[tokio::test]
    async fn test_schema_denied_keeps_role() {
        let connector = MemoryConnector::new().with_restricted_server("db", "scalr", "pw");

        let (reason, descriptor) = failure(primary("db").connect(&connector).await);
        assert_eq!(reason, FailureReason::Unknown(ER_DBACCESS_DENIED_ERROR));
        assert_eq!(descriptor.role(), Role::Primary);

        let err = primary("db").insert_value(&connector, "v").await.unwrap_err();
        assert_eq!(err.failed_role(), Some(Role::Primary));
        assert_eq!(err.to_string(), "An error occurred: Code 1044");
        assert!(!connector.has_database("db", DATABASE_NAME).await);
    }

    #[tokio::test]
    async fn test_read_propagates_other_failures() {
        let connector = MemoryConnector::new().with_failing("replica", ER_DBACCESS_DENIED_ERROR);

        let err = replica("replica").read_values(&connector).await.unwrap_err();
        assert_eq!(err.failed_role(), Some(Role::Replica));
        assert_eq!(
            err.failure_reason(),
            Some(FailureReason::Unknown(ER_DBACCESS_DENIED_ERROR))
        );
    }
}
