//! In-process executor
//!
//! Emulates just enough of a MariaDB server for the demo schema: named
//! hosts with one account each, databases, fixed-width tables and the error
//! numbers a real server reports. Hosts can share storage to model a
//! replica that sees the primary's writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Connector, DriverError, Session};
use crate::connection::classify::{
    CR_UNKNOWN_HOST, ER_ACCESS_DENIED_ERROR, ER_BAD_DB_ERROR, ER_DBACCESS_DENIED_ERROR,
    ER_NO_SUCH_TABLE,
};
use crate::connection::ConnectionDescriptor;

/// Server: no database selected (ER_NO_DB_ERROR)
const ER_NO_DB_ERROR: u16 = 1046;

/// Server: value too long for column (ER_DATA_TOO_LONG)
const ER_DATA_TOO_LONG: u16 = 1406;

#[derive(Debug, Default)]
struct Storage {
    databases: BTreeMap<String, BTreeMap<String, Table>>,
}

#[derive(Debug)]
struct Table {
    value_length: usize,
    rows: Vec<String>,
}

#[derive(Debug, Clone)]
enum Host {
    Server {
        username: String,
        password: String,
        can_create: bool,
        storage: Arc<Mutex<Storage>>,
    },
    /// Refuses every connection with a fixed code
    Failing(u16),
}

/// In-memory connector keyed by hostname
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    hosts: HashMap<String, Host>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty server accepting a single account
    pub fn with_server(
        self,
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.add_server(hostname.into(), username.into(), password.into(), true)
    }

    /// Add an empty server whose only account lacks the CREATE privilege
    pub fn with_restricted_server(
        self,
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.add_server(hostname.into(), username.into(), password.into(), false)
    }

    fn add_server(
        mut self,
        hostname: String,
        username: String,
        password: String,
        can_create: bool,
    ) -> Self {
        self.hosts.insert(
            hostname,
            Host::Server {
                username,
                password,
                can_create,
                storage: Arc::new(Mutex::new(Storage::default())),
            },
        );
        self
    }

    /// Add a host that serves the same storage and account as `source`
    pub fn with_mirror(mut self, hostname: impl Into<String>, source: &str) -> Self {
        if let Some(host) = self.hosts.get(source).cloned() {
            self.hosts.insert(hostname.into(), host);
        }
        self
    }

    /// Add a host whose connection attempts always fail with `code`
    pub fn with_failing(mut self, hostname: impl Into<String>, code: u16) -> Self {
        self.hosts.insert(hostname.into(), Host::Failing(code));
        self
    }

    /// Tables present in `database` on `hostname`
    pub async fn tables(&self, hostname: &str, database: &str) -> Vec<String> {
        match self.hosts.get(hostname) {
            Some(Host::Server { storage, .. }) => storage
                .lock()
                .await
                .databases
                .get(database)
                .map(|tables| tables.keys().cloned().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Whether `database` exists on `hostname`
    pub async fn has_database(&self, hostname: &str, database: &str) -> bool {
        match self.hosts.get(hostname) {
            Some(Host::Server { storage, .. }) => {
                storage.lock().await.databases.contains_key(database)
            }
            _ => false,
        }
    }

    /// Rows stored in `database`.`table` on `hostname`
    pub async fn rows(&self, hostname: &str, database: &str, table: &str) -> Vec<String> {
        match self.hosts.get(hostname) {
            Some(Host::Server { storage, .. }) => storage
                .lock()
                .await
                .databases
                .get(database)
                .and_then(|tables| tables.get(table))
                .map(|t| t.rows.clone())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> std::result::Result<Box<dyn Session>, DriverError> {
        match self.hosts.get(descriptor.hostname()) {
            None => Err(DriverError::new(
                CR_UNKNOWN_HOST,
                format!("Unknown MySQL server host '{}'", descriptor.hostname()),
            )),
            Some(Host::Failing(code)) => Err(DriverError::new(
                *code,
                format!("Can't connect to MySQL server on '{}'", descriptor.hostname()),
            )),
            Some(Host::Server {
                username,
                password,
                can_create,
                storage,
            }) => {
                if username != descriptor.username() || password != descriptor.password() {
                    return Err(DriverError::new(
                        ER_ACCESS_DENIED_ERROR,
                        format!(
                            "Access denied for user '{}'@'{}'",
                            descriptor.username(),
                            descriptor.hostname()
                        ),
                    ));
                }

                Ok(Box::new(MemorySession {
                    storage: Arc::clone(storage),
                    username: username.clone(),
                    can_create: *can_create,
                    database: None,
                }))
            }
        }
    }
}

struct MemorySession {
    storage: Arc<Mutex<Storage>>,
    username: String,
    can_create: bool,
    database: Option<String>,
}

impl MemorySession {
    fn check_create(&self, database: &str) -> std::result::Result<(), DriverError> {
        if self.can_create {
            return Ok(());
        }
        Err(DriverError::new(
            ER_DBACCESS_DENIED_ERROR,
            format!(
                "Access denied for user '{}'@'%' to database '{}'",
                self.username, database
            ),
        ))
    }

    fn selected(&self) -> std::result::Result<&str, DriverError> {
        self.database
            .as_deref()
            .ok_or_else(|| DriverError::new(ER_NO_DB_ERROR, "No database selected"))
    }
}

fn unknown_database(database: &str) -> DriverError {
    DriverError::new(ER_BAD_DB_ERROR, format!("Unknown database '{}'", database))
}

fn no_such_table(database: &str, table: &str) -> DriverError {
    DriverError::new(
        ER_NO_SUCH_TABLE,
        format!("Table '{}.{}' doesn't exist", database, table),
    )
}

#[async_trait]
impl Session for MemorySession {
    async fn create_database(&mut self, database: &str) -> std::result::Result<(), DriverError> {
        self.check_create(database)?;
        self.storage
            .lock()
            .await
            .databases
            .entry(database.to_string())
            .or_default();
        Ok(())
    }

    async fn use_database(&mut self, database: &str) -> std::result::Result<(), DriverError> {
        if !self.storage.lock().await.databases.contains_key(database) {
            return Err(unknown_database(database));
        }
        self.database = Some(database.to_string());
        Ok(())
    }

    async fn create_table(
        &mut self,
        table: &str,
        value_length: usize,
    ) -> std::result::Result<(), DriverError> {
        let database = self.selected()?.to_string();
        self.check_create(&database)?;
        let mut storage = self.storage.lock().await;
        let tables = storage
            .databases
            .get_mut(&database)
            .ok_or_else(|| unknown_database(&database))?;

        tables.entry(table.to_string()).or_insert_with(|| Table {
            value_length,
            rows: Vec::new(),
        });
        Ok(())
    }

    async fn select_values(&mut self, table: &str) -> std::result::Result<Vec<String>, DriverError> {
        let database = self.selected()?;
        let storage = self.storage.lock().await;
        let tables = storage
            .databases
            .get(database)
            .ok_or_else(|| unknown_database(database))?;

        tables
            .get(table)
            .map(|t| t.rows.clone())
            .ok_or_else(|| no_such_table(database, table))
    }

    async fn insert_value(
        &mut self,
        table: &str,
        value: &str,
    ) -> std::result::Result<u64, DriverError> {
        let database = self.selected()?.to_string();
        let mut storage = self.storage.lock().await;
        let target = storage
            .databases
            .get_mut(&database)
            .ok_or_else(|| unknown_database(&database))?
            .get_mut(table)
            .ok_or_else(|| no_such_table(&database, table))?;

        if value.chars().count() > target.value_length {
            return Err(DriverError::new(
                ER_DATA_TOO_LONG,
                "Data too long for column 'val' at row 1",
            ));
        }

        target.rows.push(value.to_string());
        Ok(1)
    }

    async fn commit(&mut self) -> std::result::Result<(), DriverError> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> std::result::Result<(), DriverError> {
        Ok(())
    }
}
