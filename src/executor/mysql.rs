//! MariaDB Executor
//!
//! Opens one unpooled sqlx connection per request and issues the fixed
//! statements of the demo schema.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError};
use sqlx::{Connection, Executor};

use super::{Connector, DriverError, Session};
use crate::connection::classify::{
    CR_CONN_HOST_ERROR, CR_MALFORMED_PACKET, CR_SSL_CONNECTION_ERROR, CR_UNKNOWN_ERROR,
    CR_UNKNOWN_HOST,
};
use crate::connection::ConnectionDescriptor;

/// Connector for a real MariaDB/MySQL server
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    port: u16,
}

impl MySqlConnector {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    fn options(&self, descriptor: &ConnectionDescriptor) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(descriptor.hostname())
            .port(self.port)
            .username(descriptor.username())
            .password(descriptor.password())
    }
}

impl Default for MySqlConnector {
    fn default() -> Self {
        Self::new(3306)
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> std::result::Result<Box<dyn Session>, DriverError> {
        tracing::debug!(
            "Connecting to {}:{} as {} ({})",
            descriptor.hostname(),
            self.port,
            descriptor.username(),
            descriptor.role()
        );

        let conn = MySqlConnection::connect_with(&self.options(descriptor)).await?;
        Ok(Box::new(MySqlSession { conn }))
    }
}

/// One open MySQL connection
struct MySqlSession {
    conn: MySqlConnection,
}

// DDL and USE go through the text protocol: USE is not allowed as a
// prepared statement.
#[async_trait]
impl Session for MySqlSession {
    async fn create_database(&mut self, database: &str) -> std::result::Result<(), DriverError> {
        let sql = format!("CREATE DATABASE IF NOT EXISTS `{}`", database);
        self.conn.execute(sql.as_str()).await?;
        Ok(())
    }

    async fn use_database(&mut self, database: &str) -> std::result::Result<(), DriverError> {
        let sql = format!("USE `{}`", database);
        self.conn.execute(sql.as_str()).await?;
        Ok(())
    }

    async fn create_table(
        &mut self,
        table: &str,
        value_length: usize,
    ) -> std::result::Result<(), DriverError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS `{}` (val CHAR({}) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin)",
            table, value_length
        );
        self.conn.execute(sql.as_str()).await?;
        Ok(())
    }

    async fn select_values(&mut self, table: &str) -> std::result::Result<Vec<String>, DriverError> {
        let sql = format!("SELECT val FROM `{}`", table);
        let rows: Vec<Option<String>> = sqlx::query_scalar(&sql)
            .fetch_all(&mut self.conn)
            .await?;

        Ok(rows.into_iter().flatten().collect())
    }

    async fn insert_value(
        &mut self,
        table: &str,
        value: &str,
    ) -> std::result::Result<u64, DriverError> {
        let sql = format!("INSERT INTO `{}` (val) VALUES (?)", table);
        let result = sqlx::query(&sql)
            .bind(value)
            .execute(&mut self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(&mut self) -> std::result::Result<(), DriverError> {
        self.conn.execute("COMMIT").await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> std::result::Result<(), DriverError> {
        self.conn.close().await?;
        Ok(())
    }
}

/// Reduce a sqlx error to the MySQL error number the C client would report.
///
/// Server errors carry their own number. Transport failures before the
/// handshake become CR_UNKNOWN_HOST, except a refused connection which is
/// CR_CONN_HOST_ERROR.
pub fn driver_code(err: &sqlx::Error) -> u16 {
    match err {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(|e| e.number())
            .unwrap_or(CR_UNKNOWN_ERROR),
        sqlx::Error::Io(io) => match io.kind() {
            std::io::ErrorKind::ConnectionRefused => CR_CONN_HOST_ERROR,
            _ => CR_UNKNOWN_HOST,
        },
        sqlx::Error::Tls(_) => CR_SSL_CONNECTION_ERROR,
        sqlx::Error::Protocol(_) => CR_MALFORMED_PACKET,
        _ => CR_UNKNOWN_ERROR,
    }
}

impl From<sqlx::Error> for DriverError {
    fn from(err: sqlx::Error) -> Self {
        DriverError::new(driver_code(&err), err.to_string())
    }
}
