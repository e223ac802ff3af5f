//! Live MariaDB/MySQL checks.
//!
//! Run with `--features integration` and a reachable server described by
//! DBPAIR_TEST_HOST, DBPAIR_TEST_PORT, DBPAIR_TEST_USER and
//! DBPAIR_TEST_PASSWORD. The account needs CREATE privileges.

#![cfg(feature = "integration")]

use dbpair::connection::{ConnectionDescriptor, Role, VALUE_LENGTH};
use dbpair::executor::MySqlConnector;
use dbpair::{Error, FailureReason};

struct Server {
    host: String,
    user: String,
    password: String,
    connector: MySqlConnector,
}

fn server() -> Server {
    let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.to_string());
    let port = var("DBPAIR_TEST_PORT", "3306").parse().unwrap();

    Server {
        host: var("DBPAIR_TEST_HOST", "127.0.0.1"),
        user: var("DBPAIR_TEST_USER", "root"),
        password: var("DBPAIR_TEST_PASSWORD", ""),
        connector: MySqlConnector::new(port),
    }
}

impl Server {
    fn descriptor(&self, role: Role) -> ConnectionDescriptor {
        ConnectionDescriptor::new(&self.host, &self.user, &self.password, role)
    }
}

#[tokio::test]
async fn test_nonexistent_host() {
    let server = server();
    let descriptor =
        ConnectionDescriptor::new("dbpair-no-such-host.invalid", &server.user, "x", Role::Replica);

    match descriptor.connect(&server.connector).await {
        Err(Error::ConnectionFailed { reason, descriptor }) => {
            assert_eq!(reason, FailureReason::HostUnreachable);
            assert_eq!(descriptor.role(), Role::Replica);
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("connected to a nonexistent host"),
    }
}

#[tokio::test]
async fn test_wrong_password() {
    let server = server();
    let descriptor = ConnectionDescriptor::new(
        &server.host,
        &server.user,
        format!("{}-wrong", server.password),
        Role::Primary,
    );

    match descriptor.connect(&server.connector).await {
        Err(Error::ConnectionFailed { reason, .. }) => {
            assert_eq!(reason, FailureReason::AuthenticationRejected)
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("connected with a wrong password"),
    }
}

#[tokio::test]
async fn test_provision_write_and_read() {
    let server = server();
    let primary = server.descriptor(Role::Primary);

    // schema setup twice must not fail
    primary.connect(&server.connector).await.unwrap().close().await;
    primary.connect(&server.connector).await.unwrap().close().await;

    let marker = format!("dbpair-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let long = format!("{}{}", marker, "z".repeat(500));
    primary.insert_value(&server.connector, &long).await.unwrap();

    let values = server
        .descriptor(Role::Replica)
        .read_values(&server.connector)
        .await
        .unwrap();
    let stored = values.iter().find(|v| v.starts_with(&marker)).unwrap();
    assert_eq!(stored.chars().count(), VALUE_LENGTH);
}
