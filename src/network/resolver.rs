//! Host Resolution
//!
//! Every lookup goes to the resolver; results are never cached, so a
//! hostname that moves between requests is picked up immediately.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::net::IpAddr;

use async_trait::async_trait;
use serde::Serialize;

/// Outcome of resolving one hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Addresses {
    Resolved { addresses: BTreeSet<IpAddr> },
    Failed { error: String },
}

impl Addresses {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Addresses::Resolved { .. })
    }
}

impl fmt::Display for Addresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addresses::Resolved { addresses } => {
                let joined: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
                f.write_str(&joined.join(","))
            }
            Addresses::Failed { error } => write!(f, "Resolution error: {}", error),
        }
    }
}

/// Resolves hostnames to address sets
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, hostname: &str) -> std::io::Result<BTreeSet<IpAddr>>;

    async fn addresses(&self, hostname: &str) -> Addresses {
        match self.resolve(hostname).await {
            Ok(addresses) => Addresses::Resolved { addresses },
            Err(e) => Addresses::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Resolver backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, hostname: &str) -> std::io::Result<BTreeSet<IpAddr>> {
        let addrs = tokio::net::lookup_host((hostname, 0)).await?;
        Ok(addrs.map(|a| a.ip()).collect())
    }
}

/// Resolver answering from a fixed table
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, BTreeSet<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, hostname: impl Into<String>, addresses: &[IpAddr]) -> Self {
        self.entries
            .insert(hostname.into(), addresses.iter().copied().collect());
        self
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, hostname: &str) -> std::io::Result<BTreeSet<IpAddr>> {
        self.entries.get(hostname).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no address associated with hostname {}", hostname),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticResolver::new()
            .with_host("db", &[ip("10.0.0.2"), ip("10.0.0.1")]);

        let addresses = resolver.addresses("db").await;
        assert!(addresses.is_resolved());
        assert_eq!(addresses.to_string(), "10.0.0.1,10.0.0.2");

        let missing = resolver.addresses("other").await;
        assert!(!missing.is_resolved());
        assert!(missing.to_string().starts_with("Resolution error: "));
    }

    #[tokio::test]
    async fn test_system_resolver_ip_literal() {
        let addresses = SystemResolver.resolve("127.0.0.1").await.unwrap();
        assert_eq!(addresses.into_iter().collect::<Vec<_>>(), vec![ip("127.0.0.1")]);
    }

    #[test]
    fn test_serialize_addresses() {
        let resolved = Addresses::Resolved {
            addresses: [ip("10.0.0.1")].into_iter().collect(),
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["status"], "resolved");
        assert_eq!(json["addresses"][0], "10.0.0.1");
    }
}
