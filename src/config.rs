//! dbpair Configuration
//!
//! Application settings loaded from TOML. The database credentials and
//! hostnames are not part of this file; they are read from the key source
//! named in `[source]` on every request.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main dbpair configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbPairConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Where the connection keys are read from
    #[serde(default)]
    pub source: SourceConfig,

    /// Database client configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Connection key source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding mysql-username, mysql-password, mysql-master and mysql-slave
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
}

/// Database client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// MariaDB port, used for both primary and replica
    #[serde(default = "default_db_port")]
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_source_path() -> PathBuf {
    PathBuf::from("/var/config")
}

fn default_db_port() -> u16 {
    3306
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            port: default_db_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl DbPairConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a file, falling back to defaults if it does not exist
    pub fn load_or_default(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No configuration file at {:?}, using defaults", path);
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: DbPairConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.bind_address.is_empty() {
            return Err(crate::Error::Config("server.bind_address cannot be empty".into()));
        }

        if self.source.path.as_os_str().is_empty() {
            return Err(crate::Error::Config("source.path cannot be empty".into()));
        }

        if self.database.port == 0 {
            return Err(crate::Error::Config("database.port cannot be 0".into()));
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(crate::Error::Config(format!(
                "logging.format must be pretty or json, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
bind_address = "127.0.0.1:8080"

[source]
path = "/etc/dbpair/keys"

[database]
port = 3307

[logging]
level = "debug"
format = "json"
"#;

        let config = DbPairConfig::from_str(toml).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.source.path, PathBuf::from("/etc/dbpair/keys"));
        assert_eq!(config.database.port, 3307);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DbPairConfig::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:5000");
        assert_eq!(config.source.path, PathBuf::from("/var/config"));
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(DbPairConfig::from_str("[database]\nport = 0\n").is_err());
        assert!(DbPairConfig::from_str("[server]\nbind_address = \"\"\n").is_err());
        assert!(DbPairConfig::from_str("[logging]\nformat = \"xml\"\n").is_err());
        assert!(DbPairConfig::from_str("[database]\nport = \"x\"\n").is_err());
    }

    #[test]
    fn test_round_trip_default() {
        let rendered = DbPairConfig::default().to_toml().unwrap();
        let parsed = DbPairConfig::from_str(&rendered).unwrap();
        assert_eq!(parsed.server.bind_address, "0.0.0.0:5000");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbPairConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.database.port, 3306);
    }
}
