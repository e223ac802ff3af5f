//! Connection Key Sources
//!
//! Where the four connection keys come from. The default source is a
//! directory holding one file per key.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

/// A read-only source of named connection values
pub trait KeySource: Send + Sync {
    /// Whitespace-trimmed value of `key`, or `None` when absent
    fn read(&self, key: &str) -> Option<String>;

    /// Human-readable location for diagnostics
    fn location(&self) -> String;
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    path: PathBuf,
}

impl DirectorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeySource for DirectorySource {
    fn read(&self, key: &str) -> Option<String> {
        let file = self.path.join(key);
        match std::fs::read_to_string(&file) {
            Ok(content) => Some(content.trim().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Key file {:?} not found", file);
                None
            }
            Err(e) => {
                tracing::warn!("Cannot read key file {:?}: {}", file, e);
                None
            }
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory key/value source
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    entries: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl KeySource for MapSource {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.trim().to_string())
    }

    fn location(&self) -> String {
        "in-memory source".to_string()
    }
}
