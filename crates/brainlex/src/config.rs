//! TOML configuration parsing and validation.
//!
//! Database credentials are deliberately absent: they are supplied at
//! runtime through `POST /api/connect`. The file only tunes the server,
//! the pool that backs the active connection, and search limits.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8000"
//! log_level = "info"
//!
//! [db]
//! max_connections = 5
//! connect_timeout_secs = 10
//! query_timeout_secs = 15
//!
//! [search]
//! limit = 20
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_query_timeout_secs() -> u64 {
    15
}

impl DbConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
        }
    }
}

fn default_search_limit() -> i64 {
    20
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            server: ServerConfig::default(),
            db: DbConfig::default(),
            search: SearchConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }
        if self.db.max_connections == 0 {
            anyhow::bail!("db.max_connections must be >= 1");
        }
        if self.db.connect_timeout_secs == 0 {
            anyhow::bail!("db.connect_timeout_secs must be >= 1");
        }
        if self.db.query_timeout_secs == 0 {
            anyhow::bail!("db.query_timeout_secs must be >= 1");
        }
        if self.search.limit < 1 {
            anyhow::bail!("search.limit must be >= 1");
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Loads `path` if it exists, otherwise returns [`Config::minimal`].
/// A file that exists but fails validation is still an error.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:8000");
        assert_eq!(cfg.search.limit, 20);
        assert_eq!(cfg.db.query_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_sections() {
        let cfg = parse_config(
            r#"
[server]
bind = "0.0.0.0:9000"

[db]
query_timeout_secs = 3
"#,
        )
        .unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
        assert_eq!(cfg.server.log_level, "info");
        assert_eq!(cfg.db.query_timeout_secs, 3);
        assert_eq!(cfg.db.max_connections, 5);
    }

    #[test]
    fn test_rejects_zero_limit() {
        let err = parse_config("[search]\nlimit = 0\n").unwrap_err();
        assert!(err.to_string().contains("search.limit"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(parse_config("[db]\nquery_timeout_secs = 0\n").is_err());
        assert!(parse_config("[db]\nconnect_timeout_secs = 0\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cfg = load_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.db.max_connections, 5);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "[server\nbind=").unwrap();
        assert!(load_or_default(&path).is_err());
    }
}
