//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `litehub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use litehub_adapter_litetouch::{LiteTouchConfig, LiteTouchError};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Integration toggles.
    pub integrations: IntegrationsConfig,
    /// LiteTouch bridge and switch list.
    pub litetouch: LiteTouchConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Per-integration toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    /// Connect to the LiteTouch bridge and register its switches.
    pub litetouch_enabled: bool,
}

impl Config {
    /// Load configuration from `litehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("litehub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("LITEHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("LITEHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("LITEHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("LITEHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("LITEHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("LITEHUB_LITETOUCH_HOST") {
            self.litetouch.host = val;
        }
        if let Some(port) = var("LITEHUB_LITETOUCH_PORT").and_then(|val| val.parse().ok()) {
            self.litetouch.port = port;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.integrations.litetouch_enabled {
            self.litetouch.validate()?;
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:litehub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "litehubd=info,litehub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            litetouch_enabled: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// The `[litetouch]` section is inconsistent.
    #[error("invalid litetouch configuration")]
    LiteTouch(#[from] LiteTouchError),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:litehub.db?mode=rwc");
        assert!(config.integrations.litetouch_enabled);
        assert_eq!(config.litetouch.bridge_addr(), "localhost:10001");
        assert!(config.litetouch.switches.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [integrations]
            litetouch_enabled = false

            [litetouch]
            host = '10.0.0.5'
            port = 10002
            keep_alive_secs = 10

            [[litetouch.switches]]
            address = '12_3'
            name = 'Porch'
            toggle = true

            [[litetouch.switches]]
            address = 'pool'
            name = 'Pool pump'
            loadid = 7
            time = true
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert!(!config.integrations.litetouch_enabled);
        assert_eq!(config.litetouch.bridge_addr(), "10.0.0.5:10002");
        assert_eq!(config.litetouch.keep_alive_secs, 10);
        assert_eq!(config.litetouch.reconnect_delay_secs, 5);
        assert_eq!(config.litetouch.switches.len(), 2);
        assert!(config.litetouch.switches[0].toggle);
        assert_eq!(config.litetouch.switches[1].load_id, 7);
        assert!(config.litetouch.switches[1].timed);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_malformed_toggle_address_when_enabled() {
        let config: Config = toml::from_str(
            "
            [[litetouch.switches]]
            address = 'porch'
            name = 'Porch'
            toggle = true
            ",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::LiteTouch(_))));
    }

    #[test]
    fn should_skip_litetouch_validation_when_disabled() {
        let mut config: Config = toml::from_str(
            "
            [integrations]
            litetouch_enabled = false

            [[litetouch.switches]]
            address = 'porch'
            name = 'Porch'
            toggle = true
            ",
        )
        .unwrap();
        config.litetouch.host = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("LITEHUB_HOST", "127.0.0.1"),
            ("LITEHUB_PORT", "8080"),
            ("LITEHUB_DATABASE_URL", "sqlite::memory:"),
            ("LITEHUB_LOG", "warn"),
            ("LITEHUB_LITETOUCH_HOST", "bridge.local"),
            ("LITEHUB_LITETOUCH_PORT", "10005"),
        ]));
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.logging.filter, "warn");
        assert_eq!(config.litetouch.bridge_addr(), "bridge.local:10005");
    }

    #[test]
    fn should_prefer_bind_over_host_and_port() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("LITEHUB_HOST", "127.0.0.1"),
            ("LITEHUB_BIND", "192.168.1.2:4000"),
        ]));
        assert_eq!(config.bind_addr(), "192.168.1.2:4000");
    }

    #[test]
    fn should_prefer_rust_log_over_litehub_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("LITEHUB_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_port_override() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("LITEHUB_PORT", "http"), ("LITEHUB_LITETOUCH_PORT", "")]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.litetouch.port, 10001);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
