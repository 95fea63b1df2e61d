//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default number of sequential ports tried in development mode.
pub const DEFAULT_PORT_PROBE_ATTEMPTS: u16 = 10;

/// Default bound on memoized route results.
pub const DEFAULT_ROUTE_CACHE_CAPACITY: usize = 1024;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Serving mode; changes how `listen` binds.
    pub mode: Mode,

    /// Listener configuration (host, port, probing).
    pub listener: ListenerConfig,

    /// Application settings.
    pub app: AppConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// How the server is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Probe for a free port when the configured one is taken.
    #[default]
    Development,
    /// Bind the configured port or fail.
    Production,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Hostname or IP to bind.
    pub hostname: String,

    /// First port to try. 0 lets the OS choose.
    pub port: u16,

    /// Ports tried in development mode, starting at `port`.
    pub port_probe_attempts: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 8000,
            port_probe_attempts: DEFAULT_PORT_PROBE_ATTEMPTS,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Prefix prepended to every route (e.g., "/app").
    pub base_path: String,

    /// Maximum memoized route results. 0 disables the cache.
    pub route_cache_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            route_cache_capacity: DEFAULT_ROUTE_CACHE_CAPACITY,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.listener.port, 8000);
        assert_eq!(config.listener.port_probe_attempts, DEFAULT_PORT_PROBE_ATTEMPTS);
        assert_eq!(config.app.route_cache_capacity, DEFAULT_ROUTE_CACHE_CAPACITY);
        assert!(config.app.base_path.is_empty());
    }

    #[test]
    fn test_partial_sections() {
        let config: ServerConfig = toml::from_str(
            r#"
            mode = "production"

            [listener]
            port = 9000

            [app]
            base_path = "/app"
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.listener.hostname, "127.0.0.1");
        assert_eq!(config.app.base_path, "/app");
        assert_eq!(config.observability.log_level, "info");
    }
}
