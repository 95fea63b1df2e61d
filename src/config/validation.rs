//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (probe attempts > 0, known log level)
//! - Validate path shapes (base path)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::ServerConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.hostname.trim().is_empty() {
        errors.push(ValidationError {
            field: "listener.hostname",
            message: "must not be empty".to_string(),
        });
    }

    if config.listener.port_probe_attempts == 0 {
        errors.push(ValidationError {
            field: "listener.port_probe_attempts",
            message: "must be at least 1".to_string(),
        });
    }

    let base_path = &config.app.base_path;
    if !base_path.is_empty() && !base_path.starts_with('/') {
        errors.push(ValidationError {
            field: "app.base_path",
            message: format!("`{base_path}` must be empty or start with `/`"),
        });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: format!("unknown level `{}`", config.observability.log_level),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.hostname = " ".to_string();
        config.listener.port_probe_attempts = 0;
        config.app.base_path = "app".to_string();
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.hostname",
                "listener.port_probe_attempts",
                "app.base_path",
                "observability.log_level",
            ]
        );
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let mut config = ServerConfig::default();
        config.observability.log_level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
