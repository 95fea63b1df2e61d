//! TCP listener binding with sequential port probing.
//!
//! # Responsibilities
//! - Bind to the configured host and port
//! - In development, walk forward through busy ports
//! - Surface the first bind failure when nothing could be bound

use std::io;

use tokio::net::TcpListener;

use crate::config::schema::{Mode, ServerConfig, DEFAULT_PORT_PROBE_ATTEMPTS};

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind. `address` is the first address that failed and
    /// `source` its error.
    Bind {
        address: String,
        attempts: u16,
        source: io::Error,
    },
    /// Bound, but the local address could not be read.
    LocalAddr(io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind {
                address,
                attempts,
                source,
            } => write!(
                f,
                "Failed to bind {} ({} attempt(s)): {}",
                address, attempts, source
            ),
            ListenerError::LocalAddr(e) => write!(f, "Failed to read local address: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind { source, .. } => Some(source),
            ListenerError::LocalAddr(e) => Some(e),
        }
    }
}

/// Where and how to listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenOptions {
    pub hostname: String,
    pub port: u16,
    pub mode: Mode,
    /// Ports tried in development mode, starting at `port`.
    pub port_probe_attempts: u16,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 8000,
            mode: Mode::Development,
            port_probe_attempts: DEFAULT_PORT_PROBE_ATTEMPTS,
        }
    }
}

impl ListenOptions {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            ..Self::default()
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            hostname: config.listener.hostname.clone(),
            port: config.listener.port,
            mode: config.mode,
            port_probe_attempts: config.listener.port_probe_attempts,
        }
    }

    /// Ports to try: one in production, `port_probe_attempts` in development.
    pub fn attempts(&self) -> u16 {
        match self.mode {
            Mode::Production => 1,
            Mode::Development => self.port_probe_attempts.max(1),
        }
    }
}

/// Bind according to `options`.
pub async fn bind(options: &ListenOptions) -> Result<TcpListener, ListenerError> {
    bind_with_probe(&options.hostname, options.port, options.attempts()).await
}

/// Bind `hostname:port`, moving on to the next port while the current one
/// is in use, for at most `attempts` ports.
///
/// Port 0 asks the OS for a free port and is tried once. Any failure other
/// than "address in use" stops probing. The error returned is always the
/// first one encountered.
pub async fn bind_with_probe(
    hostname: &str,
    port: u16,
    attempts: u16,
) -> Result<TcpListener, ListenerError> {
    let attempts = if port == 0 { 1 } else { attempts.max(1) };
    let mut first_error: Option<(u16, io::Error)> = None;
    let mut tried = 0;

    for offset in 0..attempts {
        let Some(candidate) = port.checked_add(offset) else {
            break;
        };
        tried += 1;

        match TcpListener::bind((hostname, candidate)).await {
            Ok(listener) => {
                let local_addr = listener.local_addr().map_err(ListenerError::LocalAddr)?;
                tracing::info!(address = %local_addr, attempt = tried, "Listener bound");
                return Ok(listener);
            }
            Err(error) => {
                let in_use = error.kind() == io::ErrorKind::AddrInUse;
                if in_use {
                    tracing::warn!(hostname, port = candidate, "Port in use, trying next");
                } else {
                    tracing::warn!(hostname, port = candidate, error = %error, "Bind failed");
                }
                first_error.get_or_insert((candidate, error));
                if !in_use {
                    break;
                }
            }
        }
    }

    let (failed_port, source) = first_error.unwrap_or_else(|| {
        (port, io::Error::new(io::ErrorKind::AddrNotAvailable, "no port to try"))
    });
    Err(ListenerError::Bind {
        address: format!("{hostname}:{failed_port}"),
        attempts: tried,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_port_zero_binds_once() {
        let listener = bind_with_probe("127.0.0.1", 0, 5).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_probes_past_busy_port() {
        let busy = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = busy.local_addr().unwrap().port();

        match bind_with_probe("127.0.0.1", port, 10).await {
            Ok(listener) => {
                let bound = listener.local_addr().unwrap().port();
                assert!(bound > port && bound < port.saturating_add(10));
            }
            // Every following port happened to be taken too.
            Err(ListenerError::Bind { source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::AddrInUse)
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_single_attempt_reports_first_error() {
        let busy = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = busy.local_addr().unwrap().port();

        let err = bind_with_probe("127.0.0.1", port, 1).await.unwrap_err();
        match err {
            ListenerError::Bind {
                attempts, source, ..
            } => {
                assert_eq!(attempts, 1);
                assert_eq!(source.kind(), io::ErrorKind::AddrInUse);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_probe_reports_first_port() {
        let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = first.local_addr().unwrap().port();
        let Some(next) = port.checked_add(1) else {
            return;
        };
        // The neighbouring port may already belong to someone else.
        let _second = TcpListener::bind(("127.0.0.1", next)).await.ok();

        let err = bind_with_probe("127.0.0.1", port, 2).await;
        let Err(ListenerError::Bind {
            address,
            attempts,
            source,
        }) = err
        else {
            // The neighbour was free to bind after all.
            return;
        };
        assert_eq!(address, format!("127.0.0.1:{port}"));
        assert_eq!(attempts, 2);
        assert_eq!(source.kind(), io::ErrorKind::AddrInUse);
    }

    #[test]
    fn test_production_never_probes() {
        let options = ListenOptions::new("127.0.0.1", 8080).mode(Mode::Production);
        assert_eq!(options.attempts(), 1);

        let options = ListenOptions::new("127.0.0.1", 8080);
        assert_eq!(options.attempts(), DEFAULT_PORT_PROBE_ATTEMPTS);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = ServerConfig::default();
        config.mode = Mode::Production;
        config.listener.port = 9100;
        let options = ListenOptions::from_config(&config);
        assert_eq!(options.port, 9100);
        assert_eq!(options.mode, Mode::Production);
        assert_eq!(options.attempts(), 1);
    }
}
