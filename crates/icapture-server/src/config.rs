//! Server configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::{DEFAULT_HOST, DEFAULT_PORT};

/// Default per-connection buffer ceiling (4 MiB).
pub const DEFAULT_MAX_BUFFER_BYTES: usize = 4 * 1024 * 1024;

/// Default idle timeout between two reads, in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// Default wait for a terminal chunk once `Content-Length` is satisfied, in
/// milliseconds.
pub const DEFAULT_LAST_CHUNK_GRACE_MS: u64 = 1000;

/// Responder configuration.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to (default: 0.0.0.0).
    pub host: String,
    /// Port to bind to (default: 1344).
    pub port: u16,
    /// Audit log file.
    pub payload_log: PathBuf,
    /// Largest message a single connection may buffer.
    pub max_buffer_bytes: usize,
    /// Seconds to wait for the next read before dropping a connection.
    /// `None` waits forever.
    pub idle_timeout_secs: Option<u64>,
    /// Connections handled at once. `None` means unbounded.
    pub max_connections: Option<usize>,
    /// Milliseconds to keep reading for the terminal chunk of a POST body
    /// that is otherwise complete. When it runs out the body is extracted
    /// as received and the message is answered.
    pub last_chunk_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            payload_log: PathBuf::from(icapture_storage::DEFAULT_LOG_FILE),
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            idle_timeout_secs: Some(DEFAULT_IDLE_TIMEOUT_SECS),
            max_connections: None,
            last_chunk_grace_ms: DEFAULT_LAST_CHUNK_GRACE_MS,
        }
    }
}

impl ServerConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("failed to read {:?}: {}", path, e)))?;
        Self::from_json_str(&text)
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ServerError::Config(format!("invalid config: {}", e)))
    }

    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets host and port from a socket address.
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.host = addr.ip().to_string();
        self.port = addr.port();
        self
    }

    /// Sets the audit log path.
    pub fn with_payload_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.payload_log = path.into();
        self
    }

    /// Sets the per-connection buffer ceiling.
    pub fn with_max_buffer_bytes(mut self, limit: usize) -> Self {
        self.max_buffer_bytes = limit;
        self
    }

    /// Sets the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout_secs = timeout.map(|t| t.as_secs());
        self
    }

    /// Sets the concurrent connection ceiling.
    pub fn with_max_connections(mut self, limit: Option<usize>) -> Self {
        self.max_connections = limit;
        self
    }

    /// Sets the terminal chunk grace period.
    pub fn with_last_chunk_grace(mut self, grace: Duration) -> Self {
        self.last_chunk_grace_ms = grace.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Returns the terminal chunk grace period as a duration.
    pub fn last_chunk_grace(&self) -> Duration {
        Duration::from_millis(self.last_chunk_grace_ms)
    }

    /// Returns the idle timeout as a duration.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    /// Resolves the listen address.
    pub fn addr(&self) -> Result<SocketAddr> {
        let ip: std::net::IpAddr = self
            .host
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid host {:?}: {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Checks values that would make the server unusable.
    pub fn validate(&self) -> Result<()> {
        self.addr()?;
        if self.max_buffer_bytes == 0 {
            return Err(ServerError::Config("max_buffer_bytes must be positive".into()));
        }
        if self.max_connections == Some(0) {
            return Err(ServerError::Config("max_connections must be positive".into()));
        }
        Ok(())
    }
}
