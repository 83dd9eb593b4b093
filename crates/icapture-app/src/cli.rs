//! Command-line arguments.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use icapture_server::ServerConfig;

/// icapture - transparent ICAP responder that records credential-bearing POST bodies
#[derive(Parser, Debug)]
#[command(name = "icapture", version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// JSON configuration file; explicit flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, value_name = "IP", conflicts_with = "interface")]
    pub bind: Option<IpAddr>,

    /// Listen on the first IPv4 address of this interface
    #[arg(long, value_name = "NAME")]
    pub interface: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Payload audit log path
    #[arg(long, value_name = "FILE")]
    pub payload_log: Option<PathBuf>,

    /// Per-connection buffer ceiling in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_buffer_bytes: Option<usize>,

    /// Seconds a connection may stay silent (0 disables the timeout)
    #[arg(long, value_name = "SECS")]
    pub idle_timeout_secs: Option<u64>,

    /// Milliseconds to wait for a body's terminating chunk before answering
    #[arg(long, value_name = "MS")]
    pub last_chunk_grace_ms: Option<u64>,

    /// Maximum number of connections handled at once
    #[arg(long, value_name = "N")]
    pub max_connections: Option<usize>,

    /// Seconds to wait before retrying a failed bind
    #[arg(long, value_name = "SECS", default_value_t = 1)]
    pub retry_delay_secs: u64,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List interfaces usable with --interface
    Interfaces,
}

impl Args {
    /// Effective log level.
    pub fn log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }

    /// Delay between bind attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Builds the server configuration: file (or defaults), then flags.
    ///
    /// `resolve` maps an interface name to its bind address.
    pub fn server_config<F>(&self, resolve: F) -> anyhow::Result<ServerConfig>
    where
        F: Fn(&str) -> Option<Ipv4Addr>,
    {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(name) = &self.interface {
            let Some(ip) = resolve(name) else {
                bail!("interface {:?} is not up or has no IPv4 address", name);
            };
            config = config.with_host(ip.to_string());
        }
        if let Some(ip) = self.bind {
            config = config.with_host(ip.to_string());
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(path) = &self.payload_log {
            config = config.with_payload_log(path);
        }
        if let Some(limit) = self.max_buffer_bytes {
            config = config.with_max_buffer_bytes(limit);
        }
        if let Some(secs) = self.idle_timeout_secs {
            let timeout = (secs > 0).then(|| Duration::from_secs(secs));
            config = config.with_idle_timeout(timeout);
        }
        if let Some(ms) = self.last_chunk_grace_ms {
            config = config.with_last_chunk_grace(Duration::from_millis(ms));
        }
        if let Some(limit) = self.max_connections {
            config = config.with_max_connections(Some(limit));
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}
