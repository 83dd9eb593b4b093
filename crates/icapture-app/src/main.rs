//! icapture - transparent ICAP responder.
//!
//! Answers a forward proxy's ICAP requests without modifying traffic and
//! records sensitive-looking POST bodies to an audit log.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use directories::ProjectDirs;
use icapture_app::cli::{Args, Command};
use icapture_app::interfaces::{available_interfaces, render_listing, resolve_interface};
use icapture_server::{IcapServer, ServerConfig, ServerError, ServerHandle};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "icapture", "icapture").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging with file rotation.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("icapture={},warn", args.log_level())));

    if let Some(log_dir) = logs_dir() {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("icapture")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::info!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::warn!("File logging unavailable, using console only");
    None
}

/// Binds, retrying after failures until Ctrl-C.
async fn start_with_retry(config: &ServerConfig, retry_delay: Duration) -> anyhow::Result<Option<ServerHandle>> {
    loop {
        let server = IcapServer::new(config.clone()).context("failed to create server")?;

        match server.start() {
            Ok(handle) => return Ok(Some(handle)),
            Err(e @ (ServerError::BindError(..) | ServerError::Transport(_))) => {
                tracing::error!("{}; retrying in {:?}", e, retry_delay);
            }
            Err(e) => return Err(e).context("failed to start server"),
        }

        tokio::select! {
            _ = tokio::time::sleep(retry_delay) => {}
            _ = tokio::signal::ctrl_c() => return Ok(None),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.command == Some(Command::Interfaces) {
        let interfaces = available_interfaces();
        if interfaces.is_empty() {
            eprintln!("No interface is up with an IPv4 address");
        } else {
            print!("{}", render_listing(&interfaces));
        }
        return Ok(());
    }

    // Keep guard alive for the duration of the program
    let _log_guard = init_logging(&args);

    tracing::info!("Starting icapture...");
    tracing::debug!("Args: {:?}", args);

    let config = args.server_config(resolve_interface)?;
    tracing::info!(
        "Payload log: {:?}, buffer ceiling: {} bytes, idle timeout: {:?}, max connections: {:?}",
        config.payload_log,
        config.max_buffer_bytes,
        config.idle_timeout(),
        config.max_connections
    );

    let Some(handle) = start_with_retry(&config, args.retry_delay()).await? else {
        tracing::info!("Interrupted before the server started");
        return Ok(());
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    tracing::info!("Shutting down icapture on {}", handle.addr());
    handle.stop().await;
    Ok(())
}
