//! TCP acceptor: one task per ICAP connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use icapture_storage::{FileSink, PayloadSink};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::connection::{handle_connection, ConnectionContext};
use crate::error::{Result, ServerError};

/// Listen backlog.
const BACKLOG: i32 = 128;

/// The ICAP server.
pub struct IcapServer {
    config: ServerConfig,
    addr: SocketAddr,
    context: Arc<ConnectionContext>,
    limiter: Option<Arc<Semaphore>>,
}

impl IcapServer {
    /// Creates a server writing payloads to the configured log file.
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let sink = FileSink::with_path(&config.payload_log)?;
        Self::with_sink(config, Arc::new(sink))
    }

    /// Creates a server writing payloads to a custom sink.
    pub fn with_sink(config: ServerConfig, sink: Arc<dyn PayloadSink>) -> Result<Self> {
        config.validate()?;
        let addr = config.addr()?;
        let context = Arc::new(ConnectionContext::new(&config, sink));
        let limiter = config.max_connections.map(|n| Arc::new(Semaphore::new(n)));

        Ok(Self {
            config,
            addr,
            context,
            limiter,
        })
    }

    /// Returns the configured address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds and serves until the process exits.
    pub async fn run(self) -> Result<()> {
        let listener = self.bind()?;
        info!("ICAP server listening on {}", self.addr);

        accept_loop(listener, self.context, self.limiter, std::future::pending()).await;
        Ok(())
    }

    /// Binds, then serves in the background.
    ///
    /// Binding happens before this returns, so bind failures surface here
    /// and port `0` resolves to the real port in [`ServerHandle::addr`].
    pub fn start(self) -> Result<ServerHandle> {
        let listener = self.bind()?;
        let addr = listener.local_addr()?;
        info!("ICAP server listening on {}", addr);

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let mut shutdown_rx = shutdown_tx.subscribe();

        let handle = tokio::spawn(accept_loop(listener, self.context, self.limiter, async move {
            let _ = shutdown_rx.recv().await;
            info!("ICAP server shutdown signal received");
        }));

        Ok(ServerHandle {
            shutdown_tx,
            addr,
            handle,
        })
    }

    fn bind(&self) -> Result<TcpListener> {
        let addr = self.addr;

        // SO_REUSEADDR lets a restart bind while old sockets sit in TIME_WAIT
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| ServerError::BindError(addr, e))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| ServerError::BindError(addr, e))?;
        socket
            .bind(&addr.into())
            .map_err(|e| ServerError::BindError(addr, e))?;
        socket
            .listen(BACKLOG)
            .map_err(|e| ServerError::BindError(addr, e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| ServerError::BindError(addr, e))?;

        let std_listener: std::net::TcpListener = socket.into();
        TcpListener::from_std(std_listener).map_err(|e| ServerError::BindError(addr, e))
    }
}

async fn accept_loop<F>(
    listener: TcpListener,
    context: Arc<ConnectionContext>,
    limiter: Option<Arc<Semaphore>>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        // Hold off accepting while every slot is busy
        let permit = match &limiter {
            Some(limiter) => tokio::select! {
                permit = limiter.clone().acquire_owned() => match permit {
                    Ok(permit) => Some(permit),
                    Err(_) => break,
                },
                _ = &mut shutdown => break,
            },
            None => None,
        };

        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            },
            _ = &mut shutdown => break,
        };

        let context = context.clone();
        tokio::spawn(async move {
            let _permit = permit;
            match handle_connection(stream, &context).await {
                Ok(Some(response)) => debug!("{} answered with {}", peer, response.status()),
                Ok(None) => debug!("{} closed without a complete message", peer),
                Err(e) => warn!("Connection from {} failed: {}", peer, e),
            }
        });
    }
}

/// Handle for controlling a running server.
pub struct ServerHandle {
    shutdown_tx: broadcast::Sender<()>,
    addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Returns the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signals the server to stop accepting.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Waits for the accept loop to finish.
    pub async fn wait(self) {
        let _ = self.handle.await;
    }

    /// Shuts down the server and waits for it to finish.
    pub async fn stop(self) {
        self.shutdown();
        self.wait().await;
    }
}
