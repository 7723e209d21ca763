//! Listener lifecycle
//!
//! - One TCP listener per [`Server`], accepting on a tokio task
//! - Each connection served by hyper's HTTP/1 driver on its own task
//! - Explicit stop via [`ServerHandle`]; open connections finish their
//!   current exchange and close

use crate::service;
use crate::{Error, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Port the login server listens on
pub const DEFAULT_PORT: u16 = 5000;

/// Pause after a failed accept before trying again
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
    /// Runtime worker threads
    pub workers: usize,
    /// How long shutdown waits for open connections
    pub drain_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            workers: num_cpus::get(),
            drain_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.hostname, self.port)
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("{}:{}: {}", self.hostname, self.port, e)))
    }
}

/// Create a listening TCP socket
pub fn create_socket(addr: &SocketAddr) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow rebinding while old connections sit in TIME_WAIT
    socket.set_reuse_address(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;

    Ok(socket)
}

/// Tracks active connections for graceful shutdown
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicU64,
    shutting_down: AtomicBool,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn decrement(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    pub fn start_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

/// A bound listener that has not started accepting yet
pub struct Server {
    listener: TcpListener,
    tracker: Arc<ConnectionTracker>,
}

impl Server {
    /// Bind the configured address. Port 0 picks a free port.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let addr = config.socket_addr()?;
        let socket = create_socket(&addr)?;
        let listener = TcpListener::from_std(socket.into())?;

        debug!(%addr, "listener bound");

        Ok(Self {
            listener,
            tracker: Arc::new(ConnectionTracker::new()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Spawn the accept loop and hand back its controls
    pub fn start(self) -> Result<ServerHandle> {
        let local_addr = self.local_addr()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(accept_loop(self.listener, self.tracker.clone(), shutdown_rx));

        Ok(ServerHandle {
            local_addr,
            tracker: self.tracker,
            shutdown_tx,
        })
    }
}

async fn accept_loop(
    listener: TcpListener,
    tracker: Arc<ConnectionTracker>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        let stream = tokio::select! {
            biased;
            _ = stop_requested(&mut shutdown_rx) => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "connection accepted");
                    stream
                }
                Err(e) => {
                    backoff_after_accept_error(&e).await;
                    continue;
                }
            },
        };

        if tracker.is_shutting_down() {
            drop(stream);
            continue;
        }

        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "failed to set TCP_NODELAY");
        }

        let conn_tracker = tracker.clone();
        let mut conn_shutdown = shutdown_rx.clone();
        conn_tracker.increment();

        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let conn = http1::Builder::new().serve_connection(io, service_fn(service::serve));
            tokio::pin!(conn);

            // An idle keep-alive connection closes at once; a busy one after
            // its current response.
            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = stop_requested(&mut conn_shutdown) => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            };

            if let Err(e) = result {
                // Only log if not a normal connection close
                if !e.is_incomplete_message() {
                    debug!(error = %e, "connection error");
                }
            }

            conn_tracker.decrement();
        });
    }

    debug!("accept loop stopped");
}

/// Resolves once shutdown is signalled or the handle is gone
async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|&stop| stop).await;
}

/// Accept errors such as EMFILE tend to repeat immediately
async fn backoff_after_accept_error(err: &std::io::Error) {
    warn!(error = %err, "accept failed");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

/// Controls for a running server
pub struct ServerHandle {
    local_addr: SocketAddr,
    tracker: Arc<ConnectionTracker>,
    shutdown_tx: watch::Sender<bool>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn active_connections(&self) -> u64 {
        self.tracker.count()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.tracker.is_shutting_down()
    }

    /// Stop accepting and ask every open connection to close once its
    /// current exchange is done. The listener is dropped once the accept
    /// loop sees the signal.
    pub fn shutdown(&self) {
        self.tracker.start_shutdown();
        if !self.shutdown_tx.send_replace(true) {
            info!(addr = %self.local_addr, "server shutting down");
        }
    }

    /// Stop accepting, then wait for open connections to close.
    ///
    /// A zero timeout waits indefinitely. Returns true if every connection
    /// closed in time.
    pub async fn graceful_shutdown(&self, timeout: Duration) -> bool {
        self.shutdown();

        let start = Instant::now();
        loop {
            let active = self.tracker.count();
            if active == 0 {
                info!("all connections drained");
                return true;
            }

            if !timeout.is_zero() && start.elapsed() >= timeout {
                warn!(active, "drain timeout reached");
                return false;
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
