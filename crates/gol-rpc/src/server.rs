//! Blocking TCP server: one thread per connection, one frame per call.
//!
//! The accept loop polls a non-blocking listener so it can observe the
//! shutdown flag between connections. Each connection is served
//! sequentially: read a request frame, hand it to the [`Service`], write
//! the response frame.

use std::io::{self, BufReader, BufWriter};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::codec::{read_frame, write_frame};
use crate::error::{ErrorCode, RpcError};
use crate::message::{Request, Response};

/// Interval between accept polls.
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Handles decoded requests for a [`Server`].
pub trait Service: Send + Sync + 'static {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Answer one request. `shutdown` lets the service stop its server.
    fn handle(&self, request: Request, shutdown: &ShutdownHandle) -> Response;
}

/// Shared stop flag of a [`Server`].
#[derive(Clone, Debug, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Stop accepting connections now.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Stop accepting connections after `grace`, without blocking the
    /// caller. Responses already being written are not cut short.
    pub fn schedule_after(&self, grace: Duration) {
        let handle = self.clone();
        let spawned = thread::Builder::new()
            .name("gol-rpc-terminate".into())
            .spawn(move || {
                thread::sleep(grace);
                handle.shutdown();
            });
        if let Err(e) = spawned {
            warn!(error = %e, "could not schedule shutdown; stopping now");
            self.shutdown();
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A bound listener serving one [`Service`].
pub struct Server {
    listener: TcpListener,
    service: Arc<dyn Service>,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind `addr`. Use port `0` to pick a free port.
    pub fn bind(addr: impl ToSocketAddrs, service: Arc<dyn Service>) -> Result<Self, RpcError> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            service,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// The bound address.
    pub fn local_addr(&self) -> Result<SocketAddr, RpcError> {
        Ok(self.listener.local_addr()?)
    }

    /// A handle that stops this server.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accept and serve connections until shut down.
    pub fn serve(self) -> Result<(), RpcError> {
        let addr = self.local_addr()?;
        info!(service = self.service.name(), %addr, "listening");
        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }
        info!(service = self.service.name(), %addr, "server stopped");
        Ok(())
    }

    /// Run [`serve`](Self::serve) on a background thread.
    pub fn spawn(self) -> Result<RunningServer, RpcError> {
        let addr = self.local_addr()?;
        let shutdown = self.shutdown_handle();
        let thread = thread::Builder::new()
            .name(format!("gol-rpc-{}", self.service.name()))
            .spawn(move || self.serve())?;
        Ok(RunningServer {
            addr,
            shutdown,
            thread: Some(thread),
        })
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        debug!(service = self.service.name(), %peer, "connection accepted");
        let service = Arc::clone(&self.service);
        let shutdown = self.shutdown.clone();
        let spawned = thread::Builder::new()
            .name(format!("gol-rpc-conn-{peer}"))
            .spawn(move || {
                if let Err(e) = serve_connection(stream, service.as_ref(), &shutdown) {
                    warn!(%peer, error = %e, "connection closed with error");
                } else {
                    debug!(%peer, "connection closed");
                }
            });
        if let Err(e) = spawned {
            warn!(%peer, error = %e, "could not spawn connection thread");
        }
    }
}

fn serve_connection(
    stream: TcpStream,
    service: &dyn Service,
    shutdown: &ShutdownHandle,
) -> Result<(), RpcError> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);
    loop {
        let payload = match read_frame(&mut reader) {
            Ok(p) => p,
            Err(RpcError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        };
        let response = match Request::decode(&payload) {
            Ok(request) => {
                debug!(service = service.name(), request = request.kind(), "request");
                service.handle(request, shutdown)
            }
            Err(e) => {
                warn!(service = service.name(), error = %e, "undecodable request");
                Response::error(ErrorCode::InvalidRequest, e.to_string())
            }
        };
        write_frame(&mut writer, &response.encode()?)?;
    }
}

/// A [`Server`] running on a background thread.
///
/// Dropping it shuts the server down and joins the accept loop.
pub struct RunningServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<Result<(), RpcError>>>,
}

impl RunningServer {
    /// The bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The server's stop flag.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Wait for the accept loop to exit (after a shutdown request).
    pub fn join(mut self) -> Result<(), RpcError> {
        match self.thread.take() {
            Some(t) => t
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("server thread panicked").into())),
            None => Ok(()),
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(t) = self.thread.take() {
            self.shutdown.shutdown();
            let _ = t.join();
        }
    }
}
