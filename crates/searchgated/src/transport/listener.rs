//! Non-blocking accept loop over TCP or Unix sockets.

use std::io;
#[cfg(test)]
use std::net::SocketAddr;
use std::net::{TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::Path;

use tracing::{debug, info, warn};

use searchgate_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, ListenerError, TRANSPORT_TARGET};

const IDLE_POLL: Duration = Duration::from_millis(25);
const ERROR_POLL: Duration = Duration::from_millis(150);

#[derive(Debug)]
enum Socket {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl Socket {
    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix(listener) => listener.set_nonblocking(true),
        }
    }

    fn accept(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match self {
            Self::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            Self::Unix(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

/// Bound gateway socket that has not started accepting yet.
#[derive(Debug)]
pub(crate) struct GatewayListener {
    endpoint: SocketEndpoint,
    socket: Socket,
}

impl GatewayListener {
    /// Binds `endpoint`, reclaiming a stale Unix socket file if one is left.
    pub(crate) fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let socket = match endpoint {
            SocketEndpoint::Tcp { host, port } => Socket::Tcp(bind_tcp(host, *port)?),
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => Socket::Unix(bind_unix(path.as_std_path())?),
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => {
                return Err(ListenerError::UnsupportedUnix {
                    endpoint: endpoint.to_string(),
                });
            }
        };
        Ok(Self {
            endpoint: endpoint.clone(),
            socket,
        })
    }

    /// Bound TCP address; `None` for Unix sockets.
    #[cfg(test)]
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match &self.socket {
            Socket::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Socket::Unix(_) => None,
        }
    }

    /// Starts accepting on a background thread.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.socket.set_nonblocking() {
            remove_socket_file(&self.endpoint);
            return Err(ListenerError::NonBlocking { source });
        }
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = thread::spawn(move || self.accept_until(&thread_stop, &handler));
        Ok(ListenerHandle {
            stop,
            thread: Some(thread),
        })
    }

    fn accept_until(self, stop: &AtomicBool, handler: &Arc<dyn ConnectionHandler>) {
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %self.endpoint,
            "gateway listener accepting connections"
        );
        let mut reported = None::<io::ErrorKind>;
        let mut connections = Vec::new();
        while !stop.load(Ordering::SeqCst) {
            match self.socket.accept() {
                Ok(Some(stream)) => {
                    reported = None;
                    debug!(
                        target: TRANSPORT_TARGET,
                        peer = %stream.peer(),
                        "accepted connection"
                    );
                    reap_finished(&mut connections);
                    let connection_handler = Arc::clone(handler);
                    connections.push(thread::spawn(move || connection_handler.handle(stream)));
                }
                Ok(None) => thread::sleep(IDLE_POLL),
                Err(error) => {
                    if reported != Some(error.kind()) {
                        warn!(
                            target: TRANSPORT_TARGET,
                            error = %error,
                            "failed to accept connection"
                        );
                        reported = Some(error.kind());
                    }
                    thread::sleep(ERROR_POLL);
                }
            }
        }
        remove_socket_file(&self.endpoint);
        reap_finished(&mut connections);
        if !connections.is_empty() {
            info!(
                target: TRANSPORT_TARGET,
                in_flight = connections.len(),
                "waiting for in-flight connections"
            );
        }
        connections.into_iter().for_each(join_connection);
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %self.endpoint,
            "gateway listener stopped"
        );
    }
}

/// Joins connection threads that have already returned.
fn reap_finished(connections: &mut Vec<JoinHandle<()>>) {
    let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(connections)
        .into_iter()
        .partition(JoinHandle::is_finished);
    *connections = running;
    finished.into_iter().for_each(join_connection);
}

fn join_connection(connection: JoinHandle<()>) {
    if connection.join().is_err() {
        warn!(target: TRANSPORT_TARGET, "connection handler panicked");
    }
}

/// Control handle for a running listener.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to exit after its current poll.
    pub(crate) fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept loop to exit and every accepted connection to
    /// finish.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        self.thread
            .take()
            .map_or(Ok(()), |thread| {
                thread.join().map_err(|_panic| ListenerError::ThreadPanic)
            })
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?
        .next()
        .ok_or_else(|| ListenerError::NoAddress {
            host: host.to_owned(),
            port,
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}

#[cfg(unix)]
fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    if fs::symlink_metadata(path).is_ok() {
        reclaim_stale_socket(path)?;
    }
    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(unix)]
fn reclaim_stale_socket(path: &Path) -> Result<(), ListenerError> {
    let reclaim = |action: &'static str| {
        let display = path.display().to_string();
        move |source: io::Error| ListenerError::UnixReclaim {
            path: display,
            action,
            source,
        }
    };

    let metadata = fs::symlink_metadata(path).map_err(reclaim("reading metadata"))?;
    if !metadata.file_type().is_socket() {
        return Err(ListenerError::UnixNotSocket {
            path: path.display().to_string(),
        });
    }
    match UnixStream::connect(path) {
        Ok(_live) => Err(ListenerError::UnixInUse {
            path: path.display().to_string(),
        }),
        Err(error)
            if matches!(
                error.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
            ) =>
        {
            debug!(
                target: TRANSPORT_TARGET,
                path = %path.display(),
                "removing stale unix socket"
            );
            fs::remove_file(path).map_err(reclaim("removing the file"))
        }
        Err(error) => Err(reclaim("probing for a live server")(error)),
    }
}

fn remove_socket_file(endpoint: &SocketEndpoint) {
    let Some(path) = endpoint.unix_path() else {
        return;
    };
    if let Err(error) = std::fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: TRANSPORT_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpStream;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    #[derive(Default)]
    struct CountingHandler {
        seen: AtomicUsize,
    }

    impl ConnectionHandler for CountingHandler {
        fn handle(&self, _stream: ConnectionStream) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn eventually(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[fixture]
    fn socket_dir() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn unix_endpoint(dir: &TempDir) -> SocketEndpoint {
        let path = dir.path().join("searchgated.sock");
        SocketEndpoint::unix(path.to_str().expect("utf8 path").to_owned())
    }

    #[test]
    fn tcp_connections_reach_the_handler() {
        let listener =
            GatewayListener::bind(&SocketEndpoint::tcp("127.0.0.1", 0)).expect("bind tcp");
        let addr = listener.local_addr().expect("tcp address");
        let handler = Arc::new(CountingHandler::default());
        let handle = listener
            .start(Arc::clone(&handler) as Arc<dyn ConnectionHandler>)
            .expect("start listener");

        TcpStream::connect(addr).expect("first client");
        TcpStream::connect(addr).expect("second client");

        assert!(eventually(|| handler.seen.load(Ordering::SeqCst) == 2));
        handle.shutdown();
        handle.join().expect("join listener");
    }

    struct SlowHandler {
        started: AtomicBool,
        finished: AtomicBool,
    }

    impl ConnectionHandler for SlowHandler {
        fn handle(&self, _stream: ConnectionStream) {
            self.started.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(300));
            self.finished.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn join_waits_for_in_flight_connections() {
        let listener =
            GatewayListener::bind(&SocketEndpoint::tcp("127.0.0.1", 0)).expect("bind tcp");
        let addr = listener.local_addr().expect("tcp address");
        let handler = Arc::new(SlowHandler {
            started: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        });
        let handle = listener
            .start(Arc::clone(&handler) as Arc<dyn ConnectionHandler>)
            .expect("start listener");

        let _client = TcpStream::connect(addr).expect("client");
        assert!(eventually(|| handler.started.load(Ordering::SeqCst)));
        handle.shutdown();
        handle.join().expect("join listener");

        assert!(handler.finished.load(Ordering::SeqCst));
    }

    #[cfg(unix)]
    #[rstest]
    fn stale_socket_is_reclaimed_and_removed_on_stop(socket_dir: TempDir) {
        let endpoint = unix_endpoint(&socket_dir);
        let path = endpoint.unix_path().expect("unix path").as_std_path().to_owned();
        drop(UnixListener::bind(&path).expect("stale listener"));
        assert!(path.exists());

        let listener = GatewayListener::bind(&endpoint).expect("rebind");
        assert!(listener.local_addr().is_none());
        let handler = Arc::new(CountingHandler::default());
        let handle = listener
            .start(Arc::clone(&handler) as Arc<dyn ConnectionHandler>)
            .expect("start listener");

        UnixStream::connect(&path).expect("unix client");
        assert!(eventually(|| handler.seen.load(Ordering::SeqCst) == 1));

        handle.shutdown();
        handle.join().expect("join listener");
        assert!(!path.exists(), "socket file should be removed");
    }

    #[cfg(unix)]
    #[rstest]
    fn live_socket_is_not_stolen(socket_dir: TempDir) {
        let endpoint = unix_endpoint(&socket_dir);
        let path = endpoint.unix_path().expect("unix path").as_std_path().to_owned();
        let _live = UnixListener::bind(&path).expect("live listener");

        let error = GatewayListener::bind(&endpoint).expect_err("bind should fail");
        assert!(matches!(error, ListenerError::UnixInUse { .. }));
    }

    #[cfg(unix)]
    #[rstest]
    fn regular_file_blocks_the_socket_path(socket_dir: TempDir) {
        let endpoint = unix_endpoint(&socket_dir);
        let path = endpoint.unix_path().expect("unix path").as_std_path().to_owned();
        fs::write(&path, b"not a socket").expect("write file");

        let error = GatewayListener::bind(&endpoint).expect_err("bind should fail");
        assert!(matches!(error, ListenerError::UnixNotSocket { .. }));
        assert!(path.exists(), "regular file must be left alone");
    }
}
