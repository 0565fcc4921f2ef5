//! ChatServer readiness loop
//!
//! A single task multiplexes the operator console, the listener and every
//! connected peer. Each cycle blocks in one readiness wait, then scans the
//! watch set in order (console, listener, peers) and dispatches whatever is
//! ready. Text read from any endpoint is relayed to every other endpoint.

use std::io;
use std::net::SocketAddr;

use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ServerConfig, SHUTDOWN_NOTICE};
use crate::error::{Result, ServerError};
use crate::listener::ListenerEndpoint;
use crate::message::{frame, is_quit, printable};
use crate::peer::{ConnectedPeer, ReadOutcome};
use crate::types::EndpointId;
use crate::watch_set::WatchSet;

/// What ended a readiness wait
#[derive(Debug)]
enum Wake {
    /// Stop signal fired
    Shutdown,
    /// Console produced a chunk (empty on end of input)
    Console(io::Result<Vec<u8>>),
    /// Listener produced a connection
    Listener(Result<ConnectedPeer>),
    /// A peer reported read readiness
    Peer(EndpointId, io::Result<()>),
}

/// An endpoint found ready during this cycle's scan
#[derive(Debug)]
enum Ready {
    Console(io::Result<Vec<u8>>),
    Listener(Result<ConnectedPeer>),
    Peer(EndpointId),
}

/// The connection multiplexer and broadcast loop
#[derive(Debug)]
pub struct ChatServer {
    config: ServerConfig,
    listener: ListenerEndpoint,
    watch_set: WatchSet,
}

impl ChatServer {
    /// Bind the listener according to `config`
    pub fn bind(config: ServerConfig) -> Result<Self> {
        let listener = ListenerEndpoint::bind(&config)?;
        info!("Server listening on port {}", listener.port());
        let watch_set = WatchSet::new(listener.id);

        Ok(Self {
            config,
            listener,
            watch_set,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.addr
    }

    /// Current watch set
    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }

    /// Run the loop until `shutdown` is cancelled or the console sends the quit command
    ///
    /// `console_in` is the operator input; `console_out` receives relayed peer
    /// messages and the shutdown notice. The quit command cancels `shutdown`.
    /// A broken listener ends the run with [`ServerError::Accept`] without the
    /// shutdown notice; every descriptor is still closed on drop.
    pub async fn run<R, W>(
        mut self,
        mut console_in: R,
        mut console_out: W,
        shutdown: CancellationToken,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Server set up for multiple clients");
        let mut fatal = None;

        while !shutdown.is_cancelled() {
            let wake = self.wait(&mut console_in, &shutdown).await;
            let ready = match wake {
                Wake::Shutdown => break,
                Wake::Peer(_, Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Wake::Peer(_, Err(e)) => {
                    error!("Readiness wait failed: {}", e);
                    fatal = Some(ServerError::Wait(e));
                    break;
                }
                wake => self.scan(wake, &mut console_in),
            };

            for endpoint in ready {
                self.dispatch(endpoint, &mut console_out, &shutdown).await?;
            }
        }

        self.shutdown(&mut console_out).await;

        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Block until the stop signal fires or any watched endpoint is readable
    async fn wait<R>(&self, console_in: &mut R, shutdown: &CancellationToken) -> Wake
    where
        R: AsyncRead + Unpin,
    {
        let capacity = self.config.chunk_capacity();
        let console_open = self.watch_set.console_open();

        let console = async {
            if console_open {
                read_chunk(&mut *console_in, capacity).await
            } else {
                std::future::pending::<io::Result<Vec<u8>>>().await
            }
        };

        let peers = async {
            let mut readable: FuturesUnordered<_> = self
                .watch_set
                .peers()
                .map(|peer| async move { (peer.id, peer.readable().await) })
                .collect();

            match readable.next().await {
                Some(ready) => ready,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Wake::Shutdown,
            chunk = console => Wake::Console(chunk),
            accepted = self.listener.accept() => Wake::Listener(accepted),
            (id, ready) = peers => Wake::Peer(id, ready),
        }
    }

    /// Build this cycle's readiness list in watch set order
    ///
    /// The endpoint that ended the wait is already known to be ready; the
    /// console and the listener are polled once more without blocking, and
    /// every peer is listed so the dispatcher can try a non-blocking read.
    fn scan<R>(&self, wake: Wake, console_in: &mut R) -> Vec<Ready>
    where
        R: AsyncRead + Unpin,
    {
        let (mut console, mut listener) = (None, None);
        match wake {
            Wake::Console(chunk) => console = Some(chunk),
            Wake::Listener(accepted) => listener = Some(accepted),
            Wake::Peer(..) | Wake::Shutdown => {}
        }

        if console.is_none() && self.watch_set.console_open() {
            console = read_chunk(console_in, self.config.chunk_capacity()).now_or_never();
        }
        if listener.is_none() {
            listener = self.listener.accept().now_or_never();
        }

        let mut ready = Vec::with_capacity(self.watch_set.peer_count() + 2);
        ready.extend(console.map(Ready::Console));
        ready.extend(listener.map(Ready::Listener));
        ready.extend(self.watch_set.peer_ids().into_iter().map(Ready::Peer));
        ready
    }

    /// Handle one ready endpoint
    async fn dispatch<W>(
        &mut self,
        ready: Ready,
        console_out: &mut W,
        shutdown: &CancellationToken,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match ready {
            Ready::Console(Ok(chunk)) if chunk.is_empty() => {
                info!("Console input closed");
                self.watch_set.close_console();
            }
            Ready::Console(Ok(chunk)) => {
                self.broadcast(EndpointId::Console, &chunk, console_out).await;
                if is_quit(&chunk) {
                    info!("Quit command received");
                    shutdown.cancel();
                }
            }
            Ready::Console(Err(e)) if e.kind() == io::ErrorKind::Interrupted => {}
            Ready::Console(Err(e)) => {
                warn!("Console read failed, no longer reading console: {}", e);
                self.watch_set.close_console();
            }
            Ready::Listener(accepted) => {
                let peer = match accepted {
                    Ok(peer) => peer,
                    Err(e) => {
                        error!("{}", e);
                        return Err(e);
                    }
                };
                info!(
                    "Client {}:{} connected on {}",
                    peer.addr.ip(),
                    peer.addr.port(),
                    peer.id
                );
                self.watch_set.register(peer);
                debug!("Total peers: {}", self.watch_set.peer_count());
            }
            Ready::Peer(id) => {
                // Already deregistered earlier in this cycle
                let Some(peer) = self.watch_set.peer(id) else {
                    return Ok(());
                };

                match peer.try_read_chunk(self.config.chunk_capacity()) {
                    ReadOutcome::Data(chunk) => {
                        self.broadcast(id, &chunk, console_out).await;
                    }
                    ReadOutcome::NotReady => {}
                    ReadOutcome::Closed => {
                        info!("{} disconnected", id);
                        // Dropping the removed peer closes its socket
                        self.watch_set.deregister(id);
                        debug!("Total peers: {}", self.watch_set.peer_count());
                    }
                }
            }
        }

        Ok(())
    }

    /// Relay a chunk to every endpoint except its source and the listener
    ///
    /// Best effort: a failed write is logged and skipped. The recipient stays
    /// registered until its own read fails.
    async fn broadcast<W>(&mut self, source: EndpointId, chunk: &[u8], console_out: &mut W)
    where
        W: AsyncWrite + Unpin,
    {
        let framed = frame(source, chunk);
        info!("{}", printable(&framed));

        let mut delivered = 0;
        for id in self.watch_set.recipients(source) {
            let sent = if id == EndpointId::Console {
                write_console(console_out, &framed).await
            } else if let Some(peer) = self.watch_set.peer_mut(id) {
                peer.send(&framed).await
            } else {
                continue;
            };

            match sent {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Failed to deliver message to {}: {}", id, e),
            }
        }

        debug!("Relayed message from {} to {} recipient(s)", source, delivered);
    }

    /// Notify every remaining endpoint, close the peers, then close the listener
    async fn shutdown<W>(self, console_out: &mut W)
    where
        W: AsyncWrite + Unpin,
    {
        let Self {
            listener,
            mut watch_set,
            ..
        } = self;
        let notice = SHUTDOWN_NOTICE.as_bytes();

        // The operator output gets a line of its own
        let console_notice = format!("{}\n", SHUTDOWN_NOTICE);
        if let Err(e) = write_console(console_out, console_notice.as_bytes()).await {
            debug!("Failed to deliver shutdown notice to console: {}", e);
        }

        for mut peer in watch_set.drain_peers() {
            debug!("Sending shutdown notice to {}", peer.id);
            if let Err(e) = peer.send(notice).await {
                debug!("Failed to deliver shutdown notice to {}: {}", peer.id, e);
            }
            peer.close().await;
        }

        drop(listener);
        info!("Server closed");
    }
}

/// Read one chunk of at most `capacity` bytes
///
/// Cancel safe as long as the underlying `read` is.
async fn read_chunk<R>(reader: &mut R, capacity: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; capacity];
    let n = reader.read(&mut buf).await?;
    buf.truncate(n);
    Ok(buf)
}

/// Write to the operator output and flush
async fn write_console<W>(console_out: &mut W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    console_out.write_all(bytes).await?;
    console_out.flush().await
}
