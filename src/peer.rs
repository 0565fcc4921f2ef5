//! Connected peer definition
//!
//! Represents an accepted client connection and owns its socket.
//! Dropping a `ConnectedPeer` closes the connection.

use std::io;
use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::types::EndpointId;

/// Outcome of a non-blocking read attempt on a peer
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes were read
    Data(Vec<u8>),
    /// Nothing available this cycle
    NotReady,
    /// Peer closed the connection or the read failed
    Closed,
}

/// Accepted client connection
#[derive(Debug)]
pub struct ConnectedPeer {
    /// Descriptor-based identifier
    pub id: EndpointId,
    /// Remote address captured at accept time
    pub addr: SocketAddr,
    /// Owned socket
    stream: TcpStream,
}

impl ConnectedPeer {
    /// Wrap a freshly accepted stream
    pub fn new(stream: TcpStream, addr: SocketAddr) -> Self {
        Self {
            id: EndpointId::of(&stream),
            addr,
            stream,
        }
    }

    /// Wait until the socket reports read readiness
    pub async fn readable(&self) -> io::Result<()> {
        self.stream.readable().await
    }

    /// Read at most `capacity` bytes without blocking
    pub fn try_read_chunk(&self, capacity: usize) -> ReadOutcome {
        let mut buf = vec![0u8; capacity];
        match self.stream.try_read(&mut buf) {
            Ok(0) => ReadOutcome::Closed,
            Ok(n) => {
                buf.truncate(n);
                ReadOutcome::Data(buf)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => ReadOutcome::NotReady,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => ReadOutcome::NotReady,
            Err(_) => ReadOutcome::Closed,
        }
    }

    /// Write a whole message to this peer
    pub async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await
    }

    /// Half-close the write side, then drop the socket
    pub async fn close(mut self) {
        let _ = self.stream.shutdown().await;
    }
}
