//! Listening endpoint
//!
//! Performs the startup contract: create an IPv4 stream socket, enable
//! address reuse, bind, then listen with a bounded backlog. Each step maps
//! to its own `ServerError` variant; a failed step drops (closes) whatever
//! was already acquired.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::peer::ConnectedPeer;
use crate::types::EndpointId;

/// Bound, listening server socket
#[derive(Debug)]
pub struct ListenerEndpoint {
    /// Descriptor-based identifier
    pub id: EndpointId,
    /// Bound address (port resolved if 0 was requested)
    pub addr: SocketAddr,
    listener: TcpListener,
}

impl ListenerEndpoint {
    /// Create, bind and start listening according to `config`
    pub fn bind(config: &ServerConfig) -> Result<Self> {
        let socket = TcpSocket::new_v4().map_err(ServerError::SocketCreation)?;

        // A failure here is not fatal: binding may still succeed
        if let Err(e) = socket.set_reuseaddr(true) {
            warn!("Failed to enable address reuse: {}", e);
        }

        let addr = config.bind_addr();
        socket
            .bind(addr)
            .map_err(|source| ServerError::Bind { addr, source })?;

        let listener = socket.listen(config.backlog).map_err(ServerError::Listen)?;
        let addr = listener.local_addr().map_err(ServerError::Listen)?;
        let id = EndpointId::of(&listener);
        debug!("Listener {} bound to {} (backlog {})", id, addr, config.backlog);

        Ok(Self { id, addr, listener })
    }

    /// Port the listener is bound to
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Accept exactly one pending connection
    ///
    /// Cancel safe: used both in the readiness wait and in the per-cycle scan.
    pub async fn accept(&self) -> Result<ConnectedPeer> {
        let (stream, addr) = self.listener.accept().await.map_err(ServerError::Accept)?;
        Ok(ConnectedPeer::new(stream, addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let listener = ListenerEndpoint::bind(&ServerConfig::with_port(0)).unwrap();
        assert_ne!(listener.port(), 0);
        assert!(listener.addr.ip().is_unspecified());
    }

    #[tokio::test]
    async fn test_bind_port_in_use() {
        let first = ListenerEndpoint::bind(&ServerConfig::with_port(0)).unwrap();
        let second = ListenerEndpoint::bind(&ServerConfig::with_port(first.port()));

        assert!(matches!(second, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_accept_one() {
        let listener = ListenerEndpoint::bind(&ServerConfig::with_port(0)).unwrap();
        let client = TcpStream::connect(("127.0.0.1", listener.port()))
            .await
            .unwrap();

        let peer = listener.accept().await.unwrap();
        assert_eq!(peer.addr, client.local_addr().unwrap());
        assert_ne!(peer.id, listener.id);
    }
}
