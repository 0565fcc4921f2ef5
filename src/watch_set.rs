//! Watch set definition
//!
//! Ordered registry of every endpoint the loop waits on: the console,
//! the listener, then peers in accept order. Peers are owned here and
//! looked up by their stable `EndpointId`, so removing one never shifts
//! the identity of another.

use crate::peer::ConnectedPeer;
use crate::types::{EndpointId, Role};

/// Set of watched endpoints
#[derive(Debug)]
pub struct WatchSet {
    /// Listener identifier (never removed, never a recipient)
    listener: EndpointId,
    /// Whether console input is still being read
    console_open: bool,
    /// Connected peers in accept order
    peers: Vec<ConnectedPeer>,
}

impl WatchSet {
    /// Create a set watching the console and the given listener
    pub fn new(listener: EndpointId) -> Self {
        Self {
            listener,
            console_open: true,
            peers: Vec::new(),
        }
    }

    /// Listener identifier
    pub fn listener(&self) -> EndpointId {
        self.listener
    }

    /// Whether console input is still watched for readability
    pub fn console_open(&self) -> bool {
        self.console_open
    }

    /// Stop reading console input; the console stays a broadcast recipient
    pub fn close_console(&mut self) {
        self.console_open = false;
    }

    /// Append a newly accepted peer
    pub fn register(&mut self, peer: ConnectedPeer) -> EndpointId {
        let id = peer.id;
        self.peers.push(peer);
        id
    }

    /// Remove a peer by identity, keeping the order of the rest
    ///
    /// Returns the removed peer; dropping it closes the connection.
    pub fn deregister(&mut self, id: EndpointId) -> Option<ConnectedPeer> {
        let index = self.peers.iter().position(|p| p.id == id)?;
        Some(self.peers.remove(index))
    }

    /// Look up a peer
    pub fn peer(&self, id: EndpointId) -> Option<&ConnectedPeer> {
        self.peers.iter().find(|p| p.id == id)
    }

    /// Look up a peer mutably
    pub fn peer_mut(&mut self, id: EndpointId) -> Option<&mut ConnectedPeer> {
        self.peers.iter_mut().find(|p| p.id == id)
    }

    /// Connected peers in accept order
    pub fn peers(&self) -> impl Iterator<Item = &ConnectedPeer> {
        self.peers.iter()
    }

    /// Peer identifiers in accept order
    pub fn peer_ids(&self) -> Vec<EndpointId> {
        self.peers.iter().map(|p| p.id).collect()
    }

    /// Number of connected peers
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Every watched endpoint with its role, in iteration order
    pub fn endpoints(&self) -> Vec<(EndpointId, Role)> {
        let mut endpoints = Vec::with_capacity(self.peers.len() + 2);
        endpoints.push((EndpointId::Console, Role::Console));
        endpoints.push((self.listener, Role::Listener));
        endpoints.extend(self.peers.iter().map(|p| (p.id, Role::Peer)));
        endpoints
    }

    /// Broadcast recipients for a message from `source`
    ///
    /// Everything except the source and the listener.
    pub fn recipients(&self, source: EndpointId) -> Vec<EndpointId> {
        self.endpoints()
            .into_iter()
            .filter(|(id, role)| *role != Role::Listener && *id != source)
            .map(|(id, _)| id)
            .collect()
    }

    /// Remove every peer, in accept order
    pub fn drain_peers(&mut self) -> Vec<ConnectedPeer> {
        self.peers.drain(..).collect()
    }
}
