//! Basic type definitions for the chat server
//!
//! Provides type-safe identifiers:
//! - `EndpointId`: the console, or the descriptor number of a socket
//! - `Role`: what a watched endpoint is for

/// Identifier of a watched endpoint
///
/// Sockets are identified by their OS descriptor number, which is unique
/// among open descriptors and therefore stable while the endpoint is
/// registered. The console has its own variant, so a socket that happens to
/// get descriptor 0 is never mistaken for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointId {
    /// The operator console (standard input)
    Console,
    /// A listening or connected socket
    Socket(u64),
}

impl EndpointId {
    /// Identifier of an open socket
    #[cfg(unix)]
    pub fn of<S: std::os::fd::AsRawFd>(socket: &S) -> Self {
        Self::Socket(socket.as_raw_fd() as u64)
    }

    /// Identifier of an open socket
    #[cfg(windows)]
    pub fn of<S: std::os::windows::io::AsRawSocket>(socket: &S) -> Self {
        Self::Socket(socket.as_raw_socket())
    }
}

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Standard input's descriptor number
            EndpointId::Console => write!(f, "fd0"),
            EndpointId::Socket(fd) => write!(f, "fd{}", fd),
        }
    }
}

/// Role of a watched endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Operator input; receives broadcasts on the operator output
    Console,
    /// Listening socket; never a broadcast recipient
    Listener,
    /// Accepted client connection
    Peer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_id_display() {
        assert_eq!(EndpointId::Socket(7).to_string(), "fd7");
        assert_eq!(EndpointId::Console.to_string(), "fd0");
    }

    #[test]
    fn test_socket_zero_is_not_console() {
        assert_ne!(EndpointId::Socket(0), EndpointId::Console);
    }

    #[test]
    fn test_socket_ids_unique() {
        let a = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let b = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        assert_ne!(EndpointId::of(&a), EndpointId::of(&b));
        assert_ne!(EndpointId::of(&a), EndpointId::Console);
    }
}
