//! Server configuration
//!
//! Compiled-in defaults, optionally overridden from the command line.

use std::net::{Ipv4Addr, SocketAddr};

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Default pending-connection backlog
pub const DEFAULT_BACKLOG: u32 = 3;

/// Receive buffer size, including the slot a C-style reader would keep for a terminator
pub const BUFFER_SIZE: usize = 1024;

/// Console line that stops the server
pub const QUIT_COMMAND: &[u8] = b"quit\n";

/// Text sent to every remaining endpoint before the listener closes
pub const SHUTDOWN_NOTICE: &str = "Shutting down server...";

/// Runtime configuration for [`crate::ChatServer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port to bind on all IPv4 interfaces (0 picks an ephemeral port)
    pub port: u16,
    /// Listen backlog
    pub backlog: u32,
    /// Receive buffer size; at most `buffer_size - 1` bytes are read per chunk
    pub buffer_size: usize,
}

impl ServerConfig {
    /// Config with the given port and every other field defaulted
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    /// Parse the port from a command line argument, falling back to the default
    pub fn from_arg(arg: Option<String>) -> Result<Self, std::num::ParseIntError> {
        match arg {
            Some(port) => Ok(Self::with_port(port.trim().parse()?)),
            None => Ok(Self::default()),
        }
    }

    /// Address the listener binds to
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    /// Largest number of meaningful bytes taken per read
    pub fn chunk_capacity(&self) -> usize {
        self.buffer_size.saturating_sub(1).max(1)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            buffer_size: BUFFER_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.backlog, 3);
        assert_eq!(config.chunk_capacity(), 1023);
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_from_arg() {
        assert_eq!(ServerConfig::from_arg(None).unwrap().port, 8080);
        assert_eq!(ServerConfig::from_arg(Some("9000".into())).unwrap().port, 9000);
        assert!(ServerConfig::from_arg(Some("not-a-port".into())).is_err());
        assert!(ServerConfig::from_arg(Some("70000".into())).is_err());
    }
}
