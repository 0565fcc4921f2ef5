//! Error types for the chat server
//!
//! Startup failures, fatal loop failures, and a `Result` alias.
//! Uses thiserror for ergonomic error definitions.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Fatal server errors
///
/// Peer read failures and broadcast write failures are not represented here:
/// the former is a normal disconnect and the latter is ignored per recipient.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The OS could not allocate a stream socket
    #[error("Socket creation failed: {0}")]
    SocketCreation(#[source] io::Error),

    /// The address is already in use or otherwise unavailable
    #[error("Bind to {addr} failed: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Transition to the listening state failed
    #[error("Listen failed: {0}")]
    Listen(#[source] io::Error),

    /// Accepting a pending connection failed (listener considered broken)
    #[error("Accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The readiness wait failed for a reason other than an interruption
    #[error("Readiness wait failed: {0}")]
    Wait(#[source] io::Error),
}

impl ServerError {
    /// Whether this error happened before the loop started
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            ServerError::SocketCreation(_) | ServerError::Bind { .. } | ServerError::Listen(_)
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = ServerError::Bind {
            addr: "0.0.0.0:8080".parse().unwrap(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        let text = err.to_string();
        assert!(text.contains("0.0.0.0:8080"));
        assert!(err.is_startup());
    }

    #[test]
    fn test_loop_errors_are_not_startup() {
        let err = ServerError::Accept(io::Error::from(io::ErrorKind::ConnectionAborted));
        assert!(!err.is_startup());
        assert!(err.to_string().starts_with("Accept failed"));
    }
}
