//! Poll Chat Server Library
//!
//! A learning-oriented TCP chat relay built around a single readiness loop.
//!
//! # Features
//! - Any number of TCP clients on one task
//! - Operator console on standard input
//! - Every chunk relayed to all other endpoints as `"[fd<N>]: <text>"`
//! - Disconnect handling
//! - Graceful shutdown on `quit` or interrupt
//!
//! # Architecture
//! One task owns every descriptor:
//! - `ChatServer` waits until the console, the listener or any peer is readable
//! - The `WatchSet` owns the peers and yields them in accept order each cycle
//! - Shutdown is a `CancellationToken` checked by the wait
//!
//! # Example
//! ```ignore
//! use poll_chat::{ChatServer, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), poll_chat::ServerError> {
//!     let server = ChatServer::bind(ServerConfig::default())?;
//!     let shutdown = CancellationToken::new();
//!     server
//!         .run(tokio::io::stdin(), tokio::io::stdout(), shutdown)
//!         .await
//! }
//! ```

pub mod config;
pub mod error;
pub mod listener;
pub mod message;
pub mod peer;
pub mod server;
pub mod types;
pub mod watch_set;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use listener::ListenerEndpoint;
pub use peer::ConnectedPeer;
pub use server::ChatServer;
pub use types::{EndpointId, Role};
pub use watch_set::WatchSet;
