//! Poll Chat Server - Entry Point
//!
//! Binds the listener, wires standard input/output as the operator console,
//! hooks ctrl-c to the shutdown token and runs the readiness loop.

use std::env;
use std::process::ExitCode;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use poll_chat::{ChatServer, ServerConfig};

fn main() -> ExitCode {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=poll_chat=trace
    // Logs go to stderr; stdout carries the relayed chat
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("poll_chat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Get port from command line or use default
    let config = match ServerConfig::from_arg(env::args().nth(1)) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid port argument: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    runtime.spawn(stop_on_interrupt(shutdown.clone()));

    let result = serve(
        runtime,
        config,
        tokio::io::stdin(),
        tokio::io::stdout(),
        shutdown,
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_startup() => {
            error!("Failed to start server: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Server stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the server to completion on `runtime`, then tear the runtime down
///
/// A console read may still be parked on a blocking thread when the loop
/// ends, so the runtime is shut down without waiting for it.
fn serve<R, W>(
    runtime: Runtime,
    config: ServerConfig,
    console_in: R,
    console_out: W,
    shutdown: CancellationToken,
) -> poll_chat::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let result = runtime.block_on(async {
        let server = ChatServer::bind(config)?;
        server.run(console_in, console_out, shutdown).await
    });
    runtime.shutdown_background();
    result
}

/// Cancel `shutdown` on every interrupt; repeated interrupts are harmless
async fn stop_on_interrupt(shutdown: CancellationToken) {
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for interrupt: {}", e);
            return;
        }
        info!("Interrupt received, shutting down server");
        shutdown.cancel();
    }
}
