//! Telnet-style TCP Chat Server - Entry Point
//!
//! Parses configuration, binds the listener and runs the accept loop.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tcp_chat::{ChatServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=tcp_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tcp_chat=info")),
        )
        .init();

    let config = ServerConfig::parse();

    // Bind errors are fatal
    let server = ChatServer::bind(config).await?;
    info!("Telnet Chat Server running on {}", server.local_addr()?);

    server.run().await;

    Ok(())
}
