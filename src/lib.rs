//! Telnet-style TCP Chat Server Library
//!
//! A multi-user chat server for raw line-oriented TCP clients (telnet,
//! netcat), built on tokio.
//!
//! # Features
//! - Guest or username login
//! - Name color selection from a fixed palette
//! - Broadcast chat to every other connected user
//! - `/whoami`, `/online` (`/all`) and `/quit` commands
//! - Join and leave announcements
//!
//! # Architecture
//! - `ClientRegistry` is the only shared state: an ordered list of sessions
//!   behind a single mutex, with broadcast performed under that lock
//! - Each connection runs in its own task (`handler`), plus a writer task
//!   that owns the socket's write half and drains the session's queue
//!
//! # Example
//! ```ignore
//! use tcp_chat::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = ChatServer::bind(ServerConfig::default()).await.unwrap();
//!     server.run().await;
//! }
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use color::Color;
pub use config::ServerConfig;
pub use error::{AppError, SendError};
pub use handler::{handle_connection, run_session};
pub use message::{ClientCommand, ServerMessage};
pub use registry::ClientRegistry;
pub use server::ChatServer;
pub use session::Session;
pub use types::ClientId;
