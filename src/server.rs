//! ChatServer: listener and accept loop
//!
//! Owns the bound listener and the shared client registry, and spawns one
//! task per accepted connection.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::registry::ClientRegistry;

/// The chat server
///
/// The registry is created with the server and lives as long as it does.
pub struct ChatServer {
    listener: TcpListener,
    registry: Arc<ClientRegistry>,
    config: Arc<ServerConfig>,
}

impl ChatServer {
    /// Bind the configured address
    ///
    /// Failure here is fatal to the process.
    pub async fn bind(config: ServerConfig) -> Result<Self, AppError> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        Ok(Self::new(listener, config))
    }

    /// Wrap an already bound listener
    pub fn new(listener: TcpListener, config: ServerConfig) -> Self {
        Self {
            listener,
            registry: Arc::new(ClientRegistry::new()),
            config: Arc::new(config),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared handle to the registry of logged-in sessions
    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accept connections forever
    ///
    /// Accept errors are logged and the loop keeps listening.
    pub async fn run(self) {
        info!("Chat server accepting connections");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let registry = Arc::clone(&self.registry);
                    let config = Arc::clone(&self.config);

                    // Spawn handler task for each connection
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, registry, config).await {
                            warn!("Connection from {} ended with error: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpStream;

    use super::*;
    use crate::testing::TestClient;

    async fn start_server() -> (SocketAddr, Arc<ClientRegistry>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = ChatServer::new(listener, ServerConfig::default());
        let addr = server.local_addr().unwrap();
        let registry = server.registry();
        tokio::spawn(server.run());
        (addr, registry)
    }

    async fn connect(addr: SocketAddr) -> (TestClient<TcpStream>, u16) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let port = stream.local_addr().unwrap().port();
        (TestClient::new(stream), port)
    }

    #[tokio::test]
    async fn test_bind_reports_address() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let server = ChatServer::bind(config).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_failure_is_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: taken.local_addr().unwrap().port(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            ChatServer::bind(config).await,
            Err(AppError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_guest_chat_over_tcp() {
        let (addr, _registry) = start_server().await;

        let (mut alice, alice_port) = connect(addr).await;
        alice.login_guest("blue").await;
        let (mut bob, bob_port) = connect(addr).await;
        bob.login_guest("red").await;
        assert_ne!(alice_port, bob_port);

        alice
            .expect(&format!("Guest{} joined the chat.\n", bob_port))
            .await;

        alice.send("hello").await;
        bob.expect(&format!(
            "\r\x1b[K\x1b[94mGuest{}\x1b[0m > hello\n\rYou > ",
            alice_port
        ))
        .await;

        alice.send("/whoami").await;
        let seen = alice.expect("You are: ").await;
        assert!(!seen.contains("hello"));
    }

    #[tokio::test]
    async fn test_abrupt_disconnect_over_tcp() {
        let (addr, registry) = start_server().await;

        let (mut alice, _) = connect(addr).await;
        alice.login_named("Alice", "magenta").await;
        let (mut bob, _) = connect(addr).await;
        bob.login_guest("green").await;

        drop(alice);
        bob.expect("\r\x1b[KAlice left the chat.\n\rYou > ").await;

        bob.send("/online").await;
        let reply = bob.expect("\nYou > ").await;
        assert!(!reply.contains("Alice"));
        assert_eq!(reply.matches("(You)").count(), 1);
        assert_eq!(registry.len().await, 1);
    }
}
