//! Session struct definition
//!
//! Represents a logged-in client: identity, display name, color and the
//! handle to its outbound writer task.

use tokio::sync::mpsc;

use crate::color::Color;
use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Logged-in client information
///
/// Cloning a session clones only the queue handle; the socket stays owned by
/// the connection's writer task.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identity of the underlying connection
    pub id: ClientId,
    /// Display name chosen at login (not unique)
    pub username: String,
    /// Name color chosen at login
    pub color: Color,
    /// Server → Client message channel
    sender: mpsc::Sender<ServerMessage>,
}

impl Session {
    /// Create a session for a connection that finished login
    pub fn new(
        id: ClientId,
        username: String,
        color: Color,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Self {
        Self {
            id,
            username,
            color,
            sender,
        }
    }

    /// Queue a message for this client
    ///
    /// Waits for queue capacity. Returns an error if the writer task has
    /// ended (client disconnected).
    pub async fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Display name wrapped in the session's color
    pub fn colored_name(&self) -> String {
        self.color.paint(&self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let session = Session::new(ClientId::new(), "Alice".to_string(), Color::Green, tx);

        assert_eq!(session.username, "Alice");
        assert_eq!(session.colored_name(), "\x1b[92mAlice\x1b[0m");
    }

    #[tokio::test]
    async fn test_session_send() {
        let (tx, mut rx) = mpsc::channel(32);
        let session = Session::new(ClientId::new(), "Alice".to_string(), Color::Red, tx);

        session.send(ServerMessage::UnknownCommand).await.unwrap();
        assert_eq!(rx.recv().await, Some(ServerMessage::UnknownCommand));
    }

    #[tokio::test]
    async fn test_session_send_after_close() {
        let (tx, rx) = mpsc::channel(32);
        let session = Session::new(ClientId::new(), "Alice".to_string(), Color::Red, tx);
        drop(rx);

        let result = session.send(ServerMessage::UnknownCommand).await;
        assert!(matches!(result, Err(SendError::ChannelClosed)));
    }
}
