//! Error types for the chat server
//!
//! Defines session-level errors and outbound send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Every variant ends the session it occurs in; none of them is fatal to the
/// server except an `Io` error returned while binding the listener.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the socket or listener
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Client closed the stream before finishing login
    #[error("Client disconnected during login")]
    Disconnected,

    /// Client used up the configured number of color choices
    #[error("No valid color after {0} attempts")]
    ColorAttemptsExhausted(u32),

    /// The session's own outbound queue is closed
    #[error("Outbound send failed: {0}")]
    Send(#[from] SendError),
}

/// Message send errors
///
/// Occurs when queueing a message for a client whose writer task has ended.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
