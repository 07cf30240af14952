//! TCP connection handler
//!
//! Drives one connection through login, color selection and the chat loop,
//! then cleans up. A dedicated writer task owns the socket's write half and
//! drains the session's outbound queue, so replies and broadcasts from other
//! sessions reach the socket one at a time, in queue order.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::color::{Color, UnknownColor};
use crate::config::ServerConfig;
use crate::error::{AppError, SendError};
use crate::message::{ClientCommand, ServerMessage};
use crate::registry::ClientRegistry;
use crate::session::Session;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Returns once the session has ended and its cleanup has run.
pub async fn handle_connection(
    stream: TcpStream,
    registry: Arc<ClientRegistry>,
    config: Arc<ServerConfig>,
) -> Result<(), AppError> {
    let peer_addr = stream.peer_addr()?;
    let (read_half, write_half) = stream.into_split();
    run_session(read_half, write_half, peer_addr, registry, &config).await
}

/// Run one session over an arbitrary byte stream
///
/// `peer_addr` only feeds guest name generation and logging.
pub async fn run_session<R, W>(
    reader: R,
    writer: W,
    peer_addr: SocketAddr,
    registry: Arc<ClientRegistry>,
    config: &ServerConfig,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let client_id = ClientId::new();
    debug!("Client {} connected from {}", client_id, peer_addr);

    // Create channel for server -> client messages
    let (msg_tx, msg_rx) = mpsc::channel::<ServerMessage>(config.outbound_capacity());
    let write_task = tokio::spawn(write_loop(writer, msg_rx, client_id));

    let mut lines = LineReader::new(reader);

    let result = match login(&mut lines, &msg_tx, peer_addr, config).await {
        Ok((username, color)) => {
            let session = Session::new(client_id, username, color, msg_tx.clone());
            let outcome = run_active(&mut lines, &session, &registry).await;
            cleanup(&session, &registry).await;
            outcome
        }
        Err(AppError::Disconnected) => {
            debug!("Client {} left during login", client_id);
            Ok(())
        }
        Err(e) => Err(e),
    };

    // Release the connection: the writer drains what is queued, then shuts down
    drop(msg_tx);
    if let Err(e) = write_task.await {
        warn!("Write task for {} failed: {}", client_id, e);
    }

    result
}

/// Login handshake: name choice, then color choice
async fn login<R>(
    lines: &mut LineReader<R>,
    out: &mpsc::Sender<ServerMessage>,
    peer_addr: SocketAddr,
    config: &ServerConfig,
) -> Result<(String, Color), AppError>
where
    R: AsyncRead + Unpin,
{
    send(out, ServerMessage::Welcome).await?;
    let choice = lines.require_line().await?;

    let username = if choice == "2" {
        send(out, ServerMessage::UsernamePrompt).await?;
        lines.require_line().await?
    } else {
        guest_name(peer_addr)
    };

    send(out, ServerMessage::AvailableColors).await?;
    let color = choose_color(lines, out, config.max_color_attempts).await?;

    Ok((username, color))
}

/// Prompt until the input names a palette color
///
/// Unlimited unless `max_attempts` is set.
async fn choose_color<R>(
    lines: &mut LineReader<R>,
    out: &mpsc::Sender<ServerMessage>,
    max_attempts: Option<u32>,
) -> Result<Color, AppError>
where
    R: AsyncRead + Unpin,
{
    let mut failures = 0u32;
    loop {
        send(out, ServerMessage::ColorPrompt).await?;
        match lines.require_line().await?.parse::<Color>() {
            Ok(color) => return Ok(color),
            Err(UnknownColor(input)) => {
                debug!("Rejected color choice {:?}", input);
                send(out, ServerMessage::InvalidColor).await?;
                failures += 1;
                if max_attempts.is_some_and(|max| failures >= max) {
                    warn!("Closing login after {} invalid color choices", failures);
                    return Err(AppError::ColorAttemptsExhausted(failures));
                }
            }
        }
    }
}

/// Register, announce, then process commands until the client goes away
async fn run_active<R>(
    lines: &mut LineReader<R>,
    session: &Session,
    registry: &ClientRegistry,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
{
    if !registry.add(session.clone()).await {
        warn!("Session {} was already registered", session.id);
    }
    info!("{} joined ({})", session.username, session.id);

    registry
        .broadcast(
            session.id,
            ServerMessage::Joined {
                username: session.username.clone(),
            },
        )
        .await;
    session
        .send(ServerMessage::Ready {
            color: session.color,
        })
        .await?;

    while let Some(line) = lines.next_line().await? {
        match ClientCommand::parse(&line) {
            ClientCommand::Quit => {
                debug!("{} sent /quit", session.id);
                break;
            }
            ClientCommand::WhoAmI => {
                session
                    .send(ServerMessage::Identity {
                        name: session.colored_name(),
                    })
                    .await?;
            }
            ClientCommand::Online => {
                let listing = online_listing(&registry.snapshot().await, session.id);
                session.send(ServerMessage::Online { listing }).await?;
            }
            ClientCommand::Unknown(command) => {
                debug!("{} sent unknown command {}", session.id, command);
                session.send(ServerMessage::UnknownCommand).await?;
            }
            ClientCommand::Empty => {
                session
                    .send(ServerMessage::Prompt {
                        color: session.color,
                    })
                    .await?;
            }
            ClientCommand::Chat(content) => {
                let delivered = registry
                    .broadcast(
                        session.id,
                        ServerMessage::Chat {
                            from: session.colored_name(),
                            content,
                        },
                    )
                    .await;
                debug!("Chat from {} delivered to {} clients", session.id, delivered);
                session
                    .send(ServerMessage::Prompt {
                        color: session.color,
                    })
                    .await?;
            }
        }
    }

    Ok(())
}

/// Deregister and announce departure; runs once per logged-in session
async fn cleanup(session: &Session, registry: &ClientRegistry) {
    if !registry.remove(session.id).await {
        debug!("Session {} was not registered at cleanup", session.id);
    }
    registry
        .broadcast(
            session.id,
            ServerMessage::Left {
                username: session.username.clone(),
            },
        )
        .await;
    info!("{} left ({})", session.username, session.id);
}

/// `Guest<port>` name for clients that skip the username prompt
fn guest_name(peer_addr: SocketAddr) -> String {
    format!("Guest{}", peer_addr.port())
}

/// Comma-joined colored names, the caller's entry marked "(You)"
fn online_listing(sessions: &[Session], me: ClientId) -> String {
    sessions
        .iter()
        .map(|s| {
            if s.id == me {
                format!("{} (You)", s.colored_name())
            } else {
                s.colored_name()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

async fn send(out: &mpsc::Sender<ServerMessage>, msg: ServerMessage) -> Result<(), SendError> {
    out.send(msg).await.map_err(|_| SendError::ChannelClosed)
}

/// Drain the outbound queue onto the socket until every sender is dropped
async fn write_loop<W>(mut writer: W, mut rx: mpsc::Receiver<ServerMessage>, client_id: ClientId)
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = rx.recv().await {
        let rendered = msg.render();
        if let Err(e) = writer.write_all(rendered.as_bytes()).await {
            debug!("Write to {} failed: {}", client_id, e);
            break;
        }
        if let Err(e) = writer.flush().await {
            debug!("Flush to {} failed: {}", client_id, e);
            break;
        }
    }
    debug!("Write task ended for {}", client_id);

    // Senders blocked on a full queue fail fast from here on
    drop(rx);
    let _ = writer.shutdown().await;
}

/// Newline-delimited input, decoded lossily and trimmed
struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Next trimmed line, or `None` at end of stream
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).trim().to_string()))
    }

    /// Like `next_line`, but end of stream is `AppError::Disconnected`
    async fn require_line(&mut self) -> Result<String, AppError> {
        self.next_line().await?.ok_or(AppError::Disconnected)
    }
}
