//! Line protocol definitions
//!
//! Client input is one trimmed text line, parsed into a `ClientCommand`.
//! Server output is a `ServerMessage`, rendered to the exact bytes an
//! ANSI-capable terminal expects (line clear, colored names, prompt redraw).

use crate::color::{Color, RESET};

/// Clears the client's current input line before a message is drawn over it
pub const CLEAR_LINE: &str = "\r\x1b[K";

/// Prompt shown in front of the client's own input
pub const PROMPT: &str = "You > ";

/// Client → Server input during the active phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `/quit`
    Quit,
    /// `/whoami`
    WhoAmI,
    /// `/online` or `/all`
    Online,
    /// Any other `/`-prefixed input
    Unknown(String),
    /// Blank line
    Empty,
    /// Plain chat text
    Chat(String),
}

impl ClientCommand {
    /// Parse one input line; surrounding whitespace is ignored
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => ClientCommand::Empty,
            "/quit" => ClientCommand::Quit,
            "/whoami" => ClientCommand::WhoAmI,
            "/online" | "/all" => ClientCommand::Online,
            other if other.starts_with('/') => ClientCommand::Unknown(other.to_string()),
            other => ClientCommand::Chat(other.to_string()),
        }
    }
}

/// Server → Client output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Greeting with the guest/username choice
    Welcome,
    /// Asks for a free-form username
    UsernamePrompt,
    /// Lists the palette
    AvailableColors,
    /// Asks for a color name
    ColorPrompt,
    /// Color input matched nothing in the palette
    InvalidColor,
    /// Login finished, first prompt in the user's color
    Ready { color: Color },
    /// Another user logged in
    Joined { username: String },
    /// Another user's session ended
    Left { username: String },
    /// Chat line from another user (`from` is already colored)
    Chat { from: String, content: String },
    /// Reply to `/whoami` (`name` is already colored)
    Identity { name: String },
    /// Reply to `/online`
    Online { listing: String },
    /// Reply to an unrecognized slash command
    UnknownCommand,
    /// Redraws the sender's own colored prompt
    Prompt { color: Color },
}

impl ServerMessage {
    /// Render to the bytes written on the wire
    pub fn render(&self) -> String {
        match self {
            ServerMessage::Welcome => {
                "Welcome to TCP Chat!\nLogin as [1] Guest or [2] Username? (1/2): ".to_string()
            }
            ServerMessage::UsernamePrompt => "Enter your username: ".to_string(),
            ServerMessage::AvailableColors => {
                format!("\nAvailable colors: {}\n", Color::palette_names())
            }
            ServerMessage::ColorPrompt => "Choose your name color: ".to_string(),
            ServerMessage::InvalidColor => "Invalid color. Try again.\n".to_string(),
            ServerMessage::Ready { color } => {
                format!("\nType /quit to leave.\n{}{}{}", color.code(), PROMPT, RESET)
            }
            ServerMessage::Joined { username } => {
                interrupt(&format!("{} joined the chat.\n", username))
            }
            ServerMessage::Left { username } => {
                interrupt(&format!("{} left the chat.\n", username))
            }
            ServerMessage::Chat { from, content } => {
                interrupt(&format!("{} > {}\n", from, content))
            }
            ServerMessage::Identity { name } => reply(&format!("You are: {}", name)),
            ServerMessage::Online { listing } => reply(&format!("Online: {}", listing)),
            ServerMessage::UnknownCommand => reply("Unknown command."),
            ServerMessage::Prompt { color } => format!("\r{}{}{}", color.code(), PROMPT, RESET),
        }
    }
}

/// Broadcast framing: clear the line, print, return to a plain prompt
fn interrupt(text: &str) -> String {
    format!("{}{}\r{}", CLEAR_LINE, text, PROMPT)
}

/// Reply framing for the sender's own commands
fn reply(text: &str) -> String {
    format!("{}{}\n{}", CLEAR_LINE, text, PROMPT)
}
