//! Server configuration
//!
//! Parsed from command line flags, each of which can also come from a
//! `CHAT_*` environment variable.

use clap::Parser;

/// Default listen host (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 1234;

/// Default per-session outbound queue capacity
pub const DEFAULT_OUTBOUND_BUFFER: u32 = 32;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Host or IP address to listen on
    #[arg(long, env = "CHAT_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// TCP port to listen on. Use 0 for an ephemeral port.
    #[arg(long, env = "CHAT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Close a login after this many invalid color choices (unlimited if unset)
    #[arg(
        long,
        env = "CHAT_MAX_COLOR_ATTEMPTS",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_color_attempts: Option<u32>,

    /// Messages queued per client before broadcasts wait for it
    #[arg(
        long,
        env = "CHAT_OUTBOUND_BUFFER",
        default_value_t = DEFAULT_OUTBOUND_BUFFER,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub outbound_buffer: u32,
}

impl ServerConfig {
    /// `host:port` string for binding the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Capacity of each session's outbound queue (always at least 1)
    pub fn outbound_capacity(&self) -> usize {
        self.outbound_buffer.max(1) as usize
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_color_attempts: None,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}
