//! Test-only client harness shared by the handler and server tests.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Scripted chat client over any byte stream
///
/// Output the server sends past a matched needle is kept for the next call,
/// so nothing is lost between expectations.
pub struct TestClient<S> {
    stream: S,
    pending: Vec<u8>,
}

impl<S> TestClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: Vec::new(),
        }
    }

    /// Write one input line
    pub async fn send(&mut self, line: &str) {
        self.stream
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("write to server");
    }

    /// Read until `needle` shows up; returns everything up to and including it
    pub async fn expect(&mut self, needle: &str) -> String {
        let wanted = needle.as_bytes();
        let result = timeout(READ_TIMEOUT, async {
            loop {
                if let Some(pos) = self
                    .pending
                    .windows(wanted.len())
                    .position(|w| w == wanted)
                {
                    let taken: Vec<u8> = self.pending.drain(..pos + wanted.len()).collect();
                    return String::from_utf8_lossy(&taken).into_owned();
                }
                let mut buf = [0u8; 1024];
                let n = self.stream.read(&mut buf).await.expect("read from server");
                assert!(
                    n > 0,
                    "stream closed before {:?}, got {:?}",
                    needle,
                    String::from_utf8_lossy(&self.pending)
                );
                self.pending.extend_from_slice(&buf[..n]);
            }
        })
        .await;
        match result {
            Ok(text) => text,
            Err(_) => panic!(
                "timed out waiting for {:?}, got {:?}",
                needle,
                String::from_utf8_lossy(&self.pending)
            ),
        }
    }

    /// Read until the server closes the stream; returns the remaining output
    pub async fn expect_closed(&mut self) -> String {
        let result = timeout(READ_TIMEOUT, async {
            let mut rest = Vec::new();
            self.stream
                .read_to_end(&mut rest)
                .await
                .expect("read from server");
            rest
        })
        .await
        .expect("timed out waiting for close");
        self.pending.extend_from_slice(&result);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }

    /// Log in as a guest with the given color
    pub async fn login_guest(&mut self, color: &str) {
        self.expect("(1/2): ").await;
        self.send("1").await;
        self.expect("Choose your name color: ").await;
        self.send(color).await;
        self.expect("Type /quit to leave.\n").await;
        self.expect("You > \x1b[0m").await;
    }

    /// Log in with a username and color
    pub async fn login_named(&mut self, name: &str, color: &str) {
        self.expect("(1/2): ").await;
        self.send("2").await;
        self.expect("Enter your username: ").await;
        self.send(name).await;
        self.expect("Choose your name color: ").await;
        self.send(color).await;
        self.expect("Type /quit to leave.\n").await;
        self.expect("You > \x1b[0m").await;
    }
}
