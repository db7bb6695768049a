//! SSH channel driver.
//!
//! Implements the [`Driver`] trait for one SSH session channel. Input events
//! arrive from the connection handler through an unbounded queue; output is
//! written back to the channel through a russh [`Handle`].
//!
//! Two output modes:
//! - **full screen** (client requested a pty): every render clears the screen
//!   and redraws the whole view with CRLF line endings
//! - **line mode** (no pty, e.g. piped stdin or `exec`): the banner once, the
//!   reply block once per completed request, then the closing lines

use geminal_app::{BANNER, Driver, Session, SessionEvent, render, render_closing, render_reply};
use russh::{ChannelId, CryptoVec, server::Handle};
use thiserror::Error;
use tokio::sync::mpsc;

/// Cursor home followed by erase display.
const CLEAR_SCREEN: &[u8] = b"\x1b[H\x1b[2J";

/// SSH driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// The channel is gone; nothing more can be written.
    #[error("channel {0:?} closed")]
    ChannelClosed(ChannelId),
}

/// Frame a rendered view for a pty: clear, then redraw with CRLF endings.
pub fn frame_full_screen(view: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(CLEAR_SCREEN.len() + view.len() + 16);
    out.extend_from_slice(CLEAR_SCREEN);
    for (i, line) in view.split('\n').enumerate() {
        if i > 0 {
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(line.as_bytes());
    }
    out
}

/// Output tracking for clients without a pty.
///
/// Appends to what the client already has instead of redrawing: the banner on
/// the first render, each reply as it completes, and the closing lines once.
#[derive(Debug, Default)]
pub struct LineWriter {
    banner_written: bool,
    awaiting_reply: bool,
    closing_written: bool,
}

impl LineWriter {
    /// Create a writer that has written nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to write for this render, if any.
    pub fn next_output(&mut self, session: &Session) -> Option<String> {
        if self.closing_written {
            return None;
        }

        let mut out = String::new();
        if !self.banner_written {
            self.banner_written = true;
            out.push_str(BANNER);
            out.push_str("\n\n");
        }

        // An interrupt closes the session with the request still outstanding.
        let pending = session.pending_prompt().is_some();
        let completed = self.awaiting_reply && !pending;
        self.awaiting_reply = pending;
        if completed && session.terminal_error().is_none() {
            out.push_str(&render_reply(session).unwrap_or_default());
        }

        if let Some(closing) = render_closing(session) {
            self.closing_written = true;
            out.push_str(&closing);
        }

        (!out.is_empty()).then_some(out)
    }
}

/// Driver for one SSH session channel.
pub struct SshDriver {
    handle: Handle,
    channel: ChannelId,
    input: mpsc::UnboundedReceiver<SessionEvent>,
    full_screen: bool,
    lines: LineWriter,
}

impl SshDriver {
    /// Create a driver writing to `channel`.
    pub fn new(
        handle: Handle,
        channel: ChannelId,
        input: mpsc::UnboundedReceiver<SessionEvent>,
        full_screen: bool,
    ) -> Self {
        Self { handle, channel, input, full_screen, lines: LineWriter::new() }
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), TerminalError> {
        self.handle
            .data(self.channel, CryptoVec::from_slice(bytes))
            .await
            .map_err(|_| TerminalError::ChannelClosed(self.channel))
    }
}

impl Driver for SshDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self) -> Option<SessionEvent> {
        self.input.recv().await
    }

    async fn render(&mut self, session: &Session) -> Result<(), Self::Error> {
        if self.full_screen {
            let bytes = frame_full_screen(&render(session));
            return self.write(&bytes).await;
        }

        match self.lines.next_output(session) {
            Some(text) => self.write(text.as_bytes()).await,
            None => Ok(()),
        }
    }

    async fn close(&mut self, exit_status: u32) -> Result<(), Self::Error> {
        if self.full_screen {
            // Leave the cursor on a fresh line for the client's shell.
            self.write(b"\r\n").await?;
        }

        let closed = || TerminalError::ChannelClosed(self.channel);
        self.handle.exit_status_request(self.channel, exit_status).await.map_err(|_| closed())?;
        self.handle.eof(self.channel).await.map_err(|_| closed())?;
        self.handle.close(self.channel).await.map_err(|_| closed())
    }
}
