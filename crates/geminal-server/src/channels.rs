//! Per-connection channel bookkeeping.
//!
//! One SSH connection can carry several session channels. [`ChannelTable`]
//! tracks, per channel, the input queue feeding its session runtime, the
//! terminal byte decoder, and whether a pty was requested. It has no russh
//! dependency so the connection handler's logic is testable on its own.

use std::{collections::HashMap, hash::Hash};

use geminal_app::{InputDecoder, KeyInput, SessionEvent};
use tokio::sync::mpsc;

/// Everything a session runtime needs from its channel.
#[derive(Debug)]
pub struct SessionStart {
    /// Input events for this channel, in arrival order.
    pub input: mpsc::UnboundedReceiver<SessionEvent>,
    /// A pty was requested, so the client expects full-screen redraws.
    pub full_screen: bool,
}

#[derive(Debug)]
struct ChannelSlot {
    input: mpsc::UnboundedSender<SessionEvent>,
    /// Receiver half until a shell or exec request starts the session.
    unstarted: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    decoder: InputDecoder,
    pty: bool,
}

/// Open session channels of one connection.
#[derive(Debug)]
pub struct ChannelTable<K> {
    channels: HashMap<K, ChannelSlot>,
}

impl<K> Default for ChannelTable<K> {
    fn default() -> Self {
        Self { channels: HashMap::new() }
    }
}

impl<K: Copy + Eq + Hash + std::fmt::Debug> ChannelTable<K> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened session channel.
    ///
    /// Input arriving before the session starts is queued, not dropped.
    pub fn open(&mut self, id: K) {
        let (input, rx) = mpsc::unbounded_channel();
        let slot =
            ChannelSlot { input, unstarted: Some(rx), decoder: InputDecoder::new(), pty: false };
        if self.channels.insert(id, slot).is_some() {
            tracing::warn!(channel = ?id, "channel reopened, previous session detached");
        }
    }

    /// Record a pty request. Returns `false` for an unknown channel.
    pub fn request_pty(&mut self, id: K) -> bool {
        match self.channels.get_mut(&id) {
            Some(slot) => {
                slot.pty = true;
                true
            },
            None => false,
        }
    }

    /// Hand out the input queue to a new session runtime.
    ///
    /// `None` if the channel is unknown or its session already started.
    pub fn start(&mut self, id: K) -> Option<SessionStart> {
        let slot = self.channels.get_mut(&id)?;
        let input = slot.unstarted.take()?;
        Some(SessionStart { input, full_screen: slot.pty })
    }

    /// Start a one-shot session: `command` is submitted as the prompt and the
    /// session closes once the reply is delivered.
    pub fn start_exec(&mut self, id: K, command: &[u8]) -> Option<SessionStart> {
        let start = self.start(id)?;
        let command = String::from_utf8_lossy(command);
        for c in command.chars() {
            self.push(id, SessionEvent::Key(KeyInput::Char(c)));
        }
        self.push(id, SessionEvent::Key(KeyInput::Enter));
        self.push(id, SessionEvent::InputClosed);
        Some(start)
    }

    /// Decode raw terminal bytes and forward the keys to the session.
    ///
    /// Returns the number of keys forwarded.
    pub fn feed(&mut self, id: K, bytes: &[u8]) -> usize {
        let Some(slot) = self.channels.get_mut(&id) else {
            tracing::trace!(channel = ?id, "data for unknown channel");
            return 0;
        };

        let keys = slot.decoder.feed(bytes);
        let mut forwarded = 0;
        for key in keys {
            if slot.input.send(SessionEvent::Key(key)).is_err() {
                tracing::trace!(channel = ?id, "session gone, dropping input");
                break;
            }
            forwarded += 1;
        }
        forwarded
    }

    /// Forward a non-key event to the session.
    pub fn push(&mut self, id: K, event: SessionEvent) -> bool {
        self.channels.get(&id).is_some_and(|slot| slot.input.send(event).is_ok())
    }

    /// The client sent EOF: the session stops reading input.
    ///
    /// Returns `false` if the channel is unknown or its session is gone.
    pub fn end_input(&mut self, id: K) -> bool {
        self.push(id, SessionEvent::InputClosed)
    }

    /// Forget a closed channel. Its session observes end of input.
    pub fn close(&mut self, id: K) -> bool {
        self.channels.remove(&id).is_some()
    }

    /// Number of open channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channels are open.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
