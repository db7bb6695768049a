//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the SSH driver but over
//! in-memory queues. It implements [`Driver`] so the same
//! [`geminal_app::Runtime`] orchestration code runs in both production and
//! simulation. The test keeps the paired [`SimHandle`] to type input and to
//! observe what the session wrote.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use geminal_app::{Driver, KeyInput, Session, SessionEvent, render};
use tokio::sync::{Notify, mpsc};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Everything the session wrote.
#[derive(Debug, Default)]
struct Recorded {
    frames: Vec<String>,
    events_delivered: usize,
    exit_status: Option<u32>,
    writes_after_close: usize,
}

/// Output side shared between driver and handle.
#[derive(Default)]
struct Shared {
    recorded: Mutex<Recorded>,
    changed: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut Recorded)) {
        f(&mut self.lock());
        self.changed.notify_waiters();
    }
}

/// Simulation driver for deterministic testing.
pub struct SimDriver {
    input: mpsc::UnboundedReceiver<SessionEvent>,
    output: Arc<Shared>,
}

/// Test-side end of a simulated channel.
pub struct SimHandle {
    input: Option<mpsc::UnboundedSender<SessionEvent>>,
    output: Arc<Shared>,
}

/// Create a connected driver and handle pair.
pub fn sim_session() -> (SimDriver, SimHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let output = Arc::new(Shared::default());
    let driver = SimDriver { input: rx, output: Arc::clone(&output) };
    let handle = SimHandle { input: Some(tx), output };
    (driver, handle)
}

impl SimHandle {
    /// Inject a raw event. Ignored after [`SimHandle::disconnect`].
    pub fn send(&self, event: SessionEvent) {
        if let Some(input) = &self.input {
            let _ = input.send(event);
        }
    }

    /// Inject one key.
    pub fn press(&self, key: KeyInput) {
        self.send(SessionEvent::Key(key));
    }

    /// Type `text` one character at a time.
    pub fn type_text(&self, text: &str) {
        for c in text.chars() {
            self.press(KeyInput::Char(c));
        }
    }

    /// Type `text` and press Enter.
    pub fn submit(&self, text: &str) {
        self.type_text(text);
        self.press(KeyInput::Enter);
    }

    /// Drop the input side, as if the client went away.
    pub fn disconnect(&mut self) {
        self.input = None;
    }

    /// All frames rendered so far.
    pub fn frames(&self) -> Vec<String> {
        self.output.lock().frames.clone()
    }

    /// Most recent frame.
    pub fn last_frame(&self) -> Option<String> {
        self.output.lock().frames.last().cloned()
    }

    /// Exit status reported by the session, if it closed itself.
    pub fn exit_status(&self) -> Option<u32> {
        self.output.lock().exit_status
    }

    /// Renders or closes attempted after the session reported its exit.
    pub fn writes_after_close(&self) -> usize {
        self.output.lock().writes_after_close
    }

    /// Input events the runtime has taken off the queue.
    pub fn events_delivered(&self) -> usize {
        self.output.lock().events_delivered
    }

    /// Wait until the runtime has taken at least `n` input events.
    pub async fn wait_for_events(&self, n: usize) {
        loop {
            let notified = self.output.changed.notified();
            let delivered = self.output.lock().events_delivered;
            if delivered >= n {
                return;
            }
            notified.await;
        }
    }

    /// Wait until some rendered frame satisfies `pred`.
    pub async fn wait_for_frame(&self, pred: impl Fn(&str) -> bool) -> String {
        loop {
            let notified = self.output.changed.notified();
            let found = self.output.lock().frames.iter().rev().find(|f| pred(f.as_str())).cloned();
            if let Some(frame) = found {
                return frame;
            }
            notified.await;
        }
    }

    /// Wait until the session reports an exit status.
    pub async fn wait_for_exit(&self) -> u32 {
        loop {
            let notified = self.output.changed.notified();
            let status = self.output.lock().exit_status;
            if let Some(status) = status {
                return status;
            }
            notified.await;
        }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Option<SessionEvent> {
        let event = self.input.recv().await;
        if event.is_some() {
            self.output.update(|recorded| recorded.events_delivered += 1);
        }
        event
    }

    async fn render(&mut self, session: &Session) -> Result<(), Self::Error> {
        let frame = render(session);
        self.output.update(|recorded| {
            if recorded.exit_status.is_some() {
                recorded.writes_after_close += 1;
            }
            recorded.frames.push(frame);
        });
        Ok(())
    }

    async fn close(&mut self, exit_status: u32) -> Result<(), Self::Error> {
        let mut already_closed = false;
        self.output.update(|recorded| match recorded.exit_status {
            Some(_) => {
                recorded.writes_after_close += 1;
                already_closed = true;
            },
            None => recorded.exit_status = Some(exit_status),
        });

        if already_closed {
            return Err(SimDriverError("close after close".to_string()));
        }
        tracing::trace!(exit_status, "sim session closed");
        Ok(())
    }
}
