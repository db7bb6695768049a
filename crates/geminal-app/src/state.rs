//! Observable session state types.
//!
//! [`Phase`] is the coarse view of a [`crate::Session`] used by the renderer
//! and by tests; [`Prompt`] is the validated text handed to inference.

use std::fmt;

/// Coarse session phase, derived from the session fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Empty input buffer, no request outstanding.
    Idle,
    /// Non-empty input buffer, no request outstanding.
    Editing,
    /// A request is outstanding. Input is frozen.
    Pending,
    /// Terminal. No further transitions.
    Closed,
}

/// Trimmed, non-empty prompt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Trim `raw` and wrap it. `None` if nothing remains after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() { None } else { Some(Self(trimmed.to_string())) }
    }

    /// Prompt text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the owned text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_trimmed() {
        let prompt = Prompt::new("  hello world \t\n");
        assert_eq!(prompt.as_ref().map(Prompt::as_str), Some("hello world"));
    }

    #[test]
    fn blank_prompt_is_rejected() {
        assert!(Prompt::new("").is_none());
        assert!(Prompt::new(" \t \r\n").is_none());
    }
}
