//! Session view rendering.
//!
//! [`render`] projects a [`Session`] onto the text shown to the client. It is
//! a pure function: no I/O, no hidden state, same input same output. Lines
//! are separated by `\n`; terminal framing is left to the driver.

use crate::{Phase, Session};

/// First line of every view.
pub const BANNER: &str = "Connected to Gemini via SSH.";

/// Marker in front of the live input line.
pub const PROMPT_MARKER: &str = "> ";

const RESPONSE_HEADER: &str = "--- Gemini Response ---";
const WAITING: &str = "Waiting for response...";
const CLOSE_NOTICE: &str = "Session closed. Reconnect to start a new one.";
const GOODBYE: &str = "Goodbye.";

/// Render the entire session view.
pub fn render(session: &Session) -> String {
    let mut view = String::new();
    push_line(&mut view, BANNER);
    view.push('\n');

    match session.phase() {
        Phase::Closed => {
            if session.terminal_error().is_none() {
                push_output(&mut view, session);
            }
            view.push_str(&render_closing(session).unwrap_or_default());
        },
        Phase::Pending => {
            let prompt = session.pending_prompt().map_or("", |p| p.as_str());
            push_line(&mut view, &format!("{PROMPT_MARKER}{prompt}"));
            push_line(&mut view, WAITING);
        },
        Phase::Idle | Phase::Editing => {
            push_output(&mut view, session);
            view.push_str(PROMPT_MARKER);
            view.push_str(session.buffer());
        },
    }

    view
}

/// Last reply under its header, followed by a blank line.
///
/// `None` before the first reply.
pub fn render_reply(session: &Session) -> Option<String> {
    let output = session.last_output()?;
    Some(format!("{RESPONSE_HEADER}\n{output}\n\n"))
}

/// Final lines of a closed session: the error and reconnect notice, or the
/// goodbye. `None` while the session is open.
pub fn render_closing(session: &Session) -> Option<String> {
    if session.phase() != Phase::Closed {
        return None;
    }
    Some(match session.terminal_error() {
        Some(err) => format!("Error: {err}\n{CLOSE_NOTICE}\n"),
        None => format!("{GOODBYE}\n"),
    })
}

fn push_output(view: &mut String, session: &Session) {
    if let Some(reply) = render_reply(session) {
        view.push_str(&reply);
    }
}

fn push_line(view: &mut String, line: &str) {
    view.push_str(line);
    view.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InferenceError, KeyInput, SessionEvent};

    fn session_with(keys: &str) -> Session {
        let mut session = Session::new();
        for c in keys.chars() {
            let key = if c == '\n' { KeyInput::Enter } else { KeyInput::Char(c) };
            let _ = session.handle(SessionEvent::Key(key));
        }
        session
    }

    #[test]
    fn idle_view_shows_banner_and_marker() {
        let view = render(&Session::new());
        assert_eq!(view, format!("{BANNER}\n\n{PROMPT_MARKER}"));
    }

    #[test]
    fn editing_view_shows_live_buffer() {
        let view = render(&session_with("hel"));
        assert_eq!(view.lines().last(), Some("> hel"));
    }

    #[test]
    fn pending_view_freezes_prompt() {
        let view = render(&session_with("  what is rust \n"));
        assert!(view.contains("> what is rust\n"));
        assert!(view.contains(WAITING));
    }

    #[test]
    fn normal_view_shows_output_then_input_line() {
        let mut session = session_with("hello\n");
        let _ = session.handle(SessionEvent::InferenceCompleted(Ok("Hi there".into())));
        let _ = session.handle(SessionEvent::Key(KeyInput::Char('n')));

        let view = render(&session);
        let lines: Vec<&str> = view.lines().collect();
        assert_eq!(lines, vec![BANNER, "", RESPONSE_HEADER, "Hi there", "", "> n"]);
    }

    #[test]
    fn error_view_shows_error_and_notice() {
        let mut session = session_with("x\n");
        let err = InferenceError::Status { code: 503, body: "overloaded".into() };
        let _ = session.handle(SessionEvent::InferenceCompleted(Err(err)));

        let view = render(&session);
        assert!(view.contains("Error: HTTP 503: overloaded"));
        assert!(view.contains(CLOSE_NOTICE));
        assert!(!view.contains(PROMPT_MARKER));
    }

    #[test]
    fn reply_and_closing_pieces_match_full_view() {
        let mut session = session_with("hello\n");
        assert_eq!(render_reply(&session), None);
        assert_eq!(render_closing(&session), None);

        let _ = session.handle(SessionEvent::InferenceCompleted(Ok("Hi there".into())));
        let _ = session.handle(SessionEvent::Key(KeyInput::EndOfInput));

        let reply = render_reply(&session).unwrap();
        let closing = render_closing(&session).unwrap();
        assert_eq!(reply, format!("{RESPONSE_HEADER}\nHi there\n\n"));
        assert_eq!(closing, format!("{GOODBYE}\n"));
        assert_eq!(render(&session), format!("{BANNER}\n\n{reply}{closing}"));
    }

    #[test]
    fn render_is_pure() {
        let session = session_with("abc");
        assert_eq!(render(&session), render(&session));
    }
}
