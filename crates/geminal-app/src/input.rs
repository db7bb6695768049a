//! Terminal-agnostic keyboard input.
//!
//! SSH clients deliver keystrokes as a raw byte stream. [`InputDecoder`] turns
//! that stream into [`KeyInput`] values so the session state machine never
//! sees bytes, escape sequences, or partial UTF-8.

/// Keyboard input abstraction.
///
/// Decouples session logic from the transport, enabling deterministic
/// simulation testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key (submit).
    Enter,
    /// Backspace key (erase last character).
    Backspace,
    /// Ctrl-C.
    Interrupt,
    /// Ctrl-D.
    EndOfInput,
}

const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const BACKSPACE: u8 = 0x08;
const TAB: u8 = 0x09;
const LF: u8 = 0x0a;
const CR: u8 = 0x0d;
const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;

/// Escape sequence parsing progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Escape {
    #[default]
    None,
    /// Saw `ESC`.
    Start,
    /// Inside `ESC [` (CSI), waiting for a final byte.
    Csi,
    /// Saw `ESC O` (SS3), next byte ends the sequence.
    Ss3,
}

/// Incremental decoder from raw terminal bytes to [`KeyInput`].
///
/// State carries across calls to [`InputDecoder::feed`]: a UTF-8 sequence or
/// escape sequence split between two SSH data packets decodes exactly once.
#[derive(Debug, Default)]
pub struct InputDecoder {
    /// Incomplete UTF-8 sequence from the previous chunk.
    partial: Vec<u8>,
    escape: Escape,
    /// Previous byte was a carriage return (collapses CRLF).
    after_cr: bool,
}

impl InputDecoder {
    /// Create a decoder with no buffered state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk of bytes.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyInput> {
        let mut keys = Vec::new();

        for &byte in bytes {
            if self.consume_escape(byte) {
                continue;
            }

            // Only a continuation byte can extend a pending UTF-8 sequence.
            if !self.partial.is_empty() && !is_continuation(byte) {
                tracing::trace!(bytes = ?self.partial, "dropping truncated UTF-8");
                self.partial.clear();
            }

            if byte >= 0x80 {
                self.after_cr = false;
                self.partial.push(byte);
                match std::str::from_utf8(&self.partial) {
                    Ok(s) => {
                        keys.extend(s.chars().map(KeyInput::Char));
                        self.partial.clear();
                    },
                    Err(e) if e.error_len().is_some() => {
                        tracing::trace!(bytes = ?self.partial, "dropping invalid UTF-8");
                        self.partial.clear();
                    },
                    Err(_) => {},
                }
                continue;
            }

            let was_cr = std::mem::replace(&mut self.after_cr, byte == CR);
            match byte {
                CR => keys.push(KeyInput::Enter),
                LF if was_cr => {},
                LF => keys.push(KeyInput::Enter),
                DEL | BACKSPACE => keys.push(KeyInput::Backspace),
                CTRL_C => keys.push(KeyInput::Interrupt),
                CTRL_D => keys.push(KeyInput::EndOfInput),
                ESC => self.escape = Escape::Start,
                TAB => keys.push(KeyInput::Char('\t')),
                b if b < 0x20 => {},
                b => keys.push(KeyInput::Char(char::from(b))),
            }
        }

        keys
    }

    /// Advance escape-sequence parsing. Returns `true` if `byte` was swallowed.
    ///
    /// Sequences only span printable ASCII. A control or non-ASCII byte aborts
    /// the sequence and is decoded as ordinary input.
    fn consume_escape(&mut self, byte: u8) -> bool {
        if self.escape == Escape::None {
            return false;
        }
        if !(0x20..=0x7e).contains(&byte) {
            self.escape = Escape::None;
            return false;
        }

        self.escape = match self.escape {
            Escape::Start => match byte {
                b'[' => Escape::Csi,
                b'O' => Escape::Ss3,
                _ => Escape::None,
            },
            // Parameter and intermediate bytes continue, 0x40..=0x7e ends.
            Escape::Csi if (0x40..=0x7e).contains(&byte) => Escape::None,
            Escape::Csi => Escape::Csi,
            Escape::Ss3 | Escape::None => Escape::None,
        };
        true
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xc0 == 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<KeyInput> {
        InputDecoder::new().feed(bytes)
    }

    #[test]
    fn printable_ascii() {
        assert_eq!(decode(b"hi"), vec![KeyInput::Char('h'), KeyInput::Char('i')]);
    }

    #[test]
    fn crlf_is_single_enter() {
        assert_eq!(decode(b"a\r\n"), vec![KeyInput::Char('a'), KeyInput::Enter]);
        assert_eq!(decode(b"\n\n"), vec![KeyInput::Enter, KeyInput::Enter]);
    }

    #[test]
    fn crlf_split_across_chunks() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.feed(b"\r"), vec![KeyInput::Enter]);
        assert_eq!(decoder.feed(b"\n"), vec![]);
    }

    #[test]
    fn control_keys() {
        assert_eq!(decode(&[DEL, BACKSPACE]), vec![KeyInput::Backspace, KeyInput::Backspace]);
        assert_eq!(decode(&[CTRL_C]), vec![KeyInput::Interrupt]);
        assert_eq!(decode(&[CTRL_D]), vec![KeyInput::EndOfInput]);
        assert_eq!(decode(&[0x01, 0x1a]), vec![]);
    }

    #[test]
    fn arrow_keys_are_swallowed() {
        assert_eq!(decode(b"\x1b[A\x1b[1;5Cx\x1bOB"), vec![KeyInput::Char('x')]);
    }

    #[test]
    fn escape_split_across_chunks() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.feed(b"\x1b["), vec![]);
        assert_eq!(decoder.feed(b"Dz"), vec![KeyInput::Char('z')]);
    }

    #[test]
    fn utf8_split_across_chunks() {
        let bytes = "é€".as_bytes();
        let mut decoder = InputDecoder::new();
        let mut keys = decoder.feed(&bytes[..1]);
        keys.extend(decoder.feed(&bytes[1..3]));
        keys.extend(decoder.feed(&bytes[3..]));
        assert_eq!(keys, vec![KeyInput::Char('é'), KeyInput::Char('€')]);
    }

    #[test]
    fn truncated_utf8_does_not_eat_control_keys() {
        assert_eq!(decode(&[0xc3, CR]), vec![KeyInput::Enter]);
        assert_eq!(decode(&[0xe2, 0x82, CTRL_C]), vec![KeyInput::Interrupt]);
        assert_eq!(decode(&[0xc3, b'a']), vec![KeyInput::Char('a')]);
    }

    #[test]
    fn truncated_utf8_restarts_on_new_lead_byte() {
        assert_eq!(decode(&[0xe2, 0xc3, 0xa9]), vec![KeyInput::Char('é')]);
    }

    #[test]
    fn control_byte_aborts_escape() {
        assert_eq!(decode(&[ESC, CR]), vec![KeyInput::Enter]);
        assert_eq!(decode(&[ESC, CTRL_C]), vec![KeyInput::Interrupt]);
        assert_eq!(decode(b"\x1b[1;\x03"), vec![KeyInput::Interrupt]);
        assert_eq!(decode(&[ESC, b'O', DEL]), vec![KeyInput::Backspace]);
    }

    #[test]
    fn escape_then_escape_starts_over() {
        assert_eq!(decode(b"\x1b\x1b[Ax"), vec![KeyInput::Char('x')]);
    }

    #[test]
    fn invalid_utf8_is_dropped() {
        assert_eq!(decode(&[0xff, b'a']), vec![KeyInput::Char('a')]);
    }
}
