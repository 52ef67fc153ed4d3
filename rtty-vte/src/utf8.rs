//! Streaming UTF-8 decoding for printable runs.
//!
//! Print runs arrive as raw byte slices and may split a multibyte scalar at
//! any point, including across `write` calls. The decoder keeps the partial
//! sequence between calls; consumers flush it when a control event
//! interrupts a run, which turns a dangling partial into U+FFFD.

use utf8parse::Receiver;

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

#[derive(Default)]
struct Capture {
    decoded: Option<char>,
    invalid: bool,
}

impl Receiver for Capture {
    fn codepoint(&mut self, c: char) {
        self.decoded = Some(c);
    }

    fn invalid_sequence(&mut self) {
        self.invalid = true;
    }
}

/// Incremental UTF-8 decoder with replacement-character error recovery.
///
/// A malformed run produces exactly one U+FFFD; the byte that broke a
/// multibyte sequence is re-examined so that it can start a sequence of its
/// own (or print as ASCII).
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    parser: utf8parse::Parser,
    /// Continuation bytes the in-flight sequence still expects.
    remaining: u8,
    /// Suppresses repeated replacements inside one malformed run.
    in_invalid_run: bool,
}

impl Utf8Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, invoking `out` for every scalar produced.
    pub fn decode(&mut self, bytes: &[u8], out: &mut impl FnMut(char)) {
        for &byte in bytes {
            self.push(byte, out);
        }
    }

    fn push(&mut self, byte: u8, out: &mut impl FnMut(char)) {
        let mut capture = Capture::default();
        self.parser.advance(&mut capture, byte);

        if let Some(c) = capture.decoded {
            self.remaining = 0;
            self.in_invalid_run = false;
            out(c);
            return;
        }

        if capture.invalid {
            let was_mid_sequence = self.remaining > 0;
            self.remaining = 0;

            if !self.in_invalid_run {
                self.in_invalid_run = true;
                out(REPLACEMENT);
            }

            // A non-continuation byte that broke a sequence is re-fed so it
            // is not swallowed by the sequence it terminated.
            if was_mid_sequence && !matches!(byte, 0x80..=0xbf) {
                self.push(byte, out);
            }
            return;
        }

        match byte {
            0xc2..=0xdf => self.remaining = 1,
            0xe0..=0xef => self.remaining = 2,
            0xf0..=0xf4 => self.remaining = 3,
            0x80..=0xbf => {
                self.remaining = self.remaining.saturating_sub(1)
            },
            _ => {},
        }
    }

    /// Convert a dangling partial sequence into U+FFFD. Called when a
    /// control interrupts a print run.
    pub fn flush(&mut self) -> Option<char> {
        self.in_invalid_run = false;
        if self.remaining > 0 {
            self.parser = utf8parse::Parser::default();
            self.remaining = 0;
            return Some(REPLACEMENT);
        }
        None
    }

    /// Drop all partial state.
    pub fn reset(&mut self) {
        self.parser = utf8parse::Parser::default();
        self.remaining = 0;
        self.in_invalid_run = false;
    }
}
