use log::trace;

use crate::enums::{C1Handling, C1Transmission, Separator, State, StringKind};
use crate::event::{EventSink, ParserEvent};
use crate::options::ParserOptions;
use crate::transitions::{self, Action};

/// Maximum number of CSI/DCS parameters retained per sequence.
pub const MAX_CSI_PARAMS: usize = 16;

/// Maximum number of intermediate bytes retained per sequence.
pub const MAX_CSI_INTERMEDIATES: usize = 4;

/// Largest representable parameter value.
pub const MAX_CSI_PARAM_VALUE: u16 = 65_535;

/// DCS passthrough chunks are flushed as `DcsPut` events once the internal
/// buffer reaches this many bytes.
pub const DCS_FLUSH_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
struct Intermediates {
    items: [u8; MAX_CSI_INTERMEDIATES],
    idx: usize,
}

impl Intermediates {
    fn get(&self) -> &[u8] {
        &self.items[..self.idx]
    }

    /// Returns false when the byte would exceed the cap.
    fn collect(&mut self, byte: u8) -> bool {
        if self.idx == MAX_CSI_INTERMEDIATES {
            return false;
        }

        self.items[self.idx] = byte;
        self.idx += 1;
        true
    }

    fn clear(&mut self) {
        self.idx = 0;
    }
}

#[derive(Debug)]
struct Params {
    values: [u16; MAX_CSI_PARAMS],
    separators: [Separator; MAX_CSI_PARAMS],
    len: usize,
    current: u32,
    pending_sep: Separator,
    /// True once a digit or separator was consumed; an empty list still
    /// dispatches a single default parameter.
    any: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            values: [0; MAX_CSI_PARAMS],
            separators: [Separator::Semicolon; MAX_CSI_PARAMS],
            len: 0,
            current: 0,
            pending_sep: Separator::Semicolon,
            any: false,
        }
    }
}

impl Params {
    /// Consume a parameter byte. Returns false on overflow of either the
    /// parameter count or the parameter value, which cancels the sequence.
    fn put(&mut self, byte: u8) -> bool {
        match byte {
            b'0'..=b'9' => {
                if self.len == MAX_CSI_PARAMS {
                    return false;
                }

                self.any = true;
                self.current =
                    self.current * 10 + u32::from(byte - b'0');
                self.current <= u32::from(MAX_CSI_PARAM_VALUE)
            },
            b';' | b':' => {
                if self.len == MAX_CSI_PARAMS {
                    return false;
                }

                self.any = true;
                self.values[self.len] = self.current as u16;
                self.separators[self.len] = self.pending_sep;
                self.len += 1;
                self.current = 0;
                self.pending_sep = if byte == b':' {
                    Separator::Colon
                } else {
                    Separator::Semicolon
                };
                true
            },
            _ => true,
        }
    }

    /// Finalize the in-progress parameter for dispatch. An empty list is
    /// presented as a single default `0`; a separator always opens the next
    /// parameter, so `1;` dispatches as `[1, 0]`.
    fn finish(&mut self) {
        if self.len < MAX_CSI_PARAMS && (self.any || self.len == 0) {
            self.values[self.len] = self.current as u16;
            self.separators[self.len] = self.pending_sep;
            self.len += 1;
        }

        self.current = 0;
        self.any = false;
    }

    fn values(&self) -> &[u16] {
        &self.values[..self.len]
    }

    fn separators(&self) -> &[Separator] {
        &self.separators[..self.len]
    }

    fn clear(&mut self) {
        self.len = 0;
        self.current = 0;
        self.pending_sep = Separator::Semicolon;
        self.any = false;
    }
}

/// OSC and SOS/PM/APC accumulator with a byte cap. Exceeding the cap cancels
/// the string: accumulation stops and the eventual terminator dispatches
/// nothing.
#[derive(Debug, Default)]
struct StringAccumulator {
    buffer: Vec<u8>,
    limit: usize,
    cancelled: bool,
}

impl StringAccumulator {
    fn begin(&mut self, limit: usize) {
        self.buffer.clear();
        self.limit = limit;
        self.cancelled = false;
    }

    fn put(&mut self, byte: u8) {
        if self.cancelled {
            return;
        }

        if self.buffer.len() == self.limit {
            self.cancelled = true;
            self.buffer.clear();
            return;
        }

        self.buffer.push(byte);
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.buffer.clear();
    }
}

/// DCS passthrough buffer. Payload is flushed as `DcsPut` chunks at
/// [`DCS_FLUSH_THRESHOLD`]; total payload is capped, and reaching the cap
/// flushes what was accumulated and suppresses the eventual `DcsUnhook`.
#[derive(Debug, Default)]
struct DcsBuffer {
    buffer: Vec<u8>,
    total: usize,
    limit: usize,
    overflowed: bool,
}

impl DcsBuffer {
    fn begin(&mut self, limit: usize) {
        self.buffer.clear();
        self.total = 0;
        self.limit = limit;
        self.overflowed = false;
    }

    fn put<S: EventSink>(&mut self, byte: u8, sink: &mut S) {
        if self.overflowed {
            return;
        }

        if self.total == self.limit {
            self.overflowed = true;
            self.flush(sink);
            return;
        }

        self.buffer.push(byte);
        self.total += 1;

        if self.buffer.len() >= DCS_FLUSH_THRESHOLD {
            self.flush(sink);
        }
    }

    fn flush<S: EventSink>(&mut self, sink: &mut S) {
        if !self.buffer.is_empty() {
            sink.accept(ParserEvent::DcsPut(&self.buffer));
            self.buffer.clear();
        }
    }
}

/// The VT500 parser state machine.
///
/// Feed bytes with [`Parser::write`]; events are delivered synchronously to
/// the provided sink. The parser never suspends mid-call and [`Parser::reset`]
/// is the only way to abandon partial state.
#[derive(Debug, Default)]
pub struct Parser {
    state: State,
    options: ParserOptions,
    /// Runtime toggle mirroring the interpreter's C1 transmission mode; when
    /// set together with `accept_eight_bit_controls`, 8-bit introducers are
    /// honored regardless of the configured policy.
    eight_bit_introducers: bool,
    intermediates: Intermediates,
    params: Params,
    prefix: Option<u8>,
    /// Set when an ESC-sequence overflows its intermediates; the final byte
    /// is then swallowed without dispatch.
    esc_overflow: bool,
    osc: StringAccumulator,
    string: StringAccumulator,
    string_kind: StringKind,
    dcs: DcsBuffer,
    /// ESC observed inside a string state; the next byte decides between
    /// `ESC \` (string terminator) and breaking out of the string.
    esc_pending: bool,
    /// Continuation bytes still expected by an in-flight UTF-8 sequence in
    /// the current print or OSC run; such bytes bypass C1 interpretation.
    utf8_remaining: u8,
}

impl Parser {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Current state, exposed for tests and diagnostics.
    pub fn state(&self) -> State {
        self.state
    }

    /// Mirror the interpreter's C1 transmission mode. In 8-bit mode the
    /// parser honors 0x9B/0x9D/0x90 and the other single-byte introducers
    /// (when the configuration accepts 8-bit controls at all); in 7-bit mode
    /// those bytes follow the configured C1 policy.
    pub fn set_c1_transmission_mode(&mut self, mode: C1Transmission) {
        self.eight_bit_introducers = self.options.accept_eight_bit_controls
            && mode == C1Transmission::EightBit;
    }

    /// Return to ground and drop all partial sequence state. Configuration
    /// and the transmission toggle are kept.
    pub fn reset(&mut self) {
        trace!("parser reset");
        self.state = State::Ground;
        self.clear_sequence();
        self.osc.cancel();
        self.string.cancel();
        self.dcs.begin(0);
        self.esc_pending = false;
        self.utf8_remaining = 0;
    }

    /// Consume a chunk of bytes, emitting events into `sink`. The pending
    /// print run is flushed before any other event and at end of call.
    pub fn write<S: EventSink>(&mut self, input: &[u8], sink: &mut S) {
        let mut print_run: Option<usize> = None;
        let mut idx = 0;

        while idx < input.len() {
            let byte = input[idx];

            if self.state == State::Ground && self.is_print_byte(byte) {
                if print_run.is_none() {
                    print_run = Some(idx);
                }
                self.track_utf8(byte);
                idx += 1;
                continue;
            }

            if let Some(start) = print_run.take() {
                sink.accept(ParserEvent::Print(&input[start..idx]));
            }

            self.step(byte, sink);
            idx += 1;
        }

        if let Some(start) = print_run.take() {
            sink.accept(ParserEvent::Print(&input[start..]));
        }
    }

    /// Whether a byte extends the current print run in ground state.
    fn is_print_byte(&self, byte: u8) -> bool {
        match byte {
            0x20..=0x7e => true,
            0xa0..=0xff => true,
            // C1 range doubles as UTF-8 continuation space; shield the
            // bytes an in-flight multibyte sequence is still expecting.
            0x80..=0x9f => self.utf8_remaining > 0,
            _ => false,
        }
    }

    fn track_utf8(&mut self, byte: u8) {
        match byte {
            0xc2..=0xdf => self.utf8_remaining = 1,
            0xe0..=0xef => self.utf8_remaining = 2,
            0xf0..=0xf4 => self.utf8_remaining = 3,
            0x80..=0xbf => {
                self.utf8_remaining = self.utf8_remaining.saturating_sub(1)
            },
            _ => self.utf8_remaining = 0,
        }
    }

    fn set_state(&mut self, next: State) {
        if next != self.state {
            self.utf8_remaining = 0;
        }
        self.state = next;
    }

    fn step<S: EventSink>(&mut self, byte: u8, sink: &mut S) {
        match self.state {
            State::OscString => self.osc_byte(byte, sink),
            State::SosPmApcString => self.string_byte(byte, sink),
            State::DcsPassthrough => self.passthrough_byte(byte, sink),
            State::DcsIgnore => self.dcs_ignore_byte(byte, sink),
            _ if (0x80..=0x9f).contains(&byte) => self.c1_byte(byte, sink),
            // Printable GR bytes have no meaning inside sequences.
            _ if byte >= 0xa0 => {},
            _ => self.table_byte(byte, sink),
        }
    }

    fn table_byte<S: EventSink>(&mut self, byte: u8, sink: &mut S) {
        // Any control or sequence byte breaks an in-flight multibyte run.
        self.utf8_remaining = 0;

        let (mut next, action) = transitions::transit(self.state, byte);

        match action {
            Action::None | Action::Ignore => {},
            Action::Print => {
                // Reached only for bytes reprocessed after a string broke;
                // ground runs are coalesced in `write`.
                let run = [byte];
                sink.accept(ParserEvent::Print(&run));
            },
            Action::Execute => sink.accept(ParserEvent::Execute(byte)),
            Action::Collect => {
                if !self.intermediates.collect(byte) {
                    next = match next {
                        State::DcsIntermediate => State::DcsIgnore,
                        State::EscapeIntermediate => {
                            self.esc_overflow = true;
                            State::EscapeIntermediate
                        },
                        _ => State::CsiIgnore,
                    };
                }
            },
            Action::Prefix => self.prefix = Some(byte),
            Action::Param => {
                if !self.params.put(byte) {
                    next = match next {
                        State::DcsParam => State::DcsIgnore,
                        _ => State::CsiIgnore,
                    };
                }
            },
            Action::EscDispatch => {
                if !self.esc_overflow {
                    sink.accept(ParserEvent::EscDispatch {
                        intermediates: self.intermediates.get(),
                        byte,
                    });
                }
            },
            Action::CsiDispatch => {
                self.params.finish();
                sink.accept(ParserEvent::CsiDispatch {
                    prefix: self.prefix,
                    params: self.params.values(),
                    separators: self.params.separators(),
                    intermediates: self.intermediates.get(),
                    byte,
                });
            },
            Action::DcsHook => {
                self.params.finish();
                sink.accept(ParserEvent::DcsHook {
                    params: self.params.values(),
                    intermediates: self.intermediates.get(),
                    byte,
                });
                self.dcs.begin(self.options.string_limits.dcs);
                self.esc_pending = false;
            },
        }

        if next != self.state {
            self.enter(next, byte);
        }
        self.set_state(next);
    }

    /// Entry bookkeeping for states reached through the transition table.
    fn enter(&mut self, next: State, byte: u8) {
        match next {
            State::Escape | State::CsiEntry | State::DcsEntry => {
                self.clear_sequence();
            },
            State::OscString => {
                self.osc.begin(self.options.string_limits.osc);
                self.esc_pending = false;
            },
            State::SosPmApcString => {
                self.string.begin(self.options.string_limits.sos_pm_apc);
                self.string_kind = match byte {
                    0x58 | 0x98 => StringKind::Sos,
                    0x5e | 0x9e => StringKind::Pm,
                    _ => StringKind::Apc,
                };
                self.esc_pending = false;
            },
            _ => {},
        }
    }

    fn clear_sequence(&mut self) {
        self.intermediates.clear();
        self.params.clear();
        self.prefix = None;
        self.esc_overflow = false;
    }

    /// Apply the effective C1 policy to a 0x80–0x9F byte outside the string
    /// states.
    fn c1_byte<S: EventSink>(&mut self, byte: u8, sink: &mut S) {
        self.utf8_remaining = 0;

        let handling = if self.eight_bit_introducers {
            C1Handling::Spec
        } else {
            self.options.c1_handling
        };

        match handling {
            C1Handling::Spec => self.c1_spec(byte, sink),
            C1Handling::Escaped => {
                self.set_state(State::Escape);
                self.clear_sequence();
                self.step(byte - 0x40, sink);
            },
            C1Handling::Execute => {
                self.set_state(State::Ground);
                sink.accept(ParserEvent::Execute(byte));
            },
            C1Handling::Ignore => sink.accept(ParserEvent::Ignore(byte)),
        }
    }

    /// The ECMA-48 action map for C1 controls.
    fn c1_spec<S: EventSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            0x9b => {
                self.clear_sequence();
                self.set_state(State::CsiEntry);
            },
            0x9d => {
                self.osc.begin(self.options.string_limits.osc);
                self.esc_pending = false;
                self.set_state(State::OscString);
            },
            0x90 => {
                self.clear_sequence();
                self.set_state(State::DcsEntry);
            },
            0x98 | 0x9e | 0x9f => {
                self.string.begin(self.options.string_limits.sos_pm_apc);
                self.string_kind = match byte {
                    0x98 => StringKind::Sos,
                    0x9e => StringKind::Pm,
                    _ => StringKind::Apc,
                };
                self.esc_pending = false;
                self.set_state(State::SosPmApcString);
            },
            // Stray string terminator.
            0x9c => self.set_state(State::Ground),
            _ => {
                self.set_state(State::Ground);
                sink.accept(ParserEvent::EscDispatch {
                    intermediates: &[],
                    byte: byte - 0x40,
                });
            },
        }
    }

    fn osc_byte<S: EventSink>(&mut self, byte: u8, sink: &mut S) {
        if self.esc_pending {
            self.esc_pending = false;
            self.finish_osc(sink);

            if byte == b'\\' {
                self.set_state(State::Ground);
            } else {
                // ESC terminates the string; the byte restarts a sequence.
                self.set_state(State::Escape);
                self.clear_sequence();
                self.step(byte, sink);
            }
            return;
        }

        match byte {
            0x07 => {
                self.finish_osc(sink);
                self.set_state(State::Ground);
            },
            0x1b => self.esc_pending = true,
            0x18 | 0x1a => {
                self.osc.cancel();
                self.set_state(State::Ground);
                sink.accept(ParserEvent::Execute(byte));
            },
            0x00..=0x1f => {},
            0x20..=0x7f => {
                self.utf8_remaining = 0;
                self.osc.put(byte);
            },
            0xc2..=0xf4 => {
                self.track_utf8(byte);
                self.osc.put(byte);
            },
            0x80..=0x9f if self.utf8_remaining == 0 => {
                if byte == 0x9c {
                    self.finish_osc(sink);
                    self.set_state(State::Ground);
                } else {
                    // A C1 control terminates the command and is then
                    // interpreted on its own.
                    self.finish_osc(sink);
                    self.set_state(State::Ground);
                    self.c1_byte(byte, sink);
                }
            },
            _ => {
                self.track_utf8(byte);
                self.osc.put(byte);
            },
        }
    }

    fn finish_osc<S: EventSink>(&mut self, sink: &mut S) {
        if !self.osc.cancelled {
            sink.accept(ParserEvent::OscDispatch(&self.osc.buffer));
        }
        self.osc.cancel();
    }

    fn string_byte<S: EventSink>(&mut self, byte: u8, sink: &mut S) {
        if self.esc_pending {
            self.esc_pending = false;
            self.finish_string(sink);

            if byte == b'\\' {
                self.set_state(State::Ground);
            } else {
                self.set_state(State::Escape);
                self.clear_sequence();
                self.step(byte, sink);
            }
            return;
        }

        match byte {
            0x1b => self.esc_pending = true,
            0x18 | 0x1a => {
                self.string.cancel();
                self.set_state(State::Ground);
                sink.accept(ParserEvent::Execute(byte));
            },
            0x9c => {
                self.finish_string(sink);
                self.set_state(State::Ground);
            },
            0x00..=0x1f => {},
            _ => self.string.put(byte),
        }
    }

    fn finish_string<S: EventSink>(&mut self, sink: &mut S) {
        if !self.string.cancelled {
            sink.accept(ParserEvent::SosPmApcDispatch {
                kind: self.string_kind,
                data: &self.string.buffer,
            });
        }
        self.string.cancel();
    }

    fn passthrough_byte<S: EventSink>(&mut self, byte: u8, sink: &mut S) {
        if self.esc_pending {
            self.esc_pending = false;

            if byte == b'\\' {
                self.finish_dcs(sink);
                self.set_state(State::Ground);
            } else {
                // Broken string: flush payload, suppress the unhook.
                self.dcs.flush(sink);
                self.set_state(State::Escape);
                self.clear_sequence();
                self.step(byte, sink);
            }
            return;
        }

        match byte {
            0x1b => self.esc_pending = true,
            0x18 | 0x1a => {
                self.dcs.flush(sink);
                self.set_state(State::Ground);
                sink.accept(ParserEvent::Execute(byte));
            },
            0x9c => {
                self.finish_dcs(sink);
                self.set_state(State::Ground);
            },
            0x7f => {},
            _ => self.dcs.put(byte, sink),
        }
    }

    fn finish_dcs<S: EventSink>(&mut self, sink: &mut S) {
        self.dcs.flush(sink);
        if !self.dcs.overflowed {
            sink.accept(ParserEvent::DcsUnhook);
        }
    }

    fn dcs_ignore_byte<S: EventSink>(&mut self, byte: u8, sink: &mut S) {
        if self.esc_pending {
            self.esc_pending = false;

            if byte == b'\\' {
                self.set_state(State::Ground);
            } else {
                self.set_state(State::Escape);
                self.clear_sequence();
                self.step(byte, sink);
            }
            return;
        }

        match byte {
            0x1b => self.esc_pending = true,
            0x18 | 0x1a | 0x9c => self.set_state(State::Ground),
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBuf;
    use crate::options::StringLimits;

    #[derive(Default)]
    struct CollectingSink {
        events: Vec<EventBuf>,
    }

    impl EventSink for CollectingSink {
        fn accept(&mut self, event: ParserEvent<'_>) {
            self.events.push(event.into());
        }
    }

    fn parse_with(options: ParserOptions, bytes: &[u8]) -> Vec<EventBuf> {
        let mut parser = Parser::new(options);
        let mut sink = CollectingSink::default();
        parser.write(bytes, &mut sink);
        sink.events
    }

    fn parse(bytes: &[u8]) -> Vec<EventBuf> {
        parse_with(ParserOptions::default(), bytes)
    }

    fn csi(
        prefix: Option<u8>,
        params: &[u16],
        separators: &[Separator],
        intermediates: &[u8],
        byte: u8,
    ) -> EventBuf {
        EventBuf::CsiDispatch {
            prefix,
            params: params.to_vec(),
            separators: separators.to_vec(),
            intermediates: intermediates.to_vec(),
            byte,
        }
    }

    fn merge_prints(events: Vec<EventBuf>) -> Vec<EventBuf> {
        let mut out: Vec<EventBuf> = Vec::new();
        for event in events {
            if let EventBuf::Print(cur) = &event {
                if let Some(EventBuf::Print(prev)) = out.last_mut() {
                    prev.extend_from_slice(cur);
                    continue;
                }
            }
            out.push(event);
        }
        out
    }

    #[test]
    fn parses_printable_ascii_with_sgr() {
        assert_eq!(
            parse(b"test\x07\x1b[32mmy\x1b[0mparser"),
            vec![
                EventBuf::Print(b"test".to_vec()),
                EventBuf::Execute(0x07),
                csi(None, &[32], &[Separator::Semicolon], &[], b'm'),
                EventBuf::Print(b"my".to_vec()),
                csi(None, &[0], &[Separator::Semicolon], &[], b'm'),
                EventBuf::Print(b"parser".to_vec()),
            ]
        );
    }

    #[test]
    fn print_run_flushes_at_end_of_write() {
        assert_eq!(parse(b"yo"), vec![EventBuf::Print(b"yo".to_vec())]);
    }

    #[test]
    fn print_run_keeps_utf8_continuations_in_c1_range() {
        // U+20AC has a continuation byte (0x82) inside the C1 range.
        assert_eq!(
            parse("€".as_bytes()),
            vec![EventBuf::Print(vec![0xe2, 0x82, 0xac])]
        );
    }

    #[test]
    fn osc_with_bel_terminator() {
        assert_eq!(
            parse(b"\x1b]0;hello\x07"),
            vec![EventBuf::OscDispatch(b"0;hello".to_vec())]
        );
    }

    #[test]
    fn osc_with_c1_st() {
        assert_eq!(
            parse(b"\x1b]0;there\x9c"),
            vec![EventBuf::OscDispatch(b"0;there".to_vec())]
        );
    }

    #[test]
    fn osc_with_escaped_st_consumes_both_bytes() {
        assert_eq!(
            parse(b"\x1b]woot\x1b\\after"),
            vec![
                EventBuf::OscDispatch(b"woot".to_vec()),
                EventBuf::Print(b"after".to_vec()),
            ]
        );
    }

    #[test]
    fn osc_broken_by_escape_sequence_still_dispatches() {
        assert_eq!(
            parse(b"\x1b]title\x1bM"),
            vec![
                EventBuf::OscDispatch(b"title".to_vec()),
                EventBuf::EscDispatch {
                    intermediates: vec![],
                    byte: b'M'
                },
            ]
        );
    }

    #[test]
    fn osc_utf8_payload() {
        assert_eq!(
            parse("\x1b]\u{af}\x07".as_bytes()),
            vec![EventBuf::OscDispatch("\u{af}".as_bytes().to_vec())]
        );
    }

    #[test]
    fn osc_cancelled_by_can() {
        assert_eq!(
            parse(b"\x1b]0;junk\x18x"),
            vec![EventBuf::Execute(0x18), EventBuf::Print(b"x".to_vec())]
        );
    }

    #[test]
    fn osc_over_limit_is_dropped() {
        let options = ParserOptions {
            string_limits: StringLimits {
                osc: 4,
                ..StringLimits::default()
            },
            ..ParserOptions::default()
        };

        assert_eq!(parse_with(options, b"\x1b]12345\x07"), vec![]);
        assert_eq!(
            parse_with(options, b"\x1b]1234\x07"),
            vec![EventBuf::OscDispatch(b"1234".to_vec())]
        );
    }

    #[test]
    fn csi_private_prefix() {
        assert_eq!(
            parse(b"\x1b[?1l"),
            vec![csi(
                Some(b'?'),
                &[1],
                &[Separator::Semicolon],
                &[],
                b'l'
            )]
        );
    }

    #[test]
    fn csi_duplicate_prefix_is_ignored() {
        assert_eq!(parse(b"\x1b[?<1h"), vec![]);
    }

    #[test]
    fn csi_empty_params_dispatch_single_default() {
        assert_eq!(
            parse(b"\x1b[m"),
            vec![csi(None, &[0], &[Separator::Semicolon], &[], b'm')]
        );
    }

    #[test]
    fn csi_omitted_params() {
        assert_eq!(
            parse(b"\x1b[;1m"),
            vec![csi(
                None,
                &[0, 1],
                &[Separator::Semicolon, Separator::Semicolon],
                &[],
                b'm'
            )]
        );
        assert_eq!(
            parse(b"\x1b[1;m"),
            vec![csi(
                None,
                &[1, 0],
                &[Separator::Semicolon, Separator::Semicolon],
                &[],
                b'm'
            )]
        );
    }

    #[test]
    fn csi_colon_subparameters() {
        assert_eq!(
            parse(b"\x1b[4:3m"),
            vec![csi(
                None,
                &[4, 3],
                &[Separator::Semicolon, Separator::Colon],
                &[],
                b'm'
            )]
        );
    }

    #[test]
    fn csi_colon_rgb() {
        use Separator::{Colon, Semicolon};

        assert_eq!(
            parse(b"\x1b[38:2::128:64:192m"),
            vec![csi(
                None,
                &[38, 2, 0, 128, 64, 192],
                &[Semicolon, Colon, Colon, Colon, Colon, Colon],
                &[],
                b'm'
            )]
        );
    }

    #[test]
    fn csi_intermediates() {
        assert_eq!(
            parse(b"\x1b[1 p"),
            vec![csi(None, &[1], &[Separator::Semicolon], &[b' '], b'p')]
        );
    }

    #[test]
    fn csi_too_many_intermediates_cancels() {
        assert_eq!(parse(b"\x1b[1 !\"#$p"), vec![]);
    }

    #[test]
    fn csi_too_many_params_cancels() {
        let mut input = b"\x1b[1".to_vec();
        for n in 2..=17 {
            input.extend_from_slice(format!(";{n}").as_bytes());
        }
        input.push(b'm');

        assert_eq!(parse(&input), vec![]);
    }

    #[test]
    fn csi_sixteen_params_fit() {
        let mut input = b"\x1b[1".to_vec();
        for n in 2..=16 {
            input.extend_from_slice(format!(";{n}").as_bytes());
        }
        input.push(b'm');

        let expected: Vec<u16> = (1..=16).collect();
        match &parse(&input)[..] {
            [EventBuf::CsiDispatch { params, .. }] => {
                assert_eq!(params, &expected);
            },
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn csi_param_value_overflow_cancels() {
        assert_eq!(parse(b"\x1b[65536m"), vec![]);
        match &parse(b"\x1b[65535m")[..] {
            [EventBuf::CsiDispatch { params, .. }] => {
                assert_eq!(params, &[65_535]);
            },
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn csi_param_after_intermediate_cancels() {
        assert_eq!(parse(b"\x1b[1 2p"), vec![]);
    }

    #[test]
    fn can_cancels_csi_without_dispatch() {
        assert_eq!(
            parse(b"\x1b[12\x18m"),
            vec![EventBuf::Execute(0x18), EventBuf::Print(b"m".to_vec())]
        );
    }

    #[test]
    fn esc_restarts_csi() {
        assert_eq!(
            parse(b"\x1b[1\x1b[2m"),
            vec![csi(None, &[2], &[Separator::Semicolon], &[], b'm')]
        );
    }

    #[test]
    fn del_inside_csi_is_ignored() {
        assert_eq!(
            parse(b"\x1b[1\x7fm"),
            vec![csi(None, &[1], &[Separator::Semicolon], &[], b'm')]
        );
    }

    #[test]
    fn esc_dispatch_with_intermediates() {
        assert_eq!(
            parse(b"\x1b(B"),
            vec![EventBuf::EscDispatch {
                intermediates: vec![b'('],
                byte: b'B'
            }]
        );
        assert_eq!(
            parse(b"\x1b#8"),
            vec![EventBuf::EscDispatch {
                intermediates: vec![b'#'],
                byte: b'8'
            }]
        );
    }

    #[test]
    fn dcs_hook_put_unhook() {
        assert_eq!(
            parse(b"\x1bP1;2qhello\x1b\\"),
            vec![
                EventBuf::DcsHook {
                    params: vec![1, 2],
                    intermediates: vec![],
                    byte: b'q'
                },
                EventBuf::DcsPut(b"hello".to_vec()),
                EventBuf::DcsUnhook,
            ]
        );
    }

    #[test]
    fn dcs_omitted_param() {
        assert_eq!(
            parse(b"\x1bP;1q\x1b\\"),
            vec![
                EventBuf::DcsHook {
                    params: vec![0, 1],
                    intermediates: vec![],
                    byte: b'q'
                },
                EventBuf::DcsUnhook,
            ]
        );
    }

    #[test]
    fn dcs_flushes_at_threshold() {
        let mut input = b"\x1bPq".to_vec();
        input.extend(std::iter::repeat(b'x').take(DCS_FLUSH_THRESHOLD + 10));
        input.extend_from_slice(b"\x1b\\");

        let events = parse(&input);
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[1],
            EventBuf::DcsPut(chunk) if chunk.len() == DCS_FLUSH_THRESHOLD
        ));
        assert!(matches!(&events[2], EventBuf::DcsPut(chunk) if chunk.len() == 10));
        assert_eq!(events[3], EventBuf::DcsUnhook);
    }

    #[test]
    fn dcs_over_limit_flushes_cap_and_suppresses_unhook() {
        let options = ParserOptions {
            string_limits: StringLimits {
                dcs: 8,
                ..StringLimits::default()
            },
            ..ParserOptions::default()
        };

        let events = parse_with(options, b"\x1bPq0123456789AB\x1b\\next");
        let put_total: usize = events
            .iter()
            .filter_map(|event| match event {
                EventBuf::DcsPut(chunk) => Some(chunk.len()),
                _ => None,
            })
            .sum();

        assert_eq!(put_total, 8);
        assert!(!events.contains(&EventBuf::DcsUnhook));
        assert_eq!(events.last(), Some(&EventBuf::Print(b"next".to_vec())));
    }

    #[test]
    fn dcs_can_flushes_without_unhook() {
        assert_eq!(
            parse(b"\x1bPqpartial\x18"),
            vec![
                EventBuf::DcsHook {
                    params: vec![0],
                    intermediates: vec![],
                    byte: b'q'
                },
                EventBuf::DcsPut(b"partial".to_vec()),
                EventBuf::Execute(0x18),
            ]
        );
    }

    #[test]
    fn dcs_malformed_goes_to_ignore() {
        // A private marker after parameters is malformed; everything until
        // ST is swallowed.
        assert_eq!(
            parse(b"\x1bP1;2?junk\x1b\\ok"),
            vec![EventBuf::Print(b"ok".to_vec())]
        );
    }

    #[test]
    fn sos_pm_apc_dispatch() {
        assert_eq!(
            parse(b"\x1bXdata\x1b\\"),
            vec![EventBuf::SosPmApcDispatch {
                kind: StringKind::Sos,
                data: b"data".to_vec()
            }]
        );
        assert_eq!(
            parse(b"\x1b^pm\x9c"),
            vec![EventBuf::SosPmApcDispatch {
                kind: StringKind::Pm,
                data: b"pm".to_vec()
            }]
        );
        assert_eq!(
            parse(b"\x1b_app\x1b\\"),
            vec![EventBuf::SosPmApcDispatch {
                kind: StringKind::Apc,
                data: b"app".to_vec()
            }]
        );
    }

    #[test]
    fn sos_over_limit_is_dropped() {
        let options = ParserOptions {
            string_limits: StringLimits {
                sos_pm_apc: 2,
                ..StringLimits::default()
            },
            ..ParserOptions::default()
        };

        assert_eq!(parse_with(options, b"\x1bXlong\x1b\\"), vec![]);
    }

    #[test]
    fn c1_spec_introducers() {
        assert_eq!(
            parse(&[0x9b, b'A']),
            vec![csi(None, &[0], &[Separator::Semicolon], &[], b'A')]
        );
        assert_eq!(
            parse(b"\x9d0;x\x9c"),
            vec![EventBuf::OscDispatch(b"0;x".to_vec())]
        );
        assert_eq!(
            parse(&[0x90, b'q', b'z', 0x9c]),
            vec![
                EventBuf::DcsHook {
                    params: vec![0],
                    intermediates: vec![],
                    byte: b'q'
                },
                EventBuf::DcsPut(b"z".to_vec()),
                EventBuf::DcsUnhook,
            ]
        );
    }

    #[test]
    fn c1_spec_maps_controls_to_escapes() {
        assert_eq!(
            parse(&[0x84]),
            vec![EventBuf::EscDispatch {
                intermediates: vec![],
                byte: b'D'
            }]
        );
        assert_eq!(
            parse(&[0x8d]),
            vec![EventBuf::EscDispatch {
                intermediates: vec![],
                byte: b'M'
            }]
        );
        assert_eq!(
            parse(&[0x88]),
            vec![EventBuf::EscDispatch {
                intermediates: vec![],
                byte: b'H'
            }]
        );
    }

    #[test]
    fn c1_escaped_policy_rewrites() {
        let options = ParserOptions {
            c1_handling: C1Handling::Escaped,
            ..ParserOptions::default()
        };

        // The byte is replayed as `ESC [`, then `A` dispatches.
        assert_eq!(
            parse_with(options, &[0x9b, b'A']),
            vec![csi(None, &[0], &[Separator::Semicolon], &[], b'A')]
        );
        assert_eq!(
            parse_with(options, &[0x84]),
            vec![EventBuf::EscDispatch {
                intermediates: vec![],
                byte: b'D'
            }]
        );
    }

    #[test]
    fn c1_execute_policy() {
        let options = ParserOptions {
            c1_handling: C1Handling::Execute,
            ..ParserOptions::default()
        };

        assert_eq!(
            parse_with(options, &[0x9b, b'A']),
            vec![EventBuf::Execute(0x9b), EventBuf::Print(b"A".to_vec())]
        );
    }

    #[test]
    fn c1_ignore_policy() {
        let options = ParserOptions {
            c1_handling: C1Handling::Ignore,
            ..ParserOptions::default()
        };

        assert_eq!(
            parse_with(options, &[0x9b, b'A']),
            vec![EventBuf::Ignore(0x9b), EventBuf::Print(b"A".to_vec())]
        );
    }

    #[test]
    fn transmission_mode_toggles_introducers() {
        let options = ParserOptions {
            c1_handling: C1Handling::Ignore,
            ..ParserOptions::default()
        };
        let mut parser = Parser::new(options);
        let mut sink = CollectingSink::default();

        parser.set_c1_transmission_mode(C1Transmission::EightBit);
        parser.write(&[0x9b, b'A'], &mut sink);
        assert_eq!(
            sink.events,
            vec![csi(None, &[0], &[Separator::Semicolon], &[], b'A')]
        );

        sink.events.clear();
        parser.set_c1_transmission_mode(C1Transmission::SevenBit);
        parser.write(&[0x9b, b'A'], &mut sink);
        assert_eq!(
            sink.events,
            vec![EventBuf::Ignore(0x9b), EventBuf::Print(b"A".to_vec())]
        );
    }

    #[test]
    fn state_is_reachable_and_reset_returns_to_ground() {
        let mut parser = Parser::new(ParserOptions::default());
        let mut sink = CollectingSink::default();

        parser.write(b"\x1b[1;2", &mut sink);
        assert_eq!(parser.state(), State::CsiParam);

        parser.reset();
        assert_eq!(parser.state(), State::Ground);

        // The partial sequence is gone: new input parses from scratch.
        sink.events.clear();
        parser.write(b"3m", &mut sink);
        assert_eq!(sink.events, vec![EventBuf::Print(b"3m".to_vec())]);
    }

    #[test]
    fn writes_are_chunk_invariant() {
        let inputs: &[&[u8]] = &[
            b"plain text\x1b[1;31mred\x1b[0m\r\n",
            b"\x1b]0;title\x07body\x1bP1q\xaa\xbb\x1b\\tail",
            "h\u{e9}llo w\u{f6}rld \u{20ac}\u{1f600}".as_bytes(),
            &[0x9b, b'2', b'J', 0x84, b'x', 0x9d, b'0', 0x9c],
            b"\x1b[38:2::1:2:3m\x1b[?25l\x1bXsos\x1b\\",
        ];

        for input in inputs {
            let whole = merge_prints(parse(input));

            for split in 1..input.len() {
                let mut parser = Parser::new(ParserOptions::default());
                let mut sink = CollectingSink::default();
                parser.write(&input[..split], &mut sink);
                parser.write(&input[split..], &mut sink);

                assert_eq!(
                    merge_prints(sink.events),
                    whole,
                    "split at {split} of {input:?}"
                );
            }
        }
    }
}
