//! Runtime façade: one parser plus one interpreter.
//!
//! Bytes from the host shell go through [`Runtime::write_bytes`]; host UI
//! events go through [`Runtime::dispatch_event`]. Both return the same
//! terminal-update stream, with `response` updates carrying bytes for the
//! transport. The runtime also keeps the parser's C1 handling in sync with
//! the interpreter's transmission mode.

mod events;
mod keys;
mod pointer;

use log::debug;
use rtty_term::{
    CapabilityOptions, CapsError, Interpreter, PrinterController, Snapshot,
    TerminalUpdate, resolve,
};
use rtty_vte::{EventBuf, Parser, ParserEvent};

pub use events::{CursorMotion, HostEvent};
pub use keys::{Key, KeyEvent, Modifiers};
pub use pointer::{
    PointerButton, PointerEvent, PointerKind, WheelDirection, WheelEvent,
};

pub struct Runtime {
    parser: Parser,
    interpreter: Interpreter,
    /// Held pointer buttons, for motion gating and release coding.
    buttons_down: u8,
}

impl Runtime {
    /// Build a runtime from capability options.
    pub fn new(options: &CapabilityOptions) -> Result<Self, CapsError> {
        let (parser_options, features) = resolve(options)?;

        let mut parser = Parser::new(parser_options);
        parser.set_c1_transmission_mode(features.default_c1_transmission);

        Ok(Self {
            parser,
            interpreter: Interpreter::new(features),
            buttons_down: 0,
        })
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        self.interpreter.snapshot()
    }

    pub fn set_printer(&mut self, printer: Box<dyn PrinterController>) {
        self.interpreter.set_printer(printer);
    }

    /// Feed host-shell text.
    pub fn write(&mut self, text: &str) -> Vec<TerminalUpdate> {
        self.write_bytes(text.as_bytes())
    }

    /// Feed raw host-shell bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Vec<TerminalUpdate> {
        let interpreter = &mut self.interpreter;
        let mut updates = Vec::new();

        self.parser.write(bytes, &mut |event: ParserEvent<'_>| {
            updates.extend(interpreter.handle_event(event));
        });

        self.sync_c1(&updates);
        updates
    }

    /// Inject a single parser event, bypassing the byte parser.
    pub fn dispatch_parser_event(
        &mut self,
        event: &EventBuf,
    ) -> Vec<TerminalUpdate> {
        let updates = self.interpreter.handle_event(event.as_event());
        self.sync_c1(&updates);
        updates
    }

    pub fn dispatch_parser_events(
        &mut self,
        events: &[EventBuf],
    ) -> Vec<TerminalUpdate> {
        let updates = self
            .interpreter
            .handle_events(events.iter().map(EventBuf::as_event));
        self.sync_c1(&updates);
        updates
    }

    /// Reset parser and interpreter to their capability defaults.
    pub fn reset(&mut self) {
        self.parser.reset();
        self.interpreter.reset();
        self.buttons_down = 0;
    }

    /// Dispatch a host event, returning the resulting updates.
    pub fn dispatch_event(&mut self, event: HostEvent) -> Vec<TerminalUpdate> {
        match event {
            HostEvent::Key(key) => {
                let bytes = {
                    let snapshot = self.interpreter.snapshot();
                    keys::encode(&key, snapshot.modes)
                };
                response(bytes)
            },
            HostEvent::Text(text) => response(text.into_bytes()),
            HostEvent::Paste(text) => self.paste(&text),
            HostEvent::Pointer(pointer) => {
                let tracking = self.interpreter.snapshot().pointer;
                let bytes = pointer::encode_pointer(
                    &pointer,
                    tracking,
                    &mut self.buttons_down,
                );
                bytes.map_or_else(Vec::new, response)
            },
            HostEvent::Wheel(wheel) => {
                let tracking = self.interpreter.snapshot().pointer;
                pointer::encode_wheel(&wheel, tracking)
                    .map_or_else(Vec::new, response)
            },
            HostEvent::Focus => self.focus_report(b'I'),
            HostEvent::Blur => self.focus_report(b'O'),
            HostEvent::CursorMove { motion, options } => {
                let interpreter = &mut self.interpreter;
                match motion {
                    CursorMotion::Left => interpreter.move_cursor_left(&options),
                    CursorMotion::Right => {
                        interpreter.move_cursor_right(&options)
                    },
                    CursorMotion::Up => interpreter.move_cursor_up(&options),
                    CursorMotion::Down => interpreter.move_cursor_down(&options),
                    CursorMotion::LineStart => {
                        interpreter.move_cursor_line_start(&options)
                    },
                    CursorMotion::LineEnd => {
                        interpreter.move_cursor_line_end(&options)
                    },
                    CursorMotion::WordLeft => {
                        interpreter.move_cursor_word_left(&options)
                    },
                    CursorMotion::WordRight => {
                        interpreter.move_cursor_word_right(&options)
                    },
                }
            },
            HostEvent::CursorSet { position, options } => {
                self.interpreter.move_cursor_to(position, &options)
            },
            HostEvent::SelectionSet(selection) => {
                self.interpreter.set_selection(selection)
            },
            HostEvent::SelectionUpdate(selection) => {
                self.interpreter.update_selection(selection)
            },
            HostEvent::SelectionClear => self.interpreter.clear_selection(),
            HostEvent::SelectionReplace(edit) => {
                self.interpreter.edit_selection(edit)
            },
            HostEvent::Resize { rows, columns } => {
                self.interpreter.resize(rows, columns)
            },
            HostEvent::Reset => {
                self.reset();
                Vec::new()
            },
            HostEvent::ParserDispatch(event) => {
                self.dispatch_parser_event(&event)
            },
            HostEvent::ParserBatch(events) => {
                self.dispatch_parser_events(&events)
            },
            HostEvent::RendererConfigure | HostEvent::ProfileUpdate => {
                debug!("host event ignored by the core");
                Vec::new()
            },
        }
    }

    /// Bracketed paste wraps a parser write of the payload in the
    /// 200~/201~ markers; otherwise the payload is written directly.
    fn paste(&mut self, text: &str) -> Vec<TerminalUpdate> {
        let bracketed = self.interpreter.snapshot().modes.bracketed_paste;
        if !bracketed {
            return self.write(text);
        }

        let mut updates = response(b"\x1b[200~".to_vec());
        updates.extend(self.write(text));
        updates.extend(response(b"\x1b[201~".to_vec()));
        updates
    }

    fn focus_report(&self, final_byte: u8) -> Vec<TerminalUpdate> {
        if self.interpreter.snapshot().modes.focus_reporting {
            response(vec![0x1b, b'[', final_byte])
        } else {
            Vec::new()
        }
    }

    /// Forward C1 transmission changes to the parser so introducer
    /// recognition matches the interpreter.
    fn sync_c1(&mut self, updates: &[TerminalUpdate]) {
        for update in updates {
            if let TerminalUpdate::C1Transmission { width } = update {
                self.parser.set_c1_transmission_mode((*width).into());
            }
        }
    }
}

fn response(bytes: Vec<u8>) -> Vec<TerminalUpdate> {
    if bytes.is_empty() {
        Vec::new()
    } else {
        vec![TerminalUpdate::Response { bytes }]
    }
}
