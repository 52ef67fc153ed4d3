//! VT500/ECMA-48 byte parser.
//!
//! The parser turns a stream of arbitrary bytes into typed
//! [`ParserEvent`]s: printable runs, executed controls, and dispatched
//! ESC/CSI/OSC/DCS/SOS/PM/APC sequences. Events are delivered synchronously
//! through an [`EventSink`]; the terminal interpreter consumes them to drive
//! a grid, and the runtime façade wires the two together.

mod classify;
mod enums;
mod event;
mod options;
mod parser;
mod transitions;
mod utf8;

pub use classify::{ByteClass, classify};
pub use enums::{C1Handling, C1Transmission, Separator, State, StringKind};
pub use event::{EventBuf, EventSink, ParserEvent};
pub use options::{ParserOptions, StringLimits};
pub use parser::{
    DCS_FLUSH_THRESHOLD, MAX_CSI_INTERMEDIATES, MAX_CSI_PARAMS,
    MAX_CSI_PARAM_VALUE, Parser,
};
pub use utf8::Utf8Decoder;
