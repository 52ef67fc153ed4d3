//! Terminal state interpreter.
//!
//! Consumes [`rtty_vte`] parser events and applies them to a grid with
//! cursor, SGR attributes, scroll regions, modes, charsets and selection.
//! Every call returns an ordered list of [`TerminalUpdate`]s for the
//! renderer, including `response` bytes destined for the host transport.
//! Construction starts from resolved capabilities ([`caps::resolve`]).

mod attributes;
mod caps;
mod cell;
mod charset;
mod color;
mod grid;
mod interpreter;
mod modes;
mod printer;
mod selection;
mod update;

pub use attributes::{Attributes, Blink, Underline};
pub use caps::{
    CapabilityOptions, CapsError, Emulator, MIN_COLUMNS, MIN_ROWS,
    TerminalFeatures, TerminalSpec, resolve,
};
pub use cell::Cell;
pub use charset::{Charset, CharsetIndex, Charsets};
pub use color::{Color, Rgb};
pub use grid::{Grid, Row, TabStops};
pub use interpreter::{
    Interpreter, MoveOptions, SelectionEdit, Snapshot,
};
pub use modes::{
    PointerEncoding, PointerMode, PointerTracking, PrinterState,
    TerminalModes,
};
pub use printer::{NoopPrinter, PrinterController};
pub use selection::{
    Selection, SelectionKind, SelectionPoint, SelectionStatus,
};
pub use update::{
    CellUpdate, ClearScope, ClipboardEntry, ControlStringKind, LineAttr,
    ModeName, Position, TerminalUpdate, TransmissionWidth,
};
