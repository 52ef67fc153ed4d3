//! Host-facing events dispatched into the runtime.

use rtty_term::{MoveOptions, Position, Selection, SelectionEdit};
use rtty_vte::EventBuf;

use crate::keys::KeyEvent;
use crate::pointer::{PointerEvent, WheelEvent};

/// Cursor motions the host can request directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMotion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    WordLeft,
    WordRight,
}

/// Everything the embedding application can feed into
/// [`Runtime::dispatch_event`](crate::Runtime::dispatch_event).
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A key press, translated to bytes for the host transport.
    Key(KeyEvent),
    /// Committed text (e.g. from an IME), sent to the host as-is.
    Text(String),
    /// Pasted text; wrapped in bracketed-paste markers when that mode is
    /// on.
    Paste(String),
    Pointer(PointerEvent),
    Wheel(WheelEvent),
    Focus,
    Blur,
    CursorMove {
        motion: CursorMotion,
        options: MoveOptions,
    },
    CursorSet {
        position: Position,
        options: MoveOptions,
    },
    SelectionSet(Selection),
    SelectionUpdate(Selection),
    SelectionClear,
    SelectionReplace(SelectionEdit),
    Resize {
        rows: usize,
        columns: usize,
    },
    Reset,
    /// Inject a single parser event, bypassing the byte parser.
    ParserDispatch(EventBuf),
    ParserBatch(Vec<EventBuf>),
    /// Renderer concern; ignored by the core.
    RendererConfigure,
    /// Profile concern; ignored by the core.
    ProfileUpdate,
}
