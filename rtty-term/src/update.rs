//! The terminal update stream.
//!
//! Every interpreter call returns an ordered list of updates. Renderers
//! consume the visual variants; `Response` carries bytes for the host
//! transport. Everything in this module derives serde so the transport can
//! pick its own wire profile.

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::cell::Cell;
use crate::color::Rgb;
use crate::selection::Selection;

/// A zero-based cursor position. `column` may equal the column count while
/// a wrap is pending.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// One written cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub row: usize,
    pub column: usize,
    pub cell: Cell,
}

/// What a `clear` update covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClearScope {
    Display,
    DisplayAfterCursor,
    Line,
    LineAfterCursor,
}

/// Modes reported through `mode` updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeName {
    Origin,
    Autowrap,
    ReverseVideo,
    SmoothScroll,
    KeypadApplication,
    CursorKeysApplication,
}

/// Per-row line rendition.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineAttr {
    #[default]
    Single,
    DoubleTop,
    DoubleBottom,
    DoubleWide,
}

/// OSC 52 clipboard notification. The data stays base64 encoded; the
/// clipboard itself lives with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub target: String,
    pub data: String,
}

/// Control-string families surfaced to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlStringKind {
    Sos,
    Pm,
    Apc,
}

impl From<rtty_vte::StringKind> for ControlStringKind {
    fn from(kind: rtty_vte::StringKind) -> Self {
        match kind {
            rtty_vte::StringKind::Sos => Self::Sos,
            rtty_vte::StringKind::Pm => Self::Pm,
            rtty_vte::StringKind::Apc => Self::Apc,
        }
    }
}

/// Control transmission width as it appears on the update stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransmissionWidth {
    SevenBit,
    EightBit,
}

impl From<rtty_vte::C1Transmission> for TransmissionWidth {
    fn from(mode: rtty_vte::C1Transmission) -> Self {
        match mode {
            rtty_vte::C1Transmission::SevenBit => Self::SevenBit,
            rtty_vte::C1Transmission::EightBit => Self::EightBit,
        }
    }
}

impl From<TransmissionWidth> for rtty_vte::C1Transmission {
    fn from(width: TransmissionWidth) -> Self {
        match width {
            TransmissionWidth::SevenBit => Self::SevenBit,
            TransmissionWidth::EightBit => Self::EightBit,
        }
    }
}

/// A single element of the ordered update stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TerminalUpdate {
    Cells { cells: Vec<CellUpdate> },
    Cursor { position: Position },
    Clear { scope: ClearScope },
    /// Rows scrolled within the current scroll region; positive amounts
    /// scroll up (content moves towards the top).
    Scroll { amount: i32 },
    Bell,
    Attributes { attributes: Attributes },
    ScrollRegion { top: usize, bottom: usize },
    Mode { mode: ModeName, value: bool },
    CursorVisibility { visible: bool },
    Osc { identifier: String, data: String },
    Title { title: String },
    Clipboard { entry: ClipboardEntry },
    Palette { index: u8, color: Rgb },
    SelectionSet { selection: Selection },
    SelectionUpdate { selection: Selection },
    SelectionClear,
    C1Transmission { width: TransmissionWidth },
    DcsStart {
        byte: u8,
        params: Vec<u16>,
        intermediates: Vec<u8>,
    },
    DcsData { data: String },
    DcsEnd { data: String },
    SosPmApc {
        control: ControlStringKind,
        data: String,
    },
    /// Bytes for the host transport.
    Response { bytes: Vec<u8> },
    LineAttributes { row: usize, value: LineAttr },
}
