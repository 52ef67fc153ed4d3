use serde::{Deserialize, Serialize};

use crate::update::Position;

/// One end of a selection, stamped with the host event time that placed it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPoint {
    pub row: usize,
    pub column: usize,
    /// Milliseconds, as reported by the host; opaque to the core.
    pub timestamp: u64,
}

impl SelectionPoint {
    pub fn new(row: usize, column: usize) -> Self {
        Self {
            row,
            column,
            timestamp: 0,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            row: self.row,
            column: self.column,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionKind {
    #[default]
    Normal,
    Rectangular,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionStatus {
    #[default]
    Idle,
    Dragging,
}

/// An active selection between an anchor and a focus point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: SelectionPoint,
    pub focus: SelectionPoint,
    pub kind: SelectionKind,
    pub status: SelectionStatus,
}

impl Selection {
    pub fn new(anchor: SelectionPoint, focus: SelectionPoint) -> Self {
        Self {
            anchor,
            focus,
            kind: SelectionKind::Normal,
            status: SelectionStatus::Idle,
        }
    }

    /// Anchor and focus ordered by (row, column).
    pub fn bounds(&self) -> (Position, Position) {
        let a = self.anchor.position();
        let f = self.focus.position();
        if (a.row, a.column) <= (f.row, f.column) {
            (a, f)
        } else {
            (f, a)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor.position() == self.focus.position()
    }
}
