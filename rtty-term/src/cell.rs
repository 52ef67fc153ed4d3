use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;

/// A single grid cell: one scalar, its attributes, and the DECSCA
/// protection flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub c: char,
    pub attrs: Attributes,
    pub protected: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            c: ' ',
            attrs: Attributes::default(),
            protected: false,
        }
    }
}

impl Cell {
    /// A blank cell carrying the given attributes.
    pub fn blank(attrs: Attributes) -> Self {
        Self {
            c: ' ',
            attrs,
            protected: false,
        }
    }
}
