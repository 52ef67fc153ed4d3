use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Underline style selected via SGR 4/21/24.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
}

/// Blink style selected via SGR 5/6/25.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Blink {
    #[default]
    None,
    Slow,
    Rapid,
}

/// The active graphic rendition.
///
/// A value record: cells carry a copy of the attributes that were active
/// when they were written.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub bold: bool,
    pub faint: bool,
    pub italic: bool,
    pub underline: Underline,
    pub blink: Blink,
    pub inverse: bool,
    pub hidden: bool,
    pub strikethrough: bool,
    pub foreground: Color,
    pub background: Color,
}
