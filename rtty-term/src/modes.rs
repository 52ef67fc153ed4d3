//! Mode flags and tracking state toggled by SM/RM and the DEC private
//! set/reset sequences.

/// Boolean terminal modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalModes {
    pub origin: bool,
    pub auto_wrap: bool,
    /// LNM: line feed implies carriage return. Remote-shell hosts feed
    /// bare `\n`-terminated text, so this defaults on.
    pub linefeed_newline: bool,
    pub reverse_video: bool,
    pub smooth_scroll: bool,
    pub insert: bool,
    pub cursor_visible: bool,
    pub keypad_application: bool,
    pub cursor_keys_application: bool,
    pub bracketed_paste: bool,
    pub focus_reporting: bool,
}

impl Default for TerminalModes {
    fn default() -> Self {
        Self {
            origin: false,
            auto_wrap: true,
            linefeed_newline: true,
            reverse_video: false,
            smooth_scroll: false,
            insert: false,
            cursor_visible: true,
            keypad_application: false,
            cursor_keys_application: false,
            bracketed_paste: false,
            focus_reporting: false,
        }
    }
}

/// Pointer (mouse) tracking mode, per the xterm lineage.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerMode {
    #[default]
    Off,
    /// Presses only, no modifiers, no releases.
    X10,
    /// Presses and releases.
    Normal,
    /// Presses, releases and motion while a button is held.
    Button,
    /// All events including bare motion.
    Any,
}

/// How pointer reports are encoded on the wire.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEncoding {
    /// Single-byte coordinates, saturating at 223.
    #[default]
    Default,
    /// Two-byte extension for coordinates at 95 and beyond.
    Utf8,
    /// Textual `CSI < b ; x ; y M/m` reports.
    Sgr,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerTracking {
    pub mode: PointerMode,
    pub encoding: PointerEncoding,
}

/// Media-copy state.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterState {
    /// All printable/control traffic is diverted to the printer.
    pub controller: bool,
    /// Completed lines are copied to the printer on line feed.
    pub auto_print: bool,
}
