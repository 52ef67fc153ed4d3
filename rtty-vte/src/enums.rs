/// Parser states following the VT500 state diagram.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    #[default]
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    OscString,
    DcsEntry,
    DcsParam,
    DcsIntermediate,
    DcsIgnore,
    DcsPassthrough,
    SosPmApcString,
}

/// Which control-string family a SOS/PM/APC accumulator belongs to.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    #[default]
    Sos,
    Pm,
    Apc,
}

/// Separator that introduced a CSI/DCS parameter.
///
/// The parameter at index 0 is always reported as semicolon-introduced;
/// colon-introduced parameters are sub-parameters of the preceding field
/// (e.g. the extended SGR color forms).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    #[default]
    Semicolon,
    Colon,
}

/// Policy for 0x80–0x9F bytes observed outside of control strings.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum C1Handling {
    /// Map each C1 control to its ECMA-48 action (CSI, OSC, DCS, string
    /// introducers, or the equivalent two-byte escape dispatch).
    #[default]
    Spec,
    /// Rewrite the byte as `ESC (byte - 0x40)` and reprocess.
    Escaped,
    /// Emit an `Execute` event for the raw byte.
    Execute,
    /// Drop the byte.
    Ignore,
}

/// Control transmission width negotiated with the host.
///
/// In 7-bit mode responses introduce CSI as `ESC [`; in 8-bit mode the
/// single byte 0x9B is used and 8-bit introducers are honored on input.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum C1Transmission {
    #[default]
    SevenBit,
    EightBit,
}
