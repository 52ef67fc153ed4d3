//! Capability resolution.
//!
//! A terminal is described by a DEC spec level, an optional emulator
//! overlay, and explicit overrides. Resolution merges the three (explicit
//! wins over overlay wins over spec) into the parser configuration and the
//! feature record the interpreter is constructed from.

use rtty_vte::{C1Handling, C1Transmission, ParserOptions, StringLimits};
use thiserror::Error;

/// Minimum number of columns; two are needed for anything useful.
pub const MIN_COLUMNS: usize = 2;

/// Minimum number of rows.
pub const MIN_ROWS: usize = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapsError {
    #[error("invalid dimensions {rows}x{columns}; at least {MIN_ROWS}x{MIN_COLUMNS} required")]
    InvalidDimensions { rows: usize, columns: usize },
    #[error("string limit for {name} must be non-zero")]
    InvalidStringLimit { name: &'static str },
}

/// DEC terminal generations.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalSpec {
    Vt100,
    #[default]
    Vt220,
    Vt320,
    Vt420,
    Vt520,
    Vt525,
}

impl TerminalSpec {
    /// The DA1 operating-level identifier (vt220 reports 62 and so on).
    fn level(self) -> u8 {
        match self {
            Self::Vt100 => 61,
            Self::Vt220 => 62,
            Self::Vt320 => 63,
            Self::Vt420 => 64,
            Self::Vt520 | Self::Vt525 => 65,
        }
    }
}

/// Emulator overlays on top of a spec level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emulator {
    Xterm,
    Kitty,
}

/// Construction-time options: spec, overlay, and explicit overrides.
#[derive(Default, Debug, Clone)]
pub struct CapabilityOptions {
    pub spec: Option<TerminalSpec>,
    pub emulator: Option<Emulator>,
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub c1_handling: Option<C1Handling>,
    pub accept_eight_bit_controls: Option<bool>,
    pub osc_limit: Option<usize>,
    pub dcs_limit: Option<usize>,
    pub sos_pm_apc_limit: Option<usize>,
}

/// The resolved feature record consumed by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalFeatures {
    pub rows: usize,
    pub columns: usize,
    pub ansi_colors: bool,
    pub dec_private_modes: bool,
    pub sos_pm_apc: bool,
    pub scroll_regions: bool,
    pub origin_mode: bool,
    pub auto_wrap: bool,
    pub cursor_visibility: bool,
    pub tab_stops: bool,
    pub c1_transmission_toggle: bool,
    pub default_c1_transmission: C1Transmission,
    pub primary_da: String,
    pub secondary_da: String,
    pub nrcs: bool,
    pub column_switch: bool,
    pub bracketed_paste: bool,
    pub pointer_tracking: bool,
}

impl Default for TerminalFeatures {
    fn default() -> Self {
        resolve(&CapabilityOptions::default())
            .expect("default capabilities are valid")
            .1
    }
}

/// Resolve options into a parser configuration and a feature record.
pub fn resolve(
    options: &CapabilityOptions,
) -> Result<(ParserOptions, TerminalFeatures), CapsError> {
    let spec = options.spec.unwrap_or_default();
    let level = spec.level();

    let rows = options.rows.unwrap_or(24);
    let columns = options.columns.unwrap_or(80);
    if rows < MIN_ROWS || columns < MIN_COLUMNS {
        return Err(CapsError::InvalidDimensions { rows, columns });
    }

    let vt220_or_later = !matches!(spec, TerminalSpec::Vt100);

    let mut limits = StringLimits::default();
    let mut accept_eight_bit = vt220_or_later;
    let mut bracketed_paste = false;
    let mut pointer_tracking = false;

    match options.emulator {
        Some(Emulator::Xterm) => {
            limits.osc = 8192;
            limits.dcs = 16_384;
            accept_eight_bit = true;
            bracketed_paste = true;
            pointer_tracking = true;
        },
        Some(Emulator::Kitty) => {
            limits.osc = 65_536;
            limits.dcs = 65_536;
            limits.sos_pm_apc = 8192;
            accept_eight_bit = true;
            bracketed_paste = true;
            pointer_tracking = true;
        },
        None => {},
    }

    // Explicit overrides win, merged key by key.
    if let Some(limit) = options.osc_limit {
        limits.osc = limit;
    }
    if let Some(limit) = options.dcs_limit {
        limits.dcs = limit;
    }
    if let Some(limit) = options.sos_pm_apc_limit {
        limits.sos_pm_apc = limit;
    }
    if limits.osc == 0 {
        return Err(CapsError::InvalidStringLimit { name: "osc" });
    }
    if limits.dcs == 0 {
        return Err(CapsError::InvalidStringLimit { name: "dcs" });
    }
    if limits.sos_pm_apc == 0 {
        return Err(CapsError::InvalidStringLimit { name: "sos_pm_apc" });
    }

    if let Some(accept) = options.accept_eight_bit_controls {
        accept_eight_bit = accept;
    }

    let parser = ParserOptions {
        c1_handling: options.c1_handling.unwrap_or_default(),
        accept_eight_bit_controls: accept_eight_bit,
        string_limits: limits,
    };

    let primary_da = if vt220_or_later {
        format!("?{level};1;2;6;7;8;9c")
    } else {
        "?1;2c".to_string()
    };
    let secondary_da = if vt220_or_later {
        format!(">{level};1;2c")
    } else {
        ">0;1;0c".to_string()
    };

    let features = TerminalFeatures {
        rows,
        columns,
        ansi_colors: true,
        dec_private_modes: true,
        sos_pm_apc: vt220_or_later,
        scroll_regions: true,
        origin_mode: true,
        auto_wrap: true,
        cursor_visibility: true,
        tab_stops: true,
        c1_transmission_toggle: vt220_or_later,
        default_c1_transmission: C1Transmission::SevenBit,
        primary_da,
        secondary_da,
        nrcs: vt220_or_later,
        column_switch: true,
        bracketed_paste,
        pointer_tracking,
    };

    Ok((parser, features))
}
