use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// A 24-bit color.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A cell color as resolved by the SGR machine.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Color {
    /// The renderer's default foreground or background.
    #[default]
    Default,
    /// One of the eight base ANSI colors (0..=7).
    Ansi(u8),
    /// One of the eight bright ANSI colors (0..=7).
    AnsiBright(u8),
    /// An entry of the 256-color palette.
    Palette(u8),
    Rgb(Rgb),
}

/// Parse a color specification as found in OSC payloads: the xterm
/// `rgb:<r>/<g>/<b>` form or the legacy `#rgb`/`#rrggbb` form, each
/// component carrying one to four hex digits.
pub(crate) fn xparse_color(spec: &[u8]) -> Option<Rgb> {
    let spec = str::from_utf8(spec).ok()?;

    if let Some(body) = spec.strip_prefix("rgb:") {
        parse_rgb_form(body)
    } else if let Some(body) = spec.strip_prefix('#') {
        parse_legacy_form(body)
    } else {
        None
    }
}

/// `rgb:` components are fractions of their digit range and scale to the
/// full byte range (`rgb:f/ff/fff` is three ways to say 255).
fn parse_rgb_form(body: &str) -> Option<Rgb> {
    let mut parts = body.split('/');

    let mut component = || -> Option<u8> {
        let digits = parts.next()?;
        if digits.is_empty() || digits.len() > 4 {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        let max = (1u32 << (4 * digits.len() as u32)) - 1;
        Some((value * 255 / max) as u8)
    };

    let rgb = Rgb {
        r: component()?,
        g: component()?,
        b: component()?,
    };
    parts.next().is_none().then_some(rgb)
}

/// Legacy components are packed without separators and left-aligned: the
/// leading digits are the significant ones, so `#1af` is (0x10, 0xa0, 0xf0).
fn parse_legacy_form(body: &str) -> Option<Rgb> {
    let width = body.len() / 3;
    if width == 0 || width > 4 || body.len() != width * 3 {
        return None;
    }

    let component = |idx: usize| -> Option<u8> {
        let digits = &body[idx * width..(idx + 1) * width];
        let value = u16::from_str_radix(digits, 16).ok()?;
        // Left-align the value in a 16-bit field and keep the top byte.
        Some((value << (4 * (4 - width)) >> 8) as u8)
    };

    Some(Rgb {
        r: component(0)?,
        g: component(1)?,
        b: component(2)?,
    })
}
