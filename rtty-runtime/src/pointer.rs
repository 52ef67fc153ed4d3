//! Pointer report encoding, per the xterm conventions.
//!
//! Buttons are coded 0/1/2 with release as 3 in the legacy encoding, +32
//! marks motion, 64..=67 are the wheel directions, and the modifier mask
//! adds shift=4, alt=8, ctrl=16. The default encoding saturates at
//! coordinate 223; the UTF-8 extension stretches to 2015 with two-byte
//! coordinates; SGR reports are textual and unbounded.

use rtty_term::{PointerEncoding, PointerMode, PointerTracking};

use crate::keys::Modifiers;

/// Largest reportable coordinate in the default encoding.
const DEFAULT_MAX_COORD: usize = 223 - 33;

/// Largest reportable coordinate in the UTF-8 encoding.
const UTF8_MAX_COORD: usize = 2015 - 33;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

impl PointerButton {
    fn code(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Middle => 1,
            Self::Right => 2,
        }
    }

    fn bit(self) -> u8 {
        1 << self.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Press,
    Release,
    Move,
}

/// A pointer event in grid coordinates (zero based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub button: Option<PointerButton>,
    pub row: usize,
    pub column: usize,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
    Left,
    Right,
}

impl WheelDirection {
    fn code(self) -> u8 {
        match self {
            Self::Up => 64,
            Self::Down => 65,
            Self::Left => 66,
            Self::Right => 67,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelEvent {
    pub direction: WheelDirection,
    pub row: usize,
    pub column: usize,
    pub modifiers: Modifiers,
}

fn modifier_mask(modifiers: Modifiers) -> u8 {
    let mut mask = 0;
    if modifiers.contains(Modifiers::SHIFT) {
        mask += 4;
    }
    if modifiers.contains(Modifiers::ALT) || modifiers.contains(Modifiers::META)
    {
        mask += 8;
    }
    if modifiers.contains(Modifiers::CTRL) {
        mask += 16;
    }
    mask
}

/// Encode a button event. `buttons_down` tracks held buttons across calls
/// so motion gating and release codes work without host bookkeeping.
pub(crate) fn encode_pointer(
    event: &PointerEvent,
    tracking: PointerTracking,
    buttons_down: &mut u8,
) -> Option<Vec<u8>> {
    if tracking.mode == PointerMode::Off {
        return None;
    }

    match event.kind {
        PointerKind::Press => {
            let button = event.button?;
            *buttons_down |= button.bit();

            // X10 reports carry no modifiers.
            let mods = if tracking.mode == PointerMode::X10 {
                0
            } else {
                modifier_mask(event.modifiers)
            };
            report(tracking.encoding, button.code() + mods, event, true)
        },
        PointerKind::Release => {
            let button = event.button?;
            *buttons_down &= !button.bit();

            if tracking.mode == PointerMode::X10 {
                return None;
            }

            let mods = modifier_mask(event.modifiers);
            match tracking.encoding {
                // SGR keeps the real button and flags the release.
                PointerEncoding::Sgr => report(
                    tracking.encoding,
                    button.code() + mods,
                    event,
                    false,
                ),
                _ => report(tracking.encoding, 3 + mods, event, true),
            }
        },
        PointerKind::Move => {
            match tracking.mode {
                PointerMode::X10 => return None,
                PointerMode::Normal | PointerMode::Button => {
                    if *buttons_down == 0 {
                        return None;
                    }
                },
                PointerMode::Any => {},
                PointerMode::Off => unreachable!(),
            }

            let button_code = held_button_code(*buttons_down);
            let mods = modifier_mask(event.modifiers);
            report(tracking.encoding, button_code + 32 + mods, event, true)
        },
    }
}

/// Encode a wheel event; wheel reports fire in every non-off mode.
pub(crate) fn encode_wheel(
    event: &WheelEvent,
    tracking: PointerTracking,
) -> Option<Vec<u8>> {
    if tracking.mode == PointerMode::Off {
        return None;
    }

    let mods = if tracking.mode == PointerMode::X10 {
        0
    } else {
        modifier_mask(event.modifiers)
    };

    let probe = PointerEvent {
        kind: PointerKind::Press,
        button: None,
        row: event.row,
        column: event.column,
        modifiers: event.modifiers,
    };
    report(tracking.encoding, event.direction.code() + mods, &probe, true)
}

/// The lowest held button, or 3 when none is pressed (motion with no
/// buttons in any-event mode).
fn held_button_code(buttons_down: u8) -> u8 {
    for code in 0..3 {
        if buttons_down & (1 << code) != 0 {
            return code;
        }
    }
    3
}

fn report(
    encoding: PointerEncoding,
    code: u8,
    event: &PointerEvent,
    press: bool,
) -> Option<Vec<u8>> {
    match encoding {
        PointerEncoding::Sgr => {
            let suffix = if press { 'M' } else { 'm' };
            Some(
                format!(
                    "\x1b[<{};{};{}{}",
                    code,
                    event.column + 1,
                    event.row + 1,
                    suffix
                )
                .into_bytes(),
            )
        },
        PointerEncoding::Default => {
            if event.column > DEFAULT_MAX_COORD || event.row > DEFAULT_MAX_COORD
            {
                return None;
            }
            Some(vec![
                0x1b,
                b'[',
                b'M',
                32 + code,
                33 + event.column as u8,
                33 + event.row as u8,
            ])
        },
        PointerEncoding::Utf8 => {
            if event.column > UTF8_MAX_COORD || event.row > UTF8_MAX_COORD {
                return None;
            }
            let mut bytes = vec![0x1b, b'[', b'M', 32 + code];
            push_utf8_coord(&mut bytes, event.column);
            push_utf8_coord(&mut bytes, event.row);
            Some(bytes)
        },
    }
}

/// Two-byte coordinate extension for positions at 95 and beyond.
fn push_utf8_coord(bytes: &mut Vec<u8>, coord: usize) {
    let value = 33 + coord;
    if coord < 95 {
        bytes.push(value as u8);
    } else {
        bytes.push(0xc0 + (value / 64) as u8);
        bytes.push(0x80 + (value & 63) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracking(mode: PointerMode, encoding: PointerEncoding) -> PointerTracking {
        PointerTracking { mode, encoding }
    }

    fn press(row: usize, column: usize) -> PointerEvent {
        PointerEvent {
            kind: PointerKind::Press,
            button: Some(PointerButton::Left),
            row,
            column,
            modifiers: Modifiers::empty(),
        }
    }

    #[test]
    fn default_encoding_press_and_release() {
        let tracking =
            tracking(PointerMode::Normal, PointerEncoding::Default);
        let mut held = 0;

        let bytes =
            encode_pointer(&press(0, 0), tracking, &mut held).unwrap();
        assert_eq!(bytes, vec![0x1b, b'[', b'M', 32, 33, 33]);
        assert_eq!(held, 1);

        let release = PointerEvent {
            kind: PointerKind::Release,
            ..press(0, 0)
        };
        let bytes = encode_pointer(&release, tracking, &mut held).unwrap();
        assert_eq!(bytes, vec![0x1b, b'[', b'M', 32 + 3, 33, 33]);
        assert_eq!(held, 0);
    }

    #[test]
    fn default_encoding_saturates_at_223() {
        let tracking =
            tracking(PointerMode::Normal, PointerEncoding::Default);
        let mut held = 0;
        assert!(encode_pointer(&press(0, 400), tracking, &mut held).is_none());
    }

    #[test]
    fn sgr_reports_are_textual() {
        let tracking = tracking(PointerMode::Normal, PointerEncoding::Sgr);
        let mut held = 0;

        let bytes =
            encode_pointer(&press(4, 9), tracking, &mut held).unwrap();
        assert_eq!(bytes, b"\x1b[<0;10;5M");

        let release = PointerEvent {
            kind: PointerKind::Release,
            ..press(4, 9)
        };
        let bytes = encode_pointer(&release, tracking, &mut held).unwrap();
        assert_eq!(bytes, b"\x1b[<0;10;5m");
    }

    #[test]
    fn modifier_masks() {
        let tracking = tracking(PointerMode::Normal, PointerEncoding::Sgr);
        let mut held = 0;
        let event = PointerEvent {
            modifiers: Modifiers::SHIFT | Modifiers::CTRL,
            ..press(0, 0)
        };

        let bytes = encode_pointer(&event, tracking, &mut held).unwrap();
        assert_eq!(bytes, b"\x1b[<20;1;1M");
    }

    #[test]
    fn x10_mode_reports_presses_only_without_modifiers() {
        let tracking = tracking(PointerMode::X10, PointerEncoding::Default);
        let mut held = 0;

        let event = PointerEvent {
            modifiers: Modifiers::CTRL,
            ..press(0, 0)
        };
        let bytes = encode_pointer(&event, tracking, &mut held).unwrap();
        assert_eq!(bytes[3], 32);

        let release = PointerEvent {
            kind: PointerKind::Release,
            ..press(0, 0)
        };
        assert!(encode_pointer(&release, tracking, &mut held).is_none());

        let motion = PointerEvent {
            kind: PointerKind::Move,
            button: None,
            ..press(0, 1)
        };
        assert!(encode_pointer(&motion, tracking, &mut held).is_none());
    }

    #[test]
    fn motion_gating_per_mode() {
        let motion = PointerEvent {
            kind: PointerKind::Move,
            button: None,
            ..press(2, 3)
        };

        // Button mode: only while a button is held.
        let tracking1 =
            tracking(PointerMode::Button, PointerEncoding::Default);
        let mut held = 0;
        assert!(encode_pointer(&motion, tracking1, &mut held).is_none());

        encode_pointer(&press(2, 3), tracking1, &mut held);
        let bytes = encode_pointer(&motion, tracking1, &mut held).unwrap();
        assert_eq!(bytes[3], 32 + 32);

        // Any mode fires without buttons, coded as released motion.
        let tracking2 = tracking(PointerMode::Any, PointerEncoding::Default);
        let mut held = 0;
        let bytes = encode_pointer(&motion, tracking2, &mut held).unwrap();
        assert_eq!(bytes[3], 32 + 32 + 3);
    }

    #[test]
    fn wheel_codes() {
        let tracking = tracking(PointerMode::Normal, PointerEncoding::Sgr);
        let event = WheelEvent {
            direction: WheelDirection::Up,
            row: 0,
            column: 0,
            modifiers: Modifiers::empty(),
        };
        assert_eq!(
            encode_wheel(&event, tracking).unwrap(),
            b"\x1b[<64;1;1M"
        );

        let event = WheelEvent {
            direction: WheelDirection::Right,
            ..event
        };
        assert_eq!(
            encode_wheel(&event, tracking).unwrap(),
            b"\x1b[<67;1;1M"
        );
    }

    #[test]
    fn utf8_encoding_extends_coordinates() {
        let tracking = tracking(PointerMode::Normal, PointerEncoding::Utf8);
        let mut held = 0;

        // Small coordinates stay single-byte.
        let bytes =
            encode_pointer(&press(0, 10), tracking, &mut held).unwrap();
        assert_eq!(bytes.len(), 6);

        // Past 94 the coordinate takes two bytes.
        let mut held = 0;
        let bytes =
            encode_pointer(&press(0, 150), tracking, &mut held).unwrap();
        let value = 33 + 150;
        assert_eq!(bytes[4], 0xc0 + (value / 64) as u8);
        assert_eq!(bytes[5], 0x80 + (value & 63) as u8);
    }
}
