//! Control sequence dispatch.

use log::debug;
use rtty_vte::{C1Transmission, Separator};

use super::Interpreter;
use crate::attributes::{Blink, Underline};
use crate::color::{Color, Rgb};
use crate::modes::{PointerEncoding, PointerMode};
use crate::update::{ModeName, TerminalUpdate, TransmissionWidth};

/// Numeric parameter with a default for zero/omitted values.
fn arg(params: &[u16], idx: usize, default: usize) -> usize {
    match params.get(idx) {
        None | Some(0) => default,
        Some(&value) => value as usize,
    }
}

pub(super) fn dispatch(
    term: &mut Interpreter,
    prefix: Option<u8>,
    params: &[u16],
    separators: &[Separator],
    intermediates: &[u8],
    byte: u8,
) {
    let intermediate = intermediates.first().copied();

    match (byte, prefix, intermediate) {
        // Cursor motion.
        (b'A', None, None) => {
            term.move_rows(-(arg(params, 0, 1) as isize), false)
        },
        (b'B' | b'e', None, None) => {
            term.move_rows(arg(params, 0, 1) as isize, false)
        },
        (b'C' | b'a', None, None) => {
            term.move_columns(arg(params, 0, 1) as isize)
        },
        (b'D', None, None) => {
            term.move_columns(-(arg(params, 0, 1) as isize))
        },
        (b'E', None, None) => term.move_rows(arg(params, 0, 1) as isize, true),
        (b'F', None, None) => {
            term.move_rows(-(arg(params, 0, 1) as isize), true)
        },
        (b'G' | b'`', None, None) => {
            term.cursor.column =
                (arg(params, 0, 1) - 1).min(term.grid.columns() - 1);
        },
        (b'd', None, None) => {
            let row = arg(params, 0, 1) - 1;
            let column = term.cursor.column.min(term.grid.columns() - 1);
            term.goto(row, column);
        },
        (b'H' | b'f', None, None) => {
            term.goto(arg(params, 0, 1) - 1, arg(params, 1, 1) - 1)
        },

        // Erases.
        (b'J', None, None) => {
            term.erase_in_display(arg(params, 0, 0), false)
        },
        (b'J', Some(b'?'), None) => {
            term.erase_in_display(arg(params, 0, 0), true)
        },
        (b'K', None, None) => term.erase_in_line(arg(params, 0, 0), false),
        (b'K', Some(b'?'), None) => term.erase_in_line(arg(params, 0, 0), true),

        // Structural edits.
        (b'@', None, None) => term.insert_blank_chars(arg(params, 0, 1)),
        (b'P', None, None) => term.delete_chars(arg(params, 0, 1)),
        (b'X', None, None) => term.erase_chars(arg(params, 0, 1)),
        (b'L', None, None) => term.insert_lines(arg(params, 0, 1)),
        (b'M', None, None) => term.delete_lines(arg(params, 0, 1)),
        (b'S', None, None) => term.scroll_up(arg(params, 0, 1)),
        (b'T', None, None) => term.scroll_down(arg(params, 0, 1)),
        (b'b', None, None) => term.repeat_last(arg(params, 0, 1)),

        // Tabs.
        (b'I', None, None) => term.tab_forward(arg(params, 0, 1)),
        (b'Z', None, None) => term.tab_backward(arg(params, 0, 1)),
        (b'g', None, None) => match arg(params, 0, 0) {
            0 => {
                let column = term.cursor.column.min(term.grid.columns() - 1);
                term.tabs_mut().clear(column);
            },
            3 => term.tabs_mut().clear_all(),
            other => debug!("[unhandled tab clear] mode {other}"),
        },
        // DECST8C: reset stops to every eighth column.
        (b'W', Some(b'?'), None) if arg(params, 0, 0) == 5 => {
            let columns = term.grid.columns();
            *term.tabs_mut() = crate::grid::TabStops::new(columns);
        },

        // SGR.
        (b'm', None, None) => sgr(term, params, separators),

        // Modes.
        (b'h', None, None) => {
            for &param in params {
                set_ansi_mode(term, param, true);
            }
        },
        (b'l', None, None) => {
            for &param in params {
                set_ansi_mode(term, param, false);
            }
        },
        (b'h', Some(b'?'), None) => {
            for &param in params {
                set_private_mode(term, param, true);
            }
        },
        (b'l', Some(b'?'), None) => {
            for &param in params {
                set_private_mode(term, param, false);
            }
        },

        // Scroll region.
        (b'r', None, None) => {
            term.set_scroll_region(arg(params, 0, 0), arg(params, 1, 0))
        },

        // DECSLRM: left/right margins are not part of this data model.
        (b's', None, None) => {
            debug!("[ignored] DECSLRM {params:?}");
        },

        // Reports.
        (b'c', None, None) => {
            if arg(params, 0, 0) == 0 {
                term.report_primary_da();
            }
        },
        (b'c', Some(b'>'), None) => {
            if arg(params, 0, 0) == 0 {
                term.report_secondary_da();
            }
        },
        (b'n', None, None) => match arg(params, 0, 0) {
            5 => term.respond_csi("0n"),
            6 => term.report_cursor_position(),
            other => debug!("[unhandled dsr] {other}"),
        },

        // DECSCA.
        (b'q', None, Some(b'"')) => match arg(params, 0, 0) {
            0 | 2 => term.protected = false,
            1 => term.protected = true,
            other => debug!("[unhandled decsca] {other}"),
        },

        // Media copy.
        (b'i', None, None) => match arg(params, 0, 0) {
            0 => {
                let lines: Vec<String> =
                    term.grid.iter_rows().map(|row| row.text()).collect();
                term.printer.print_screen(&lines);
            },
            4 => {
                term.printer_state.controller = false;
                term.printer.set_printer_controller_mode(false);
            },
            5 => {
                term.printer_state.controller = true;
                term.printer.set_printer_controller_mode(true);
            },
            other => debug!("[unhandled media copy] {other}"),
        },
        (b'i', Some(b'?'), None) => match arg(params, 0, 0) {
            4 => {
                term.printer_state.auto_print = false;
                term.printer.set_auto_print_mode(false);
            },
            5 => {
                term.printer_state.auto_print = true;
                term.printer.set_auto_print_mode(true);
            },
            other => debug!("[unhandled media copy] ?{other}"),
        },

        _ => debug!(
            "[unhandled csi] prefix: {prefix:?}, params: {params:?}, \
             intermediates: {intermediates:?}, byte: {:?}",
            byte as char
        ),
    }
}

fn set_ansi_mode(term: &mut Interpreter, param: u16, value: bool) {
    match param {
        4 => term.modes.insert = value,
        20 => term.modes.linefeed_newline = value,
        other => debug!("[unhandled ansi mode] {other}"),
    }
}

fn set_private_mode(term: &mut Interpreter, param: u16, value: bool) {
    if !term.features.dec_private_modes {
        return;
    }

    match param {
        1 => {
            term.modes.cursor_keys_application = value;
            term.push(TerminalUpdate::Mode {
                mode: ModeName::CursorKeysApplication,
                value,
            });
        },
        3 => column_switch(term, value),
        4 => {
            term.modes.smooth_scroll = value;
            term.push(TerminalUpdate::Mode {
                mode: ModeName::SmoothScroll,
                value,
            });
        },
        5 => {
            term.modes.reverse_video = value;
            term.push(TerminalUpdate::Mode {
                mode: ModeName::ReverseVideo,
                value,
            });
        },
        6 => {
            term.modes.origin = value;
            term.push(TerminalUpdate::Mode {
                mode: ModeName::Origin,
                value,
            });
            term.goto(0, 0);
        },
        7 => {
            term.modes.auto_wrap = value;
            term.push(TerminalUpdate::Mode {
                mode: ModeName::Autowrap,
                value,
            });
        },
        9 => set_pointer_mode(term, PointerMode::X10, value),
        25 => {
            term.modes.cursor_visible = value;
            term.push(TerminalUpdate::CursorVisibility { visible: value });
        },
        // C1 transmission: set selects 7-bit, reset selects 8-bit.
        66 => {
            if term.features.c1_transmission_toggle {
                term.c1_transmission = if value {
                    C1Transmission::SevenBit
                } else {
                    C1Transmission::EightBit
                };
                term.push(TerminalUpdate::C1Transmission {
                    width: TransmissionWidth::from(term.c1_transmission),
                });
            }
        },
        1000 => set_pointer_mode(term, PointerMode::Normal, value),
        1002 => set_pointer_mode(term, PointerMode::Button, value),
        1003 => set_pointer_mode(term, PointerMode::Any, value),
        1004 => {
            if term.features.pointer_tracking {
                term.modes.focus_reporting = value;
            }
        },
        1005 => set_pointer_encoding(term, PointerEncoding::Utf8, value),
        1006 => set_pointer_encoding(term, PointerEncoding::Sgr, value),
        2004 => {
            if term.features.bracketed_paste {
                term.modes.bracketed_paste = value;
            }
        },
        other => debug!("[unhandled private mode] {other}"),
    }
}

fn set_pointer_mode(term: &mut Interpreter, mode: PointerMode, value: bool) {
    if !term.features.pointer_tracking {
        return;
    }
    if value {
        term.pointer.mode = mode;
    } else if term.pointer.mode == mode {
        term.pointer.mode = PointerMode::Off;
    }
}

fn set_pointer_encoding(
    term: &mut Interpreter,
    encoding: PointerEncoding,
    value: bool,
) {
    if !term.features.pointer_tracking {
        return;
    }
    if value {
        term.pointer.encoding = encoding;
    } else if term.pointer.encoding == encoding {
        term.pointer.encoding = PointerEncoding::Default;
    }
}

/// DECCOLM: switch between 80 and 132 columns, clearing the display.
fn column_switch(term: &mut Interpreter, wide: bool) {
    if !term.features.column_switch {
        return;
    }

    let rows = term.grid.rows();
    let columns = if wide { 132 } else { 80 };
    term.resize_grid(rows, columns);
    term.erase_in_display(2, false);
    term.scroll_top = 0;
    term.scroll_bottom = rows - 1;
    term.push(TerminalUpdate::ScrollRegion {
        top: term.scroll_top,
        bottom: term.scroll_bottom,
    });
    term.goto(0, 0);
}

// ---- SGR -----------------------------------------------------------------

fn sgr(term: &mut Interpreter, params: &[u16], separators: &[Separator]) {
    let mut idx = 0;
    while idx < params.len() {
        let param = params[idx];
        match param {
            0 => term.attrs = term.default_attrs,
            1 => term.attrs.bold = true,
            2 => term.attrs.faint = true,
            3 => term.attrs.italic = true,
            4 => {
                // Colon sub-parameters select the underline style.
                let subs = colon_run(params, separators, idx);
                term.attrs.underline = match subs.first() {
                    Some(&0) => Underline::None,
                    Some(&2) => Underline::Double,
                    _ => Underline::Single,
                };
                idx += subs.len();
            },
            5 => term.attrs.blink = Blink::Slow,
            6 => term.attrs.blink = Blink::Rapid,
            7 => term.attrs.inverse = true,
            8 => term.attrs.hidden = true,
            9 => term.attrs.strikethrough = true,
            21 => term.attrs.underline = Underline::Double,
            22 => {
                term.attrs.bold = false;
                term.attrs.faint = false;
            },
            23 => term.attrs.italic = false,
            24 => term.attrs.underline = Underline::None,
            25 => term.attrs.blink = Blink::None,
            27 => term.attrs.inverse = false,
            28 => term.attrs.hidden = false,
            29 => term.attrs.strikethrough = false,
            30..=37 => term.attrs.foreground = Color::Ansi((param - 30) as u8),
            39 => term.attrs.foreground = Color::Default,
            40..=47 => term.attrs.background = Color::Ansi((param - 40) as u8),
            49 => term.attrs.background = Color::Default,
            90..=97 => {
                term.attrs.foreground = Color::AnsiBright((param - 90) as u8)
            },
            100..=107 => {
                term.attrs.background = Color::AnsiBright((param - 100) as u8)
            },
            38 => {
                let (color, consumed) =
                    extended_color(params, separators, idx);
                if let Some(color) = color {
                    term.attrs.foreground = color;
                }
                idx += consumed;
            },
            48 => {
                let (color, consumed) =
                    extended_color(params, separators, idx);
                if let Some(color) = color {
                    term.attrs.background = color;
                }
                idx += consumed;
            },
            other => debug!("[unhandled sgr] {other}"),
        }
        idx += 1;
    }

    term.push(TerminalUpdate::Attributes {
        attributes: term.attrs,
    });
}

/// The colon-joined sub-parameters following `params[idx]`.
fn colon_run(
    params: &[u16],
    separators: &[Separator],
    idx: usize,
) -> Vec<u16> {
    let mut run = Vec::new();
    let mut next = idx + 1;
    while next < params.len() && separators[next] == Separator::Colon {
        run.push(params[next]);
        next += 1;
    }
    run
}

fn clamp_component(value: u16) -> u8 {
    value.min(u8::MAX as u16) as u8
}

/// Parse the extended color forms of SGR 38/48: `5;n`, `2;r;g;b`, and the
/// colon-joined variants including `38:2::r:g:b`. Returns the color and how
/// many parameters beyond the introducer were consumed.
fn extended_color(
    params: &[u16],
    separators: &[Separator],
    idx: usize,
) -> (Option<Color>, usize) {
    let subs = colon_run(params, separators, idx);
    if !subs.is_empty() {
        let color = match subs[0] {
            5 => subs.get(1).map(|&n| Color::Palette(clamp_component(n))),
            2 => {
                // A five-element run carries a color-space identifier in
                // front of the components.
                let components: &[u16] = if subs.len() >= 5 {
                    &subs[2..5]
                } else if subs.len() == 4 {
                    &subs[1..4]
                } else {
                    &[]
                };
                match components {
                    [r, g, b] => Some(Color::Rgb(Rgb {
                        r: clamp_component(*r),
                        g: clamp_component(*g),
                        b: clamp_component(*b),
                    })),
                    _ => None,
                }
            },
            _ => None,
        };
        return (color, subs.len());
    }

    // Semicolon form.
    match params.get(idx + 1) {
        Some(&5) => match params.get(idx + 2) {
            Some(&n) => (Some(Color::Palette(clamp_component(n))), 2),
            None => (None, 1),
        },
        Some(&2) => {
            if let (Some(&r), Some(&g), Some(&b)) = (
                params.get(idx + 2),
                params.get(idx + 3),
                params.get(idx + 4),
            ) {
                (
                    Some(Color::Rgb(Rgb {
                        r: clamp_component(r),
                        g: clamp_component(g),
                        b: clamp_component(b),
                    })),
                    4,
                )
            } else {
                (None, params.len() - idx - 1)
            }
        },
        _ => (None, 0),
    }
}
