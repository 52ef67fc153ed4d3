//! Escape sequence dispatch.

use log::debug;

use super::Interpreter;
use crate::cell::Cell;
use crate::charset::{Charset, CharsetIndex};
use crate::update::{LineAttr, ModeName, TerminalUpdate};

pub(super) fn dispatch(term: &mut Interpreter, intermediates: &[u8], byte: u8) {
    let intermediate = if intermediates.len() == 1 {
        Some(intermediates[0])
    } else {
        None
    };

    match (intermediate, byte) {
        // IND
        (None, b'D') => term.index(),
        // NEL
        (None, b'E') => {
            term.index();
            term.cursor.column = 0;
        },
        // HTS
        (None, b'H') => {
            let column = term.cursor.column.min(term.grid.columns() - 1);
            term.tabs_mut().set(column);
        },
        // RI
        (None, b'M') => term.reverse_index(),
        // DECID
        (None, b'Z') => term.report_primary_da(),
        // RIS
        (None, b'c') => term.full_reset(),
        // DECSC / DECRC
        (None, b'7') => term.save_cursor(),
        (None, b'8') => term.restore_cursor(),
        // DECPAM / DECPNM
        (None, b'=') => set_keypad(term, true),
        (None, b'>') => set_keypad(term, false),
        // LS2 / LS3
        (None, b'n') => term.charsets.set_gl(CharsetIndex::G2),
        (None, b'o') => term.charsets.set_gl(CharsetIndex::G3),
        // SS2 / SS3
        (None, b'N') => term.charsets.single_shift(CharsetIndex::G2),
        (None, b'O') => term.charsets.single_shift(CharsetIndex::G3),
        // Stray string terminator.
        (None, b'\\') => {},
        // Legacy double-height aliases.
        (None, b'1') => set_line_attr(term, LineAttr::DoubleTop),
        (None, b'2') => set_line_attr(term, LineAttr::DoubleBottom),
        (Some(b'#'), b'3') => set_line_attr(term, LineAttr::DoubleTop),
        (Some(b'#'), b'4') => set_line_attr(term, LineAttr::DoubleBottom),
        (Some(b'#'), b'5') => set_line_attr(term, LineAttr::Single),
        (Some(b'#'), b'6') => set_line_attr(term, LineAttr::DoubleWide),
        // DECALN
        (Some(b'#'), b'8') => screen_alignment(term),
        (Some(slot @ (b'(' | b')' | b'*' | b'+')), designator) => {
            designate(term, slot, designator);
        },
        _ => debug!(
            "[unhandled esc] intermediates: {intermediates:?}, byte: {:?}",
            byte as char
        ),
    }
}

fn set_keypad(term: &mut Interpreter, enabled: bool) {
    term.modes.keypad_application = enabled;
    term.push(TerminalUpdate::Mode {
        mode: ModeName::KeypadApplication,
        value: enabled,
    });
}

fn set_line_attr(term: &mut Interpreter, value: LineAttr) {
    let row = term.cursor.row;
    term.line_attrs[row] = value;
    term.push(TerminalUpdate::LineAttributes { row, value });
}

/// DECALN: fill the whole screen with 'E' and reset the region.
fn screen_alignment(term: &mut Interpreter) {
    let rows = term.grid.rows();
    let columns = term.grid.columns();

    let cell = Cell {
        c: 'E',
        ..Cell::default()
    };
    for row in 0..rows {
        for column in 0..columns {
            term.grid[row][column] = cell;
            term.push_cell(row, column, cell);
        }
    }

    term.scroll_top = 0;
    term.scroll_bottom = rows - 1;
    term.cursor.row = 0;
    term.cursor.column = 0;
}

fn designate(term: &mut Interpreter, slot: u8, designator: u8) {
    let index = match slot {
        b'(' => CharsetIndex::G0,
        b')' => CharsetIndex::G1,
        b'*' => CharsetIndex::G2,
        _ => CharsetIndex::G3,
    };

    let Some(charset) = Charset::from_designator(designator) else {
        debug!("[unknown charset] designator {:?}", designator as char);
        return;
    };

    // NRCS variants need the capability; ASCII and line drawing are
    // always available.
    if !term.features.nrcs
        && !matches!(charset, Charset::UsAscii | Charset::DecSpecial)
    {
        return;
    }

    term.charsets.designate(index, charset);
}
