//! Operating system command handling.
//!
//! Every OSC is surfaced as an `osc` update; recognized identifiers
//! additionally update the title, palette, or clipboard. Unknown
//! identifiers are recorded with no side effect.

use log::debug;

use super::Interpreter;
use crate::color::xparse_color;
use crate::update::{ClipboardEntry, TerminalUpdate};

pub(super) fn dispatch(term: &mut Interpreter, data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    let (identifier, payload) = match text.split_once(';') {
        Some((identifier, payload)) => (identifier, payload),
        None => (text.as_ref(), ""),
    };

    term.push(TerminalUpdate::Osc {
        identifier: identifier.to_string(),
        data: payload.to_string(),
    });

    match identifier {
        "0" | "2" => {
            term.title = Some(payload.to_string());
            term.push(TerminalUpdate::Title {
                title: payload.to_string(),
            });
        },
        "4" => set_palette(term, payload),
        "52" => set_clipboard(term, payload),
        _ => {},
    }
}

/// OSC 4 carries `index;spec` pairs; specs are XParseColor forms.
fn set_palette(term: &mut Interpreter, payload: &str) {
    let mut fields = payload.split(';');

    while let (Some(index), Some(spec)) = (fields.next(), fields.next()) {
        let Ok(index) = index.parse::<u32>() else {
            debug!("[bad palette index] {index:?}");
            continue;
        };
        let index = index.min(255) as u8;

        match xparse_color(spec.as_bytes()) {
            Some(color) => {
                term.push(TerminalUpdate::Palette { index, color })
            },
            None => debug!("[bad palette spec] {spec:?}"),
        }
    }
}

/// OSC 52: `target;base64-data`. The data stays encoded; the clipboard is a
/// host concern and this is only a notification.
fn set_clipboard(term: &mut Interpreter, payload: &str) {
    let Some((target, data)) = payload.split_once(';') else {
        debug!("[bad clipboard payload] {payload:?}");
        return;
    };

    let entry = ClipboardEntry {
        target: target.to_string(),
        data: data.to_string(),
    };
    term.clipboard = Some(entry.clone());
    term.push(TerminalUpdate::Clipboard { entry });
}
