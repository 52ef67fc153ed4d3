//! Device control string handling.
//!
//! The payload is buffered between hook and unhook so consumers get both
//! streaming `dcs-data` updates and the assembled payload on `dcs-end`.
//! DECRQSS-style answerback programming (`DCS $ q … ST`) updates the
//! string ENQ replies with.

use super::{DcsSession, Interpreter};
use crate::update::TerminalUpdate;

pub(super) fn hook(
    term: &mut Interpreter,
    params: &[u16],
    intermediates: &[u8],
    byte: u8,
) {
    term.dcs = Some(DcsSession {
        byte,
        intermediates: intermediates.to_vec(),
        payload: Vec::new(),
    });
    term.push(TerminalUpdate::DcsStart {
        byte,
        params: params.to_vec(),
        intermediates: intermediates.to_vec(),
    });
}

pub(super) fn put(term: &mut Interpreter, bytes: &[u8]) {
    let Some(session) = term.dcs.as_mut() else {
        return;
    };
    session.payload.extend_from_slice(bytes);
    term.push(TerminalUpdate::DcsData {
        data: String::from_utf8_lossy(bytes).into_owned(),
    });
}

pub(super) fn unhook(term: &mut Interpreter) {
    let Some(session) = term.dcs.take() else {
        return;
    };

    let payload = String::from_utf8_lossy(&session.payload).into_owned();

    if session.byte == b'q' && session.intermediates.first() == Some(&b'$') {
        term.answerback = payload.clone();
    }

    term.push(TerminalUpdate::DcsEnd { data: payload });
}
