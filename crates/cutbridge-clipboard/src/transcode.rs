//! Line-ending conversion between the local clipboard and the wire.
//!
//! The local clipboard uses CRLF, the remote peer LF. Both directions
//! treat the input as a C string: conversion stops at the first NUL.

use cutbridge_types::{ClipboardText, LineEnding};

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Local → wire: drop every carriage return.
pub fn to_wire(local: &[u8]) -> ClipboardText {
    let mut out = Vec::with_capacity(local.len() + 1);
    out.extend(
        local
            .iter()
            .copied()
            .take_while(|&b| b != 0)
            .filter(|&b| b != CR),
    );
    ClipboardText::new(out, LineEnding::Lf)
}

/// Wire → local: expand every bare LF into CRLF.
///
/// An LF that already follows a CR is copied as is, so text that arrives
/// in CRLF form is not doubled up. The output is sized for the worst case
/// (every byte a newline) plus the terminator, and exactly `wire.len()`
/// input bytes are scanned.
pub fn to_local(wire: &[u8]) -> ClipboardText {
    let mut out = Vec::with_capacity(2 * wire.len() + 1);
    let mut prev = 0;
    for &b in wire.iter().take_while(|&&b| b != 0) {
        if b == LF && prev != CR {
            out.push(CR);
        }
        out.push(b);
        prev = b;
    }
    ClipboardText::new(out, LineEnding::CrLf)
}
