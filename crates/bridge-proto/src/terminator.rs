//! Symbolic terminator expansion.
//!
//! Configuration and per-request settings both allow a terminator to be
//! written as a human-typeable symbolic token (`\LF\`, `\CR\`, `\ETX\`, ...)
//! instead of a raw control byte. This table is the full ASCII control-code
//! set, expanded in the same order the original broker-side helper used.

/// `(symbolic token, expansion)` pairs, in application order.
///
/// Order doesn't change the result (every token is a distinct bracketed
/// string) but is kept identical to the source table for easy diffing.
const SYMBOLIC_TERMINATORS: &[(&str, u8)] = &[
    (r"\NULL\", 0x00),
    (r"\SOH\", 0x01),
    (r"\STX\", 0x02),
    (r"\ETX\", 0x03),
    (r"\EOT\", 0x04),
    (r"\ENQ\", 0x05),
    (r"\ACK\", 0x06),
    (r"\BEL\", 0x07),
    (r"\BS\", 0x08),
    (r"\TAB\", 0x09),
    (r"\HT\", 0x09),
    (r"\LF\", 0x0A),
    (r"\VT\", 0x0B),
    (r"\FF\", 0x0C),
    (r"\NP\", 0x0C),
    (r"\CR\", 0x0D),
    (r"\SO\", 0x0E),
    (r"\SI\", 0x0F),
    (r"\DLE\", 0x10),
    (r"\DC1\", 0x11),
    (r"\DC2\", 0x12),
    (r"\DC3\", 0x13),
    (r"\DC4\", 0x14),
    (r"\NAK\", 0x15),
    (r"\SYN\", 0x16),
    (r"\ETB\", 0x17),
    (r"\CAN\", 0x18),
    (r"\EM\", 0x19),
    (r"\SUB\", 0x1A),
    (r"\ESC\", 0x1B),
    (r"\FS\", 0x1C),
    (r"\GS\", 0x1D),
    (r"\RS\", 0x1E),
    (r"\US\", 0x1F),
    (r"\DEL\", 0x7F),
];

/// Expand symbolic control-code tokens in `terminator` and return the raw
/// byte sequence. Any text that isn't one of the recognized tokens passes
/// through as its UTF-8 bytes, so a plain `"\n"` or `"\r\n"` works unchanged.
pub fn expand_symbolic(terminator: &str) -> Vec<u8> {
    let mut expanded = terminator.to_string();
    for (token, byte) in SYMBOLIC_TERMINATORS {
        if expanded.contains(token) {
            expanded = expanded.replace(token, &(*byte as char).to_string());
        }
    }
    expanded.into_bytes()
}
