//! Broadcast message framing
//!
//! Messages are raw byte chunks as read from a socket or the console.
//! A relayed chunk is prefixed with a bracketed source tag and otherwise left untouched.

use crate::config::QUIT_COMMAND;
use crate::types::EndpointId;

/// Build the relayed form of a chunk: `"[fd<N>]: <original bytes>"`
pub fn frame(source: EndpointId, chunk: &[u8]) -> Vec<u8> {
    let tag = format!("[{}]: ", source);
    let mut framed = Vec::with_capacity(tag.len() + chunk.len());
    framed.extend_from_slice(tag.as_bytes());
    framed.extend_from_slice(chunk);
    framed
}

/// Whether a console chunk is exactly the quit command
///
/// The comparison is exact: `"quit"` without the trailing newline does not match.
pub fn is_quit(chunk: &[u8]) -> bool {
    chunk == QUIT_COMMAND
}

/// Printable form of a framed message for log lines
pub fn printable(framed: &[u8]) -> String {
    String::from_utf8_lossy(framed).trim_end().to_string()
}
