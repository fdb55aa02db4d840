//! # Codec Module
//!
//! Framing for the newline-delimited ASCII protocol: outbound commands are
//! encoded as a single line, inbound lines are classified as status updates
//! or free-text device diagnostics.

use super::status::{STATUS_TOKEN, StatusUpdate, parse_status_line};

/// Classification of one inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A `STATUS ...` line.
    Status(StatusUpdate),
    /// Any other non-empty line, trimmed.
    Plain(String),
    /// Blank line; callers skip it entirely.
    Empty,
}

/// Encodes a command as the bytes written to the transport.
///
/// The command is trimmed and terminated with a single `\n`. It must not
/// contain an embedded newline.
///
/// # Examples
///
/// ```
/// use plc_hmi::protocol::encode_command;
///
/// assert_eq!(encode_command(" speed 12 "), b"speed 12\n".to_vec());
/// ```
#[must_use]
pub fn encode_command(command: &str) -> Vec<u8> {
    let command = command.trim();
    let mut bytes = Vec::with_capacity(command.len() + 1);
    bytes.extend_from_slice(command.as_bytes());
    bytes.push(b'\n');
    bytes
}

/// Decodes raw bytes received from the transport into a trimmed line.
///
/// Invalid UTF-8 is replaced rather than rejected.
#[must_use]
pub fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_owned()
}

/// Classifies a raw inbound line.
///
/// # Examples
///
/// ```
/// use plc_hmi::protocol::{classify_line, Line};
///
/// assert_eq!(classify_line("   "), Line::Empty);
/// assert_eq!(classify_line("hello world"), Line::Plain("hello world".into()));
/// assert!(matches!(classify_line("STATUS RUN=1"), Line::Status(_)));
/// ```
#[must_use]
pub fn classify_line(raw: &str) -> Line {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Empty;
    }
    if line.split_whitespace().next() == Some(STATUS_TOKEN) {
        Line::Status(parse_status_line(line))
    } else {
        Line::Plain(line.to_owned())
    }
}
