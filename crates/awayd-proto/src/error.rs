//! Error types for the line codec.
//!
//! Parsing itself never fails (see [`crate::message::parse_line`]); the only
//! errors are transport-level ones raised while framing lines.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Line exceeded maximum allowed length.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Outgoing data contained an embedded line break.
    #[error("embedded line break in outgoing line at byte {0}")]
    EmbeddedLineBreak(usize),
}

/// Extract the command token from a raw line for diagnostics.
///
/// Works on bytes so it can describe lines that failed UTF-8 decoding.
/// Skips an optional `@tag` section and `:source` prefix.
///
/// ```ignore
/// assert_eq!(command_hint(b":srv 306 e :gone"), Some("306".to_string()));
/// ```
pub(crate) fn command_hint(raw_line: &[u8]) -> Option<String> {
    let mut pos = 0;

    for marker in [b'@', b':'] {
        if raw_line.get(pos) == Some(&marker) {
            while pos < raw_line.len() && raw_line[pos] != b' ' {
                pos += 1;
            }
            while raw_line.get(pos) == Some(&b' ') {
                pos += 1;
            }
        }
    }

    let start = pos;
    while pos < raw_line.len() && (raw_line[pos].is_ascii_alphanumeric() || raw_line[pos] == b'_') {
        pos += 1;
    }

    if pos > start {
        String::from_utf8(raw_line[start..pos].to_vec()).ok()
    } else {
        None
    }
}
