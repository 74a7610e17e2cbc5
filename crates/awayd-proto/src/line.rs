//! Line-based codec for tokio.
//!
//! Splits a byte stream on `\n`, keeping the terminator so the parser can
//! see it. Lines are decoded as UTF-8; a line that is not valid UTF-8 is
//! decoded as Latin-1 instead, which cannot fail.

use bytes::BytesMut;
use encoding::mem::decode_latin1;
use encoding::UTF_8;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::{self, command_hint, ProtocolError};

/// Longest accepted line: 8191 bytes of IRCv3 tags plus a 512 byte message.
pub const MAX_LINE_LEN: usize = 8191 + 512;

/// Codec for newline-terminated text lines.
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
}

impl LineCodec {
    /// Create a codec accepting lines up to [`MAX_LINE_LEN`] bytes.
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    /// Decode a raw line, falling back to Latin-1 when it is not UTF-8.
    pub fn decode_text(raw: &[u8]) -> String {
        if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(raw) {
            return text.into_owned();
        }

        let valid_up_to = std::str::from_utf8(raw).err().map(|e| e.valid_up_to());
        warn!(
            command = command_hint(raw).as_deref().unwrap_or("?"),
            valid_up_to = ?valid_up_to,
            line = ?String::from_utf8_lossy(raw),
            "line is not utf-8, falling back to latin-1"
        );
        decode_latin1(raw).into_owned()
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        // Look for newline starting from where we left off
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            Ok(Some(Self::decode_text(&line)))
        } else {
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        // A final line without its newline still gets handed to the parser,
        // which reports it as unparseable.
        if src.is_empty() {
            Ok(None)
        } else {
            self.next_index = 0;
            let rest = src.split_to(src.len());
            Ok(Some(Self::decode_text(&rest)))
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        let body = line.trim_end_matches(['\r', '\n']);
        if let Some(pos) = body.find(['\r', '\n']) {
            return Err(ProtocolError::EmbeddedLineBreak(pos));
        }
        dst.extend_from_slice(line.as_bytes());
        Ok(())
    }
}
