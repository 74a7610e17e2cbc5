//! IRC codec for tokio.
//!
//! Decodes framed lines into [`Line`]s and encodes outbound [`Message`]s.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};
use crate::line::LineCodec;
use crate::message::{Line, Message};

/// Tokio codec for IRC lines.
///
/// Wraps [`LineCodec`]. Decoding never fails on content: lines that do not
/// parse come back as the `parse_failed` sentinel.
#[derive(Default)]
pub struct IrcCodec {
    inner: LineCodec,
}

impl IrcCodec {
    /// Create a codec with the default maximum line length.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with a custom maximum line length in bytes.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            inner: LineCodec::with_max_len(max_len),
        }
    }
}

impl Decoder for IrcCodec {
    type Item = Line;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<Line>> {
        Ok(self.inner.decode(src)?.map(|raw| Line::parse(&raw)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<Line>> {
        Ok(self.inner.decode_eof(src)?.map(|raw| Line::parse(&raw)))
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> error::Result<()> {
        self.inner.encode(msg.to_string(), dst)
    }
}
