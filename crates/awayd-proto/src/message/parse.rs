//! Line parsing entry points.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::source::Source;

use super::nom_parser::ParsedLine;
use super::types::{Line, Message};

/// Format of the `@time=` tag value.
pub(crate) const SERVER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

fn parse_server_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, SERVER_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

impl Line {
    /// Parse one terminated line (ending in CR, LF or CRLF).
    ///
    /// Never fails: a line that does not match the grammar yields an empty
    /// source and the `parse_failed` sentinel carrying the original text.
    pub fn parse(raw: &str) -> Line {
        let Some(parsed) = ParsedLine::parse(raw) else {
            return Line {
                time: None,
                source: Source::default(),
                message: Message::parse_failed(raw),
            };
        };

        let mut message = Message::new(parsed.command, parsed.params.iter().copied());
        if let Some(trailing) = parsed.trailing {
            message = message.with_trailing(trailing);
        }

        Line {
            time: parsed.time.and_then(parse_server_time),
            source: parsed.source.and_then(Source::parse).unwrap_or_default(),
            message,
        }
    }
}

/// Parse a line into its `(source, message)` pair.
///
/// See [`Line::parse`].
pub fn parse_line(raw: &str) -> (Source, Message) {
    Line::parse(raw).into_parts()
}
