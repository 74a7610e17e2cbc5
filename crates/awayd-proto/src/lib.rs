//! # awayd-proto
//!
//! IRC line parsing for the awayd presence manager.
//!
//! The parser is deliberately lenient: it never fails. A line that does not
//! match the grammar comes back as the `parse_failed` sentinel message so the
//! caller can log it and move on to the next line.
//!
//! ## Parsing a line
//!
//! ```rust
//! use awayd_proto::parse_line;
//!
//! let (source, message) = parse_line(":nick!user@host PRIVMSG #a :hi there\r\n");
//! assert_eq!(source.nick(), Some("nick"));
//! assert_eq!(message.command(), "privmsg");
//! assert_eq!(message.args(), ["#a", "hi there"]);
//! ```
//!
//! ## Building outbound commands
//!
//! ```rust
//! use awayd_proto::Message;
//!
//! assert_eq!(Message::away(true).to_string(), "AWAY :Auto-away\r\n");
//! assert_eq!(Message::away(false).to_string(), "AWAY\r\n");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
#[cfg(feature = "tokio")]
pub mod irc;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod source;

pub use self::error::ProtocolError;
#[cfg(feature = "tokio")]
pub use self::irc::IrcCodec;
#[cfg(feature = "tokio")]
pub use self::line::{LineCodec, MAX_LINE_LEN};
pub use self::message::{parse_line, Line, Message, PARSE_FAILED};
pub use self::source::Source;
