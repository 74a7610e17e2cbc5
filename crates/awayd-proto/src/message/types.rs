use chrono::{DateTime, Utc};

use crate::source::Source;

/// Command name of the sentinel message returned for unparseable lines.
pub const PARSE_FAILED: &str = "parse_failed";

/// Away text sent with `AWAY` when marking the user away.
pub const AUTO_AWAY_TEXT: &str = "Auto-away";

/// A parsed IRC message: a lower-cased command followed by its arguments.
///
/// The trailing argument, if any, is the last element of [`Message::args`].
/// Whether it was sent with a leading `:` only affects serialization and is
/// ignored by equality.
///
/// # Example
///
/// ```
/// use awayd_proto::Message;
///
/// let msg = Message::new("PRIVMSG", ["#a"]).with_trailing("hi there");
/// assert_eq!(msg.command(), "privmsg");
/// assert_eq!(msg.args(), ["#a", "hi there"]);
/// assert_eq!(msg.to_string(), "PRIVMSG #a :hi there\r\n");
/// ```
#[derive(Clone, Debug)]
pub struct Message {
    pub(super) command: String,
    pub(super) args: Vec<String>,
    pub(super) has_trailing: bool,
}

impl Message {
    /// Create a message from a command and positional arguments.
    ///
    /// The command is lower-cased.
    pub fn new<I, S>(command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.to_lowercase(),
            args: args.into_iter().map(Into::into).collect(),
            has_trailing: false,
        }
    }

    /// Append a trailing argument, always serialized with a leading `:`.
    #[must_use]
    pub fn with_trailing(mut self, text: impl Into<String>) -> Self {
        self.args.push(text.into());
        self.has_trailing = true;
        self
    }

    /// The sentinel produced when a line does not match the grammar.
    pub fn parse_failed(line: impl Into<String>) -> Self {
        Self {
            command: PARSE_FAILED.to_owned(),
            args: vec![line.into()],
            has_trailing: false,
        }
    }

    /// `USER` registration command.
    pub fn user(username: &str, mode: &str, unused: &str, realname: &str) -> Self {
        Self::new("USER", [username, mode, unused, realname])
    }

    /// `NICK` command.
    pub fn nick(nickname: &str) -> Self {
        Self::new("NICK", [nickname])
    }

    /// `AWAY :Auto-away` when `away` is set, bare `AWAY` otherwise.
    pub fn away(away: bool) -> Self {
        let msg = Self::new("AWAY", std::iter::empty::<String>());
        if away {
            msg.with_trailing(AUTO_AWAY_TEXT)
        } else {
            msg
        }
    }

    /// The lower-cased command name.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// All arguments, trailing last.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// The command followed by every argument.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.command.as_str()).chain(self.args.iter().map(String::as_str))
    }

    /// True for the [`PARSE_FAILED`] sentinel.
    pub fn is_parse_failed(&self) -> bool {
        self.command == PARSE_FAILED
    }

    /// True when the last argument was (or will be) sent after a `:`.
    pub fn has_trailing(&self) -> bool {
        self.has_trailing
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.command == other.command && self.args == other.args
    }
}

impl Eq for Message {}

/// One received line: optional server time, source and message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// Value of the `@time=` tag, when present and a valid timestamp.
    pub time: Option<DateTime<Utc>>,
    /// Who sent the line; empty when there was no prefix.
    pub source: Source,
    /// The message itself.
    pub message: Message,
}

impl Line {
    /// Split into the `(source, message)` pair.
    pub fn into_parts(self) -> (Source, Message) {
        (self.source, self.message)
    }
}
