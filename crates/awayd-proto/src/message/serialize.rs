use std::fmt::{self, Display, Formatter};

use super::parse::SERVER_TIME_FORMAT;
use super::types::{Line, Message};

/// Whether an argument can only be sent in trailing position.
fn needs_colon(arg: &str) -> bool {
    arg.is_empty() || arg.contains(':') || arg.contains(char::is_whitespace)
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Only ASCII folds back losslessly: "ß" upper-cases to "SS"
        write!(f, "{}", self.command.to_ascii_uppercase())?;

        if let Some((last, middle)) = self.args.split_last() {
            for arg in middle {
                write!(f, " {}", arg)?;
            }
            if self.has_trailing || needs_colon(last) {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }

        write!(f, "\r\n")
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(time) = self.time {
            write!(f, "@time={} ", time.format(SERVER_TIME_FORMAT))?;
        }

        if !self.source.is_empty() {
            write!(f, ":{} ", self.source)?;
        }

        write!(f, "{}", self.message)
    }
}
