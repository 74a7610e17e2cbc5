use std::fmt;

use super::types::Source;

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(nick) = self.nick() {
            write!(f, "{}!", nick)?;
        }
        if let Some(user) = self.user() {
            write!(f, "{}@", user)?;
        }
        if let Some(host) = self.host() {
            write!(f, "{}", host)?;
        }
        Ok(())
    }
}
