//! IRC message source types.
//!
//! The source identifies who sent a line: a user (`nick!user@host`), a bare
//! `user@host`, or just a host, which is what servers and proxies send.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format

/// Origin of an IRC line.
///
/// Every part is independently optional. A source without a nickname is a
/// server (or proxy) source.
#[derive(Clone, Default, Eq, PartialEq, Debug, Hash)]
pub struct Source {
    nick: Option<String>,
    user: Option<String>,
    host: Option<String>,
}

impl Source {
    /// Create a source from its parts.
    ///
    /// # Example
    ///
    /// ```
    /// use awayd_proto::Source;
    ///
    /// let source = Source::new(Some("nick"), Some("user"), Some("host"));
    /// assert_eq!(source.to_string(), "nick!user@host");
    /// assert!(!source.is_server());
    /// ```
    pub fn new(nick: Option<&str>, user: Option<&str>, host: Option<&str>) -> Self {
        Self {
            nick: nick.map(str::to_owned),
            user: user.map(str::to_owned),
            host: host.map(str::to_owned),
        }
    }

    /// Parse the text of a source prefix, without the leading `:`.
    ///
    /// The nick is the run before a `!` (no `!`, `@` or whitespace), the user
    /// the run before an `@`, and the host is whatever remains. The host must
    /// be non-empty; when a split would leave it empty the split is not made.
    /// Returns `None` for empty input or input containing whitespace.
    pub fn parse(token: &str) -> Option<Self> {
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return None;
        }

        if let Some(bang) = token.find(['!', '@']) {
            if bang > 0 && token[bang..].starts_with('!') {
                if let Some((user, host)) = split_user_host(&token[bang + 1..]) {
                    return Some(Self::new(Some(&token[..bang]), user, Some(host)));
                }
            }
        }

        split_user_host(token).map(|(user, host)| Self::new(None, user, Some(host)))
    }

    /// The nickname, if this is a user source.
    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    /// The username (ident).
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The hostname, or the server name for server sources.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// A source without a nickname is a server source.
    pub fn is_server(&self) -> bool {
        self.nick.is_none()
    }

    /// True when no part is present, as for lines without a prefix.
    pub fn is_empty(&self) -> bool {
        self.nick.is_none() && self.user.is_none() && self.host.is_none()
    }
}

fn split_user_host(s: &str) -> Option<(Option<&str>, &str)> {
    if let Some(at) = s.find('@') {
        if at > 0 && at + 1 < s.len() {
            return Some((Some(&s[..at]), &s[at + 1..]));
        }
    }
    if s.is_empty() {
        None
    } else {
        Some((None, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mask() {
        let source = Source::parse("nick!user@host").unwrap();
        assert_eq!(source.nick(), Some("nick"));
        assert_eq!(source.user(), Some("user"));
        assert_eq!(source.host(), Some("host"));
        assert!(!source.is_server());
    }

    #[test]
    fn bare_host_is_server() {
        let source = Source::parse("libera.proxy").unwrap();
        assert_eq!(source.nick(), None);
        assert_eq!(source.user(), None);
        assert_eq!(source.host(), Some("libera.proxy"));
        assert!(source.is_server());
    }

    #[test]
    fn user_and_host() {
        let source = Source::parse("user@host").unwrap();
        assert_eq!(source.nick(), None);
        assert_eq!(source.user(), Some("user"));
        assert_eq!(source.host(), Some("host"));
    }

    #[test]
    fn nick_and_host_without_user() {
        let source = Source::parse("nick!host").unwrap();
        assert_eq!(source.nick(), Some("nick"));
        assert_eq!(source.user(), None);
        assert_eq!(source.host(), Some("host"));
    }

    #[test]
    fn host_keeps_extra_at_signs() {
        let source = Source::parse("a@b@c").unwrap();
        assert_eq!(source.user(), Some("a"));
        assert_eq!(source.host(), Some("b@c"));
    }

    #[test]
    fn empty_host_undoes_split() {
        let source = Source::parse("nick!user@").unwrap();
        assert_eq!(source.nick(), Some("nick"));
        assert_eq!(source.user(), None);
        assert_eq!(source.host(), Some("user@"));

        let source = Source::parse("nick!").unwrap();
        assert_eq!(source.nick(), None);
        assert_eq!(source.host(), Some("nick!"));
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(Source::parse(""), None);
        assert_eq!(Source::parse("a b"), None);
    }

    #[test]
    fn display_round_trips() {
        for raw in ["nick!user@host", "user@host", "host", "nick!host", "a@b@c"] {
            let source = Source::parse(raw).unwrap();
            assert_eq!(source.to_string(), raw);
            assert_eq!(Source::parse(&source.to_string()), Some(source));
        }
    }

    #[test]
    fn default_is_empty() {
        let source = Source::default();
        assert!(source.is_empty());
        assert!(source.is_server());
        assert_eq!(source.to_string(), "");
    }
}
