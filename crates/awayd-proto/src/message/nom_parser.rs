//! Nom-based IRC line parser.
//!
//! Produces borrowed slices into the input; [`super::types`] turns them into
//! owned values.

use nom::{
    bytes::complete::{tag, take_while, take_while1, take_while_m_n},
    character::complete::{char, satisfy},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    sequence::{preceded, terminated, tuple},
    IResult,
};
use smallvec::SmallVec;

fn whitespace0(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

fn whitespace1(input: &str) -> IResult<&str, &str> {
    take_while1(char::is_whitespace)(input)
}

fn digits(count: usize) -> impl Fn(&str) -> IResult<&str, &str> {
    move |input| take_while_m_n(count, count, |c: char| c.is_ascii_digit())(input)
}

/// Parse the `@time=YYYY-MM-DDTHH:MM:SS.mmmZ` tag and the whitespace after it.
fn parse_time(input: &str) -> IResult<&str, &str> {
    let timestamp = recognize(tuple((
        digits(4),
        char('-'),
        digits(2),
        char('-'),
        digits(2),
        char('T'),
        digits(2),
        char(':'),
        digits(2),
        char(':'),
        digits(2),
        satisfy(|c: char| c != '\n'),
        digits(3),
        char('Z'),
    )));
    terminated(preceded(tag("@time="), timestamp), whitespace1)(input)
}

/// Parse the `:source` prefix and the whitespace after it.
fn parse_source(input: &str) -> IResult<&str, &str> {
    terminated(
        preceded(char(':'), take_while1(|c: char| !c.is_whitespace())),
        whitespace1,
    )(input)
}

/// Parse the command name (a run of word characters).
fn parse_command(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Split what follows the command into positional args and the trailing arg.
///
/// The trailing argument starts at the first `:` and runs to the line
/// terminator. Without a `:`, positional args run to the first CR or LF.
/// A line with no terminator is rejected.
fn parse_params(input: &str) -> IResult<&str, (SmallVec<[&str; 8]>, Option<&str>)> {
    let unterminated = || nom::Err::Error(Error::new(input, ErrorKind::CrLf));

    let split = input.find([':', '\r', '\n']).ok_or_else(unterminated)?;
    let params = input[..split].split_whitespace().collect();

    if input[split..].starts_with(':') {
        let after_colon = &input[split + 1..];
        let end = after_colon.find(['\r', '\n']).ok_or_else(unterminated)?;
        Ok((&after_colon[end..], (params, Some(&after_colon[..end]))))
    } else {
        Ok((&input[split..], (params, None)))
    }
}

/// Parse a complete terminated IRC line into its components.
///
/// ```text
/// [@time=<ts> ][:<source> ]<command>[ <params>...][ :<trailing>]<CR|LF|CRLF>
/// ```
pub(crate) fn parse_message(input: &str) -> IResult<&str, ParsedLine<'_>> {
    let (input, _) = whitespace0(input)?;
    let (input, time) = opt(parse_time)(input)?;
    let (input, source) = opt(parse_source)(input)?;
    let (input, _) = whitespace0(input)?;
    let (input, command) = parse_command(input)?;
    let (input, _) = take_while(|c: char| c.is_whitespace() && c != '\r' && c != '\n')(input)?;
    let (rest, (params, trailing)) = parse_params(input)?;

    Ok((
        rest,
        ParsedLine {
            time,
            source,
            command,
            params,
            trailing,
        },
    ))
}

/// A parsed line with borrowed string slices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedLine<'a> {
    /// Raw timestamp (without `@time=`), if present.
    pub time: Option<&'a str>,
    /// Raw source (without the leading `:`), if present.
    pub source: Option<&'a str>,
    /// The command name, as sent.
    pub command: &'a str,
    /// Positional parameters.
    pub params: SmallVec<[&'a str; 8]>,
    /// Trailing parameter; `Some("")` for a bare trailing colon.
    pub trailing: Option<&'a str>,
}

impl<'a> ParsedLine<'a> {
    /// Parse a line, returning `None` if it does not match the grammar.
    pub fn parse(input: &'a str) -> Option<Self> {
        parse_message(input).ok().map(|(_rest, line)| line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2023-10-02T06:27:18.020Z";

    #[test]
    fn test_parse_full_line() {
        let raw = format!("@time={TS} :nick!user@host COMMAND arg :long text\r\n");
        let line = ParsedLine::parse(&raw).unwrap();
        assert_eq!(line.time, Some(TS));
        assert_eq!(line.source, Some("nick!user@host"));
        assert_eq!(line.command, "COMMAND");
        assert_eq!(line.params.as_slice(), &["arg"]);
        assert_eq!(line.trailing, Some("long text"));
    }

    #[test]
    fn test_parse_no_positional_args() {
        let raw = format!("@time={TS} :nick!user@host COMMAND     :long text\r\n");
        let line = ParsedLine::parse(&raw).unwrap();
        assert!(line.params.is_empty());
        assert_eq!(line.trailing, Some("long text"));
    }

    #[test]
    fn test_parse_trailing_whitespace_without_trailing_arg() {
        let raw = format!("@time={TS} :nick!user@host COMMAND arg           \r\n");
        let line = ParsedLine::parse(&raw).unwrap();
        assert_eq!(line.params.as_slice(), &["arg"]);
        assert_eq!(line.trailing, None);
    }

    #[test]
    fn test_parse_leading_whitespace_and_source() {
        let line = ParsedLine::parse("           :nick!user@host COMMAND arg   \r\n").unwrap();
        assert_eq!(line.time, None);
        assert_eq!(line.source, Some("nick!user@host"));
        assert_eq!(line.params.as_slice(), &["arg"]);
    }

    #[test]
    fn test_parse_numeric_with_many_params() {
        let raw = ":libera.proxy 333 lericson ##python-offtopic mawk!mawk@wireguard/contributor/mawk 1690531926\r\n";
        let line = ParsedLine::parse(raw).unwrap();
        assert_eq!(line.source, Some("libera.proxy"));
        assert_eq!(line.command, "333");
        assert_eq!(
            line.params.as_slice(),
            &[
                "lericson",
                "##python-offtopic",
                "mawk!mawk@wireguard/contributor/mawk",
                "1690531926"
            ]
        );
        assert_eq!(line.trailing, None);
    }

    #[test]
    fn test_parse_empty_trailing() {
        let line = ParsedLine::parse("COMMAND     :\r\n").unwrap();
        assert!(line.params.is_empty());
        assert_eq!(line.trailing, Some(""));
    }

    #[test]
    fn test_colon_inside_token_starts_trailing() {
        let line = ParsedLine::parse("CMD a:b c\n").unwrap();
        assert_eq!(line.params.as_slice(), &["a"]);
        assert_eq!(line.trailing, Some("b c"));
    }

    #[test]
    fn test_bare_cr_and_lf_terminators() {
        assert_eq!(ParsedLine::parse("PING x\r").unwrap().params.as_slice(), &["x"]);
        assert_eq!(ParsedLine::parse("PING x\n").unwrap().params.as_slice(), &["x"]);
    }

    #[test]
    fn test_command_only() {
        let line = ParsedLine::parse("PING\r\n").unwrap();
        assert_eq!(line.command, "PING");
        assert!(line.params.is_empty());
        assert_eq!(line.trailing, None);
    }

    #[test]
    fn test_rejects_unterminated() {
        assert!(ParsedLine::parse("PING x").is_none());
        assert!(ParsedLine::parse("PRIVMSG #a :no newline").is_none());
    }

    #[test]
    fn test_rejects_missing_command() {
        assert!(ParsedLine::parse(":source-only\r\n").is_none());
        assert!(ParsedLine::parse("\r\n").is_none());
        assert!(ParsedLine::parse(": PRIVMSG #a :x\r\n").is_none());
    }

    #[test]
    fn test_rejects_unknown_tags() {
        assert!(ParsedLine::parse("@msgid=abc :n!u@h PRIVMSG #a :x\r\n").is_none());
        assert!(ParsedLine::parse("@time=yesterday :n!u@h PRIVMSG #a :x\r\n").is_none());
    }
}
