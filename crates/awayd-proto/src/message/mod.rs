//! IRC message types and parsing.

mod nom_parser;
mod parse;
mod serialize;
mod types;

pub use self::parse::parse_line;
pub use self::types::{Line, Message, AUTO_AWAY_TEXT, PARSE_FAILED};
