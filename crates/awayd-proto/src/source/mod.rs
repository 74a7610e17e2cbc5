//! Message source (the `:nick!user@host` prefix).

mod serialize;
mod types;

pub use self::types::Source;
