//! Configuration loading and management.
//!
//! - [`types`]: Config structs and loading
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks

mod defaults;
mod types;
mod validation;

pub use types::{ClientConfig, Config, ConfigError, IdleConfig};
pub use validation::{ValidationError, validate};
