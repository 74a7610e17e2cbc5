//! Integration test common infrastructure.
//!
//! Provides a fake IRC proxy to run clients against.

pub mod proxy;

#[allow(unused_imports)]
pub use proxy::{AckMode, FakeProxy};
