//! awayd - automatic IRC away status.
//!
//! Connects to one or more IRC proxy sockets, watches for messages sent by
//! the user, and marks every connection away after a period of silence. The
//! idle timeout backs off exponentially when the user keeps coming back
//! right around the deadline.
//!
//! - [`client`]: one proxy connection and its receive loop
//! - [`control`]: the set of live clients and away-status fan-out
//! - [`idle`]: the idle/backoff state machine
//! - [`interrupt`]: broadcast wake-up primitive
//! - [`timer`]: monotonic timers

pub mod client;
pub mod config;
pub mod control;
pub mod endpoint;
pub mod idle;
pub mod interrupt;
pub mod telemetry;
pub mod timer;
