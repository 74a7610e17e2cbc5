//! Default value functions for configuration.

use crate::client::DEFAULT_NICK;

// =============================================================================
// Client Defaults
// =============================================================================

pub fn default_nick() -> String {
    DEFAULT_NICK.to_string()
}

// =============================================================================
// Idle Defaults
// =============================================================================

pub fn default_idle_timeout() -> f64 {
    5.0 * 60.0
}

pub fn default_backoff_factor() -> f64 {
    2.0
}

pub fn default_max_timeout() -> f64 {
    3600.0
}

pub fn default_deadzone() -> f64 {
    1.0
}

pub fn default_decay() -> f64 {
    24.0 * 3600.0
}
