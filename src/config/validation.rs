//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use std::time::Duration;

use super::Config;
use crate::endpoint::{Endpoint, EndpointError};
use thiserror::Error;

/// Longest idle timeout the backoff may reach. Timer deadlines past this
/// risk overflowing the clock.
const MAX_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no endpoints configured")]
    NoEndpoints,
    #[error("invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: EndpointError,
    },
    #[error("client.nick must be a single non-empty word, got '{0}'")]
    InvalidNick(String),
    #[error("idle.{field} must be a positive number of seconds, got {value}")]
    InvalidDuration { field: &'static str, value: f64 },
    #[error("idle.backoff_factor must be at least 1, got {0}")]
    InvalidBackoffFactor(f64),
    #[error("idle.deadzone must be a non-negative number, got {0}")]
    InvalidDeadzone(f64),
    #[error("idle timeout at backoff exponent {max_exp} exceeds {limit:?}")]
    BackoffOverflow { max_exp: u32, limit: Duration },
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Endpoints
    if config.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }
    for raw in &config.endpoints {
        if let Err(source) = raw.parse::<Endpoint>() {
            errors.push(ValidationError::InvalidEndpoint {
                endpoint: raw.clone(),
                source,
            });
        }
    }

    // Nick goes on the wire as a single token
    let nick = &config.client.nick;
    if nick.is_empty() || nick.contains(char::is_whitespace) || nick.starts_with(':') {
        errors.push(ValidationError::InvalidNick(nick.clone()));
    }

    // Idle timing
    let idle = &config.idle;
    for (field, value) in [
        ("timeout_secs", idle.timeout_secs),
        ("max_timeout_secs", idle.max_timeout_secs),
        ("decay_secs", idle.decay_secs),
    ] {
        if !(value.is_finite() && value > 0.0) {
            errors.push(ValidationError::InvalidDuration { field, value });
        }
    }
    if !(idle.backoff_factor.is_finite() && idle.backoff_factor >= 1.0) {
        errors.push(ValidationError::InvalidBackoffFactor(idle.backoff_factor));
    }
    if !(idle.deadzone.is_finite() && idle.deadzone >= 0.0) {
        errors.push(ValidationError::InvalidDeadzone(idle.deadzone));
    }

    // The fully backed-off timeout must still be a real deadline
    if errors.is_empty() {
        let max_exp = idle.backoff_params().max_exp;
        let longest = i32::try_from(max_exp)
            .ok()
            .map(|exp| idle.timeout_secs * idle.backoff_factor.powi(exp))
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        if !longest.is_some_and(|longest| longest <= MAX_IDLE_TIMEOUT) {
            errors.push(ValidationError::BackoffOverflow {
                max_exp,
                limit: MAX_IDLE_TIMEOUT,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
endpoints = ["/run/user/1000/proxy.sock"]
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_example_config_passes() {
        let config: Config = toml::from_str(include_str!("../../awayd.example.toml")).unwrap();
        assert!(validate(&config).is_ok());
        assert_eq!(config.idle.backoff_params().max_exp, 3);
    }

    #[test]
    fn test_no_endpoints_fails() {
        let config: Config = toml::from_str("").unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::NoEndpoints)));
    }

    #[test]
    fn test_invalid_endpoint_fails() {
        let config: Config = toml::from_str(r#"endpoints = ["tcp:nohost"]"#).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidEndpoint { endpoint, .. } if endpoint == "tcp:nohost"
        )));
    }

    #[test]
    fn test_bad_nick_fails() {
        let toml = r#"
endpoints = ["/run/proxy.sock"]

[client]
nick = "two words"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidNick(_))));
    }

    #[test]
    fn test_backoff_exponent_too_large_fails() {
        let toml = r#"
endpoints = ["/run/proxy.sock"]

[idle]
backoff_max_exp = 100
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::BackoffOverflow { max_exp: 100, .. }]
        ));
    }

    #[test]
    fn test_huge_max_timeout_fails() {
        let toml = r#"
endpoints = ["/run/proxy.sock"]

[idle]
max_timeout_secs = 1e300
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(matches!(errors.as_slice(), [ValidationError::BackoffOverflow { .. }]));
    }

    #[test]
    fn test_modest_backoff_exponent_passes() {
        let toml = r#"
endpoints = ["/run/proxy.sock"]

[idle]
backoff_max_exp = 10
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_reports_every_idle_problem() {
        let toml = r#"
endpoints = ["/run/proxy.sock"]

[idle]
timeout_secs = 0.0
decay_secs = -5.0
backoff_factor = 0.5
deadzone = -1.0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidDuration { field: "timeout_secs", .. }
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidDuration { field: "decay_secs", .. }
        )));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidBackoffFactor(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidDeadzone(_))));
    }
}
