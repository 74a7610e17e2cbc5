//! Tracing setup and span constructors.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber: `RUST_LOG` filtering, default `info`,
/// written to stderr.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one proxy connection.
    pub fn client(id: &str) -> Span {
        info_span!("client", id = %id)
    }

    /// Span for the idle controller task.
    pub fn idle() -> Span {
        info_span!("idle")
    }
}
