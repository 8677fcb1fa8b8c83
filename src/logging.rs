//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins over `level`. Calling this twice is a no-op.
pub fn init(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_lowercase())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok(); // Already initialized
}
