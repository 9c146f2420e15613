/// Database configuration and connection management
pub mod database;

/// Application settings loading from billkeeper.toml and the environment
pub mod settings;

use tracing_subscriber::EnvFilter;

/// Initializes tracing for embedding applications.
///
/// Uses the `RUST_LOG` environment filter when present, defaulting to `info`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
