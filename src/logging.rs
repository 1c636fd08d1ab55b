//! Tracing subscriber setup.
//!
//! Diagnostics go to stderr through `tracing`; command output stays on
//! stdout. The level comes from `RUST_LOG` and defaults to `info`, e.g.
//! `RUST_LOG=jarchive=debug,reqwest=warn`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Calling it again is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
