//! # Logging Setup
//!
//! One-shot tracing initialization for the runtime binary. Library
//! crates never install a subscriber; only the composition root does.

use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter.
pub const LOG_ENV_VAR: &str = "TAGBIND_LOG";

/// Install the global `fmt` subscriber.
///
/// The filter comes from `TAGBIND_LOG` (e.g.
/// `TAGBIND_LOG=tagbind_engine=debug,info`), defaulting to `info`.
/// Calling this twice is a no-op: the second install attempt is
/// discarded.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
