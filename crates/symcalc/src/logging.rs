//! Log subscriber setup for native runs

use crate::config::Verbosity;
use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber at `verbosity`.
///
/// `RUST_LOG`, when set and valid, takes precedence. Returns `false` if a
/// global subscriber was already installed.
pub fn init(verbosity: Verbosity) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
