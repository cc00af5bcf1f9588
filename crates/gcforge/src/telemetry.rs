//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Installs a formatted `tracing` subscriber for the process.
///
/// The filter comes from `RUST_LOG` and falls back to `info`. Calling this
/// more than once (or after another subscriber was installed) is harmless:
/// the first subscriber stays.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("tracing initialised");
    }
}
