//! Logging service - tracing subscriber setup
//!
//! Diagnostics go to stderr so stdout stays clean for `--json` output and
//! exports. No expense data is ever logged, only ids and counts.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV_VAR: &str = "OUTLAY_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber.
///
/// Filter precedence: `OUTLAY_LOG`, then `configured`, then `warn`. Calling
/// this twice is harmless; the second call is ignored.
pub fn init_logging(configured: Option<&str>) {
    let filter = resolve_filter(configured);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn resolve_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .ok()
        .or_else(|| configured.and_then(|c| EnvFilter::try_new(c).ok()))
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
