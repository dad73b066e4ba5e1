//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `wardview=debug`.
pub const LOG_ENV: &str = "WARDVIEW_LOG";

/// Picks the log filter: `WARDVIEW_LOG`, then `RUST_LOG`, then a level
/// derived from `verbose`.
#[must_use]
pub fn filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "warn" };
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level))
}

/// Installs the global subscriber, writing to stderr so stdout stays JSON.
///
/// Installing twice is harmless; the first subscriber stays in place.
pub fn init(verbose: bool) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(false);
        init(true);
    }
}
