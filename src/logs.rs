//! Logging setup.
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` takes precedence;
//! otherwise setting the `DEBUG` environment variable turns on debug output,
//! and only warnings are shown by default.

use std::env;

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given `DEBUG` state.
#[must_use]
pub fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "warn" }
}

/// Install the global stderr subscriber. Later calls are ignored.
pub fn init() {
    let fallback = default_directive(env::var_os("DEBUG").is_some());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "debug");
        assert_eq!(default_directive(false), "warn");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init();
        init();
        tracing::debug!("logging initialized twice");
    }
}
