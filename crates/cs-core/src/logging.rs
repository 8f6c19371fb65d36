//! Process-wide `tracing` setup for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive (`debug`, `cs_backend=trace`, ...).
pub const LOG_ENV: &str = "CHATSTREAM_LOG";

/// Pick the filter: `--verbose` wins, then `CHATSTREAM_LOG`, then the config.
pub fn resolve_env_filter(configured: &str, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    if let Ok(directive) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directive) {
            return filter;
        }
    }
    EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the stderr subscriber. Stdout carries reply text only.
pub fn init_logging(configured: &str, verbose: bool) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(resolve_env_filter(configured, verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if let Err(e) = result {
        eprintln!("warning: failed to initialize logging: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_forces_debug() {
        assert_eq!(resolve_env_filter("warn", true).to_string(), "debug");
    }

    #[test]
    fn invalid_configured_filter_falls_back() {
        if std::env::var(LOG_ENV).is_ok() {
            return;
        }
        assert_eq!(resolve_env_filter("cs_backend=loudest", false).to_string(), "warn");
    }
}
