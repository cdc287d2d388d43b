//! `tracing` subscriber setup for the binary.
//!
//! `RUST_LOG` wins over the configured filter. Logs go to stderr so command
//! output on stdout stays clean.

use tracing_subscriber::EnvFilter;

/// Pick the filter directive: the environment value when set and non-empty,
/// else `default_filter`.
fn filter_directive(env_value: Option<String>, default_filter: &str) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default_filter.to_string())
}

/// Install the global fmt subscriber. Later calls are ignored.
pub fn init(default_filter: &str) {
    let filter = filter_directive(std::env::var("RUST_LOG").ok(), default_filter);
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_ansi(false)
        .with_writer(std::io::stderr);
    let _ = fmt.try_init();
}
