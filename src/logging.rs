//! Logging initialization
//!
//! Logs go to stderr so they never interleave with the terminal narrative on
//! stdout. `VIGIL_LOG` overrides the verbosity flags.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the filter directive
pub const LOG_ENV: &str = "VIGIL_LOG";

/// Maps `-v` count to a tracing directive
///
/// - 0 → `"warn"`
/// - 1 → `"info"`
/// - 2 → `"debug"`
/// - 3+ → `"trace"`
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    if json {
        let _ = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(verbosity >= 2)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
