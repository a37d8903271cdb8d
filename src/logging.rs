//! Tracing setup for the CLI.
//!
//! Events go to stderr so `--json` output on stdout stays machine-readable.
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Map repeated `-v` flags to a default level; `RUST_LOG` still wins.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
