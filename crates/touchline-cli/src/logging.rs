//! Tracing subscriber setup. Logs go to stderr so stdout stays pure JSON.

use tracing_subscriber::{fmt, EnvFilter};

/// Level used when `RUST_LOG` is unset.
pub fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn init(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
