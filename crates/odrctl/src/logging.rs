//! Tracing setup for odrctl
//!
//! Logs go to stderr so stdout carries only command output (and JSON).

use tracing_subscriber::EnvFilter;

/// Filter for a `-v` count. Without `-v`, `RUST_LOG` applies, defaulting to warnings.
pub fn filter_for(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info,odr_health=debug,odrctl=debug"),
        _ => EnvFilter::new("debug,odr_health=trace,odrctl=trace"),
    }
}

pub fn init(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose))
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .init();
}
