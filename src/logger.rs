use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Overrides the level picked from --verbose, e.g. WUBINPUT_LOG=wubinput=trace
pub const LOG_ENV_VAR: &str = "WUBINPUT_LOG";

// Records from the `log` macros are forwarded to the subscriber, and
// printed on stderr so that stdout only holds results
pub fn init(verbose: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter(verbose))
        .try_init()
        .map_err(|e| anyhow!("Could not set logger: {}", e))
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_level(verbose)))
}

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}
