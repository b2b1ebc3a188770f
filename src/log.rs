//! Logging utilities

use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "MIXER_LOG";

pub fn parse_log_level() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_default()
        .add_directive(LevelFilter::INFO.into())
        .add_directive("async_std=error".parse().unwrap())
        .add_directive("async_io=error".parse().unwrap())
        .add_directive("polling=error".parse().unwrap());

    fmt().with_env_filter(filter).init();
    info!("Initialised logger: welcome to mixerctl!");
}

/// Create an oops (a fatal crash) with an associated error message
pub fn oops<S: Into<String>>(msg: S, code: u16) -> ! {
    error!("{}", msg.into());
    std::process::exit(code.into());
}
