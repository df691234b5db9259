// Subscriber setup for the command-line binary.

use std::env;
use std::error::Error;
use std::io;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "LETSBRANCH_LOG";

/// Install a stderr subscriber.
///
/// `level` wins over `LETSBRANCH_LOG`; with neither set only `info` and above
/// are shown. Returns false if a subscriber was already installed.
pub fn init_logging(level: Option<&str>) -> Result<bool, Box<dyn Error + Send + Sync>> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let directive = level
        .map(str::to_string)
        .or_else(|| env::var(LOG_ENV).ok());
    let filter = match directive {
        Some(d) if d.eq_ignore_ascii_case("off") => {
            EnvFilter::default().add_directive(LevelFilter::OFF.into())
        }
        Some(d) => EnvFilter::try_new(&d)?,
        None => EnvFilter::default().add_directive(LevelFilter::INFO.into()),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()?;
    Ok(true)
}
