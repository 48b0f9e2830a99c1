//! Logging initialization and configuration.
//!
//! Every subscriber built here writes to stderr; stdout carries command
//! output only.

use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level used when neither `RUST_LOG` nor a configured level is set.
pub const DEFAULT_LEVEL: &str = "warn";

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "shell_driver=warn";

/// Initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `shell_driver=warn`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init() {
    subscriber(env_filter()).init();
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    subscriber(env_filter()).try_init()
}

/// Initialize logging with an explicit level or filter directive.
///
/// A bare level such as `debug` applies to this crate only; anything else is
/// parsed as a full `EnvFilter` directive string. Logs go to stderr so they
/// never mix with command output on stdout.
pub fn init_with(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    subscriber(filter_for(level)).try_init()
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn filter_for(level: &str) -> EnvFilter {
    let directive = match level {
        "error" | "warn" | "info" | "debug" | "trace" | "off" => {
            format!("shell_driver={level}")
        }
        other => other.to_string(),
    };
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr),
    )
}
