//! tracing-subscriber initialisation.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` overrides the level chosen by `verbose`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // A subscriber may already be installed (tests, embedding hosts).
    if result.is_err() {
        tracing::debug!("global subscriber already set");
    }
}
