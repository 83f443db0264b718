//! Log subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::LogFormat;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,fleetcast=debug";

/// Initialize the tracing subscriber.
///
/// `verbose` forces `debug` and ignores `RUST_LOG`. Logs go to stderr so
/// stdout stays free for piping.
pub fn init_logging(verbose: bool, format: LogFormat) {
    let filter_layer = match build_filter(verbose) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("FATAL: Failed to create log filter: {e}");
            std::process::exit(1);
        }
    };

    let registry = tracing_subscriber::registry().with(filter_layer);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
    }

    tracing::debug!(verbose, ?format, "Logging initialized");
}

fn build_filter(verbose: bool) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    if verbose {
        return EnvFilter::try_new("debug");
    }
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}
