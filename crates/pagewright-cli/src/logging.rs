//! Structured logging for runs.
//!
//! Logs go to stderr so the summary on stdout stays machine-friendly.

use pagewright::RunConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

fn filter_from_config(config: &RunConfig) -> EnvFilter {
    EnvFilter::new(config.log_level.as_filter_str())
}

/// Initialise the logging subsystem based on configuration.
///
/// Log level precedence (highest to lowest):
///
/// 1. CLI `--log-level`
/// 2. `PAGEWRIGHT_LOG_LEVEL`
/// 3. `info`
///
/// If a global subscriber is already set, the first one wins and this call
/// does nothing.
pub fn init_logging(config: &RunConfig) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_from_config(config))
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
