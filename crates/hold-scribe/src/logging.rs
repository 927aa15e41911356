//! Tracing setup: stdout plus a daily-rolling file in the data directory.

use crate::config::project_dirs;

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "hold_scribe=debug,hold_scribe_core=debug";

const LOG_FILE_PREFIX: &str = "hold-scribe.log";

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process. `None` means only stdout logging is active.
pub(crate) fn init() -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let log_dir = project_dirs()
        .ok()
        .map(|dirs| dirs.data_dir().join("logs"));

    let Some(log_dir) = log_dir else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        warn!("No data directory, logging to stdout only");
        return None;
    };

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Some(guard)
}
