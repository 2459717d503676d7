// Tracing setup: stderr plus a daily rolling file under the data directory

use std::path::Path;

use anyhow::Result;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

const LOG_PREFIX: &str = "one-big-thing";
const MAX_LOG_FILES: usize = 5;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=debug",
            env!("CARGO_PKG_NAME").replace('-', "_")
        ))
    })
}

/// Install the global subscriber. Falls back to stderr only when the log
/// directory cannot be used, so a broken disk never stops the reminder.
pub fn enable_logging(log_dir: &Path) {
    if let Err(e) = enable_file_logging(log_dir) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .try_init();
        tracing::warn!(error = %e, dir = %log_dir.display(), "File logging unavailable");
    }
}

fn enable_file_logging(log_dir: &Path) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(log_dir)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(std::io::stderr.and(appender))
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
