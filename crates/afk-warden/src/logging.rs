//! Log sink: console plus an append-only file.
//!
//! Both layers render `[HH:MM:SS]` local time ahead of each line. The file
//! layer writes through a non-blocking worker, so a slow or failing disk
//! never stalls the supervisor.

use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Local wall-clock timestamp, `[HH:MM:SS]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl FormatTime for LocalClock {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "[{}]", Local::now().format("%H:%M:%S"))
    }
}

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. Keep the returned
/// guard alive for the life of the process; dropping it flushes the file.
pub fn init(log_file: &Path) -> Result<WorkerGuard> {
    let dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .ok_or_else(|| anyhow!("log file has no file name: {}", log_file.display()))?
        .to_string_lossy()
        .into_owned();

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalClock)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(LocalClock)
                .with_target(false),
        )
        .try_init()?;

    Ok(guard)
}
