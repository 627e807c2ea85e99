//! Tracing initialization.
//! Builds a subscriber with EnvFilter, compact or JSON output on stderr, and
//! optional file logging.
//!
//! Behavior:
//! - Log level comes from LogLevel only (no RUST_LOG override).
//! - stdout is reserved for per-item lines and the summary.
//! - File logging goes through tracing_appender::non_blocking and is refused if
//!   any ancestor of the file path is a symlink.

use anyhow::Result;
use chrono::Local;
use reorganize::output as out;
use reorganize::platform::open_log_file_secure_append;
use reorganize::{path_has_symlink_ancestor, LogLevel};
use std::fmt as stdfmt;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{registry, Layer};

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

#[inline]
fn to_level_filter(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
    }
}

fn env_filter_for(lvl: LogLevel) -> EnvFilter {
    EnvFilter::new(to_level_filter(lvl).to_string().to_lowercase())
}

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

fn stderr_layer<S>(json: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if json {
        tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .boxed()
    }
}

fn file_layer<S>(writer: NonBlocking, json: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if json {
        tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_writer(writer)
            .boxed()
    } else {
        tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_ansi(false)
            .with_writer(writer)
            .compact()
            .boxed()
    }
}

/// Open a non-blocking file writer, or explain on stderr why not.
fn maybe_open_non_blocking_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(false) => {}
        Ok(true) => {
            out::print_warn(&format!(
                "Refusing file logging: an ancestor of {} is a symlink; logging to stderr only.",
                path.display()
            ));
            return None;
        }
        Err(e) => {
            out::print_warn(&format!(
                "Could not check log path {} for symlinks ({e}); logging to stderr only.",
                path.display()
            ));
            return None;
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let _ = std::fs::create_dir_all(parent);
    }

    match open_log_file_secure_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            out::print_warn(&format!(
                "Failed to open log file {} ({e}); logging to stderr only.",
                path.display()
            ));
            None
        }
    }
}

/// Install the global subscriber. The returned guard (file logging only) must
/// be held until exit so buffered lines are flushed.
pub fn init_tracing(lvl: LogLevel, log_file: Option<&Path>, json: bool) -> Result<Option<WorkerGuard>> {
    let (file, guard) = match log_file.and_then(maybe_open_non_blocking_writer) {
        Some((writer, guard)) => (Some(file_layer(writer, json)), Some(guard)),
        None => (None, None),
    };

    registry()
        .with(env_filter_for(lvl))
        .with(stderr_layer(json))
        .with(file)
        .try_init()?;
    Ok(guard)
}
