//! # revloop-logging
//!
//! Logging for the revloop review loops.
//!
//! ## Key Types
//!
//! - [`Logger`] - Structured event logging
//! - [`LogEvent`] - Log event types
//! - [`LogFormat`] - Output formats (Pretty, JSON, Compact)

mod events;

pub use events::{LogEvent, LogFormat, Logger};

use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application.
///
/// With `log_dir` set, diagnostics also go to a daily-rotated file there; keep
/// the returned guard alive for as long as logging should flush.
pub fn init_tracing(level: &str, format: LogFormat, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_writer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "revloop.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    build_subscriber(filter, format, file_writer).init();
    guard
}

/// Stderr output in `format`, plus JSON lines to `file_writer` when given.
///
/// The file layer sits directly on the filter so both formats stack it on the
/// same subscriber type.
fn build_subscriber(
    filter: EnvFilter,
    format: LogFormat,
    file_writer: Option<NonBlocking>,
) -> Box<dyn Subscriber + Send + Sync> {
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(false)
            .with_ansi(false)
    });

    match format {
        LogFormat::Json => Box::new(
            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr)),
        ),
        LogFormat::Pretty | LogFormat::Compact => Box::new(
            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr)),
        ),
    }
}
