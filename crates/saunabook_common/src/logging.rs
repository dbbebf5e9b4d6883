//! Logging utilities for the saunabook services.
//!
//! Every binary calls one of the `init*` functions once at startup. Library
//! code only uses the `tracing` macros.

use std::path::Path;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber at INFO.
pub fn init() {
    init_with_level(Level::INFO);
}

fn filter_for(level: Level) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("saunabook={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` directives are honoured in addition to `level`, which applies to
/// all `saunabook*` targets.
pub fn init_with_level(level: Level) {
    // try_init: a global subscriber may already be installed (tests, embedding)
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(filter_for(level))
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize logging to a daily rolling file in `directory` in addition to stdout.
///
/// Used by the island terminal, which usually runs without an attached
/// console. The returned guard must be kept alive for the lifetime of the
/// process, otherwise buffered lines are lost.
pub fn init_with_file(level: Level, directory: &Path, file_prefix: &str) -> Option<WorkerGuard> {
    let appender = tracing_appender::rolling::daily(directory, file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_line_number(true))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer),
        )
        .with(filter_for(level))
        .try_init();

    match result {
        Ok(()) => {
            info!(
                "Logging initialized at level {} (file: {}/{})",
                level,
                directory.display(),
                file_prefix
            );
            Some(guard)
        }
        Err(_) => None,
    }
}
