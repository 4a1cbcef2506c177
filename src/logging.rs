//! Process logger.
//!
//! The crate logs through the `log` facade; `tracing-subscriber` is the
//! backend, with its `log` bridge installed by [`init`].  Every line is
//! `[HH:MM:SS] message` in local time.  Warnings and errors go to the error
//! target (stderr, or a log file opened for appending with `--error-log`);
//! everything else goes to stdout.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::InitError;

/// `chrono` format of the line prefix.
pub const TIME_FORMAT: &str = "[%H:%M:%S]";

/// Where warnings and errors are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorTarget {
    Stderr,
    File(PathBuf),
}

/// Build the subscriber: WARN and ERROR to `errors`, the rest to `out`.
pub fn subscriber(
    errors: BoxMakeWriter,
    out: BoxMakeWriter,
    level: LevelFilter,
) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_writer(errors.with_max_level(Level::WARN).or_else(out))
        .with_max_level(level)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_owned()))
        .with_level(false)
        .with_target(false)
        .with_ansi(false)
        .finish()
}

/// Install the process logger.  Call once, before anything logs.
pub fn init(target: &ErrorTarget, level: LevelFilter) -> Result<(), InitError> {
    let errors = match target {
        ErrorTarget::Stderr => BoxMakeWriter::new(io::stderr),
        ErrorTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|_| InitError::LogFile)?;
            BoxMakeWriter::new(Arc::new(file))
        }
    };
    subscriber(errors, BoxMakeWriter::new(io::stdout), level)
        .try_init()
        .map_err(|_| InitError::Logger)
}
