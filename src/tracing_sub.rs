//! Log routing for the shell. While the TUI owns the terminal, records go to
//! the in-memory log buffer shown by the status bar; before that buffer is
//! registered (startup, config errors) they go to stderr.

use std::io;

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::EitherWriter;
use tracing_subscriber::util::SubscriberInitExt;

use crate::log_buffer::{LogHandle, LogWriter, global_log};

/// Picks the destination per record, so logs emitted before the buffer is
/// registered still reach stderr.
#[derive(Debug, Clone, Default)]
pub struct ShellLogWriter {
    pinned: Option<LogHandle>,
}

impl ShellLogWriter {
    /// Follow the global log buffer once one is registered.
    pub fn global() -> Self {
        Self::default()
    }

    /// Always write into `handle`.
    pub fn buffer(handle: LogHandle) -> Self {
        Self {
            pinned: Some(handle),
        }
    }
}

impl<'a> MakeWriter<'a> for ShellLogWriter {
    type Writer = EitherWriter<LogWriter, io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        match self.pinned.clone().or_else(global_log) {
            Some(handle) => EitherWriter::A(handle.writer()),
            None => EitherWriter::B(io::stderr()),
        }
    }
}

/// Plain one-line records: the status bar cannot render ANSI escapes.
fn subscriber(level: Level, writer: ShellLogWriter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(false)
        .finish()
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(level: Level) {
    let _ = subscriber(level, ShellLogWriter::global()).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_land_in_the_buffer_one_per_line() {
        let log = LogHandle::new(16);
        let dispatch = subscriber(Level::INFO, ShellLogWriter::buffer(log.clone()));
        tracing::subscriber::with_default(dispatch, || {
            tracing::info!(launchers = 3, "embed-wm starting");
            tracing::debug!("below the level filter");
        });
        let lines = log.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains("embed-wm starting launchers=3"));
        assert!(!lines[0].contains('\u{1b}'));
    }

    #[test]
    fn unpinned_writer_without_buffer_uses_stderr() {
        // The global buffer is never registered in unit tests.
        if global_log().is_none() {
            let writer = ShellLogWriter::global();
            assert!(matches!(writer.make_writer(), EitherWriter::B(_)));
        }
    }
}
