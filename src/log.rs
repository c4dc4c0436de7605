//! Diagnostic output for pipeline runs.
//!
//! The engine rates every line it emits at one of four levels and drops
//! anything above the configured threshold. By default lines pass to the
//! [`tracing`] macros at the matching level; installing a sink callback
//! with [`Pipeline::set_log_sink`](crate::Pipeline::set_log_sink) routes
//! the formatted lines there instead.

use std::fmt;

/// Verbosity threshold for pipeline diagnostics.
///
/// Levels are ordered `Error < Info < Debug < Trace`; a configured level
/// admits itself and everything below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Failures only. The default.
    #[default]
    Error,
    /// Lifecycle events: commands spawned, descriptors closed, stages
    /// finished.
    Info,
    /// Descriptor arming decisions in the multiplex loop.
    Debug,
    /// Byte counts of individual reads and writes.
    Trace,
}

/// Callback receiving formatted log lines.
pub type LogSink = Box<dyn FnMut(&str)>;

/// Level-filtered line logger with an optional sink override.
#[derive(Default)]
pub(crate) struct Logger {
    level: LogLevel,
    sink: Option<LogSink>,
}

impl Logger {
    pub(crate) fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    pub(crate) fn set_sink(&mut self, sink: LogSink) {
        self.sink = Some(sink);
    }

    pub(crate) fn error(&mut self, args: fmt::Arguments<'_>) {
        self.emit(LogLevel::Error, args);
    }

    pub(crate) fn info(&mut self, args: fmt::Arguments<'_>) {
        self.emit(LogLevel::Info, args);
    }

    pub(crate) fn debug(&mut self, args: fmt::Arguments<'_>) {
        self.emit(LogLevel::Debug, args);
    }

    pub(crate) fn trace(&mut self, args: fmt::Arguments<'_>) {
        self.emit(LogLevel::Trace, args);
    }

    fn emit(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        if level > self.level {
            return;
        }
        let line = args.to_string();
        match &mut self.sink {
            Some(sink) => sink(&line),
            None => match level {
                LogLevel::Error => tracing::error!("{line}"),
                LogLevel::Info => tracing::info!("{line}"),
                LogLevel::Debug => tracing::debug!("{line}"),
                LogLevel::Trace => tracing::trace!("{line}"),
            },
        }
    }
}
