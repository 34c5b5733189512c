//! Sinks receiving formatted log lines, and the dispatcher feeding them.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{TelemetryError, TelemetryResult};
use crate::format::JsonLogFormatter;
use crate::record::{Level, LogRecord};

/// Destination for formatted log lines.
pub trait LogSink: Send + Sync {
    /// Write one formatted line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line could not be written.
    fn write_line(&self, level: Level, line: &str) -> TelemetryResult<()>;
}

/// Writes newline-delimited lines to any [`Write`] implementation.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwrap the inner writer.
    ///
    /// # Errors
    ///
    /// Returns an error if a writer panicked while holding the lock.
    pub fn into_inner(self) -> TelemetryResult<W> {
        self.writer.into_inner().map_err(poisoned)
    }
}

impl WriterSink<io::Stdout> {
    /// Sink writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl WriterSink<io::Stderr> {
    /// Sink writing to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write_line(&self, _level: Level, line: &str) -> TelemetryResult<()> {
        let mut writer = self.writer.lock().map_err(poisoned)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

fn poisoned<E>(_: E) -> TelemetryError {
    TelemetryError::SinkError("sink lock poisoned".to_string())
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured lines.
    #[must_use]
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captured lines parsed back as JSON, skipping unparseable ones.
    #[must_use]
    pub fn objects(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|(_, line)| serde_json::from_str(line).ok())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, level: Level, line: &str) -> TelemetryResult<()> {
        self.lines
            .lock()
            .map_err(poisoned)?
            .push((level, line.to_string()));
        Ok(())
    }
}

/// Formats records and hands the lines to a sink.
#[derive(Clone)]
pub struct Dispatcher {
    formatter: JsonLogFormatter,
    sink: Arc<dyn LogSink>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("formatter", &self.formatter)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(formatter: JsonLogFormatter, sink: Arc<dyn LogSink>) -> Self {
        Self { formatter, sink }
    }

    /// The formatter in use.
    #[must_use]
    pub fn formatter(&self) -> &JsonLogFormatter {
        &self.formatter
    }

    /// Format `record` and write it to the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting or the sink write fails. Nothing is
    /// written when formatting fails.
    pub fn dispatch(&self, record: &LogRecord) -> TelemetryResult<()> {
        let line = self.formatter.format(record)?;
        self.sink.write_line(record.level, &line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink_appends_newlines() {
        let sink = WriterSink::new(Vec::new());
        sink.write_line(Level::Info, "{}").unwrap();
        sink.write_line(Level::Error, "{\"a\":1}").unwrap();

        let bytes = sink.into_inner().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "{}\n{\"a\":1}\n");
    }

    #[test]
    fn test_dispatch_writes_formatted_line() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = Dispatcher::new(JsonLogFormatter::default(), sink.clone());

        dispatcher
            .dispatch(&LogRecord::new("orders", Level::Warning, "careful"))
            .unwrap();

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::Warning);
        assert_eq!(sink.objects()[0]["msg"]["message"], "careful");
    }

    #[test]
    fn test_lines_survive_poisoned_lock() {
        let sink = Arc::new(MemorySink::new());
        sink.write_line(Level::Info, "{\"a\":1}").unwrap();

        let holder = sink.clone();
        let joined = std::thread::spawn(move || {
            let _guard = holder.lines.lock().unwrap();
            panic!("writer died");
        })
        .join();

        assert!(joined.is_err());
        assert!(sink.lines.is_poisoned());
        assert_eq!(sink.lines(), vec![(Level::Info, "{\"a\":1}".to_string())]);
        assert_eq!(sink.objects()[0]["a"], 1);
    }

    #[test]
    fn test_dispatch_malformed_writes_nothing() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = Dispatcher::new(JsonLogFormatter::default(), sink.clone());

        let result = dispatcher.dispatch(&LogRecord::new("orders", Level::Info, "{oops"));

        assert!(matches!(result, Err(TelemetryError::MalformedMessage(_))));
        assert!(sink.lines().is_empty());
    }
}
