//! Log records as seen by the formatter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::panic::Location;
use std::path::Path;

use crate::EMPTY_VALUE;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that did not fail the call.
    Warning,
    /// A failed operation.
    Error,
    /// A failure the process may not recover from.
    Critical,
}

impl Level {
    /// Name written to the `level` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::INFO => Self::Info,
            _ => Self::Debug,
        }
    }
}

/// Message payload of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Text as produced by the caller. Text starting with `{` is treated as
    /// pre-serialized JSON by the formatter.
    Text(String),
    /// An already structured value, embedded as-is.
    Structured(Value),
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

/// Exception details attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExceptionInfo {
    /// Type, message and stack trace known separately.
    Structured {
        /// Display name of the error type.
        kind: String,
        /// Display message.
        message: String,
        /// Rendered stack trace or cause chain.
        traceback: String,
    },
    /// Only a pre-rendered exception text is available.
    Rendered(String),
}

impl ExceptionInfo {
    /// Create structured exception info.
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        traceback: impl Into<String>,
    ) -> Self {
        Self::Structured {
            kind: kind.into(),
            message: message.into(),
            traceback: traceback.into(),
        }
    }

    /// Capture an error value: its type name, display message and the chain
    /// of sources as the traceback.
    #[must_use]
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut traceback = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            traceback.push_str("\ncaused by: ");
            traceback.push_str(&cause.to_string());
            source = cause.source();
        }

        Self::Structured {
            kind: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            traceback,
        }
    }

    /// The `(type, message, traceback)` display strings.
    #[must_use]
    pub fn parts(&self) -> (String, String, String) {
        match self {
            Self::Structured {
                kind,
                message,
                traceback,
            } => (kind.clone(), message.clone(), traceback.clone()),
            Self::Rendered(text) => {
                let message = text
                    .lines()
                    .rev()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .unwrap_or(EMPTY_VALUE)
                    .to_string();
                (EMPTY_VALUE.to_string(), message, text.clone())
            },
        }
    }

    /// The `{type, message, traceback}` object.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let (kind, message, traceback) = self.parts();
        let mut fields = Map::new();
        fields.insert("type".to_string(), Value::String(kind));
        fields.insert("message".to_string(), Value::String(message));
        fields.insert("traceback".to_string(), Value::String(traceback));
        fields
    }
}

/// A single log record on its way to the formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// When the record was created.
    pub timestamp: DateTime<Utc>,
    /// Name of the logger that produced it.
    pub logger: String,
    /// Name of the producing thread.
    pub thread: String,
    /// Severity.
    pub level: Level,
    /// Source line number.
    pub line_no: u32,
    /// Source module.
    pub module: String,
    /// Message payload.
    pub message: Message,
    /// Attached exception, if any.
    pub exception: Option<ExceptionInfo>,
    /// Extra fields merged into the canonical object.
    pub props: Option<Map<String, Value>>,
}

impl LogRecord {
    /// Create a record stamped with the current time, thread and call site.
    #[must_use]
    #[track_caller]
    pub fn new(logger: impl Into<String>, level: Level, message: impl Into<Message>) -> Self {
        let location = Location::caller();
        Self {
            timestamp: Utc::now(),
            logger: logger.into(),
            thread: current_thread_name(),
            level,
            line_no: location.line(),
            module: module_from_file(location.file()),
            message: message.into(),
            exception: None,
            props: None,
        }
    }

    /// Attach props.
    #[must_use]
    pub fn with_props(mut self, props: impl Into<Map<String, Value>>) -> Self {
        self.props = Some(props.into());
        self
    }

    /// Attach exception info.
    #[must_use]
    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Override the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Override the source location.
    #[must_use]
    pub fn with_location(mut self, module: impl Into<String>, line_no: u32) -> Self {
        self.module = module.into();
        self.line_no = line_no;
        self
    }

    /// Override the thread name.
    #[must_use]
    pub fn with_thread(mut self, thread: impl Into<String>) -> Self {
        self.thread = thread.into();
        self
    }
}

/// Name of the current thread, or its id when unnamed.
pub(crate) fn current_thread_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

/// Module name derived from a source path: its file stem.
pub(crate) fn module_from_file(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(EMPTY_VALUE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct Outer(#[source] io::Error);

    #[test]
    fn test_level_names() {
        assert_eq!(Level::Debug.as_str(), "DEBUG");
        assert_eq!(Level::Warning.to_string(), "WARNING");
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warning);
    }

    #[test]
    fn test_record_captures_call_site() {
        let record = LogRecord::new("orders", Level::Info, "hello");
        assert_eq!(record.module, "record");
        assert!(record.line_no > 0);
        assert_eq!(record.message, Message::Text("hello".to_string()));
        assert!(record.exception.is_none());
        assert!(record.props.is_none());
    }

    #[test]
    fn test_exception_from_error_chain() {
        let err = Outer(io::Error::other("disk full"));
        let info = ExceptionInfo::from_error(&err);
        let (kind, message, traceback) = info.parts();

        assert!(kind.ends_with("Outer"));
        assert_eq!(message, "request failed");
        assert_eq!(traceback, "request failed\ncaused by: disk full");
    }

    #[test]
    fn test_rendered_exception_parts() {
        let info = ExceptionInfo::Rendered("Traceback:\n  at main\nValueError: bad\n".to_string());
        let (kind, message, traceback) = info.parts();

        assert_eq!(kind, "-");
        assert_eq!(message, "ValueError: bad");
        assert!(traceback.starts_with("Traceback:"));

        let (_, message, _) = ExceptionInfo::Rendered(String::new()).parts();
        assert_eq!(message, "-");
    }

    #[test]
    fn test_module_from_file() {
        assert_eq!(module_from_file("src/handlers/orders.rs"), "orders");
        assert_eq!(module_from_file(""), "-");
    }
}
