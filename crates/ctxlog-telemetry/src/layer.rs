//! Render `tracing` events through the canonical JSON formatter.

use serde_json::{Map, Value};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::format::JsonLogFormatter;
use crate::record::{LogRecord, Message, module_from_file};

/// Event format for `tracing_subscriber::fmt` producing canonical log objects.
///
/// The `message` field becomes the record message; every other event field
/// is merged as a prop.
///
/// An event whose message starts with `{` but is not valid JSON is dropped.
/// `tracing_subscriber::fmt` only reports the failed write through its
/// internal error output, so the caller of `tracing::info!` and friends never
/// sees the `MalformedMessage` error. Use [`Dispatcher`](crate::Dispatcher)
/// when the error must reach the caller.
#[derive(Debug, Clone, Default)]
pub struct ContextJsonFormat {
    formatter: JsonLogFormatter,
}

impl ContextJsonFormat {
    /// Wrap a formatter.
    #[must_use]
    pub fn new(formatter: JsonLogFormatter) -> Self {
        Self { formatter }
    }

    /// Convert an event into a log record.
    #[must_use]
    pub fn record_from_event(event: &Event<'_>) -> LogRecord {
        let metadata = event.metadata();

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let module = match metadata.file() {
            Some(file) => module_from_file(file),
            None => metadata
                .module_path()
                .and_then(|path| path.rsplit("::").next())
                .unwrap_or(metadata.target())
                .to_string(),
        };

        let mut record = LogRecord::new(
            metadata.target(),
            (*metadata.level()).into(),
            Message::Text(visitor.message.unwrap_or_default()),
        )
        .with_location(module, metadata.line().unwrap_or(0));

        if !visitor.props.is_empty() {
            record = record.with_props(visitor.props);
        }
        record
    }
}

impl<S, N> FormatEvent<S, N> for ContextJsonFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let record = Self::record_from_event(event);
        let line = self.formatter.format(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    props: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.props.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}
