//! Canonical JSON formatting of log records.
//!
//! Both formatter variants share [`JsonLogFormatter::format_value`]; the web
//! variant only contributes one extra base field.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::component::ComponentIdentity;
use crate::correlation::{CorrelationSource, TaskLocalCorrelation};
use crate::error::{TelemetryError, TelemetryResult};
use crate::record::{LogRecord, Message};

/// Key of the exception object in the canonical log object.
pub const EXCEPTION_INFO_KEY: &str = "exception_info";

/// Extra base fields contributed by a formatter variant.
#[derive(Clone, Default)]
pub enum FormatterVariant {
    /// Generic service formatter: no extra fields.
    #[default]
    Service,
    /// Web formatter: adds the live request `correlation_id`.
    Web(Arc<dyn CorrelationSource>),
}

impl FormatterVariant {
    fn extend_base(&self, base: &mut Map<String, Value>) {
        match self {
            Self::Service => {},
            Self::Web(source) => {
                base.insert(
                    "correlation_id".to_string(),
                    Value::String(source.correlation_id()),
                );
            },
        }
    }
}

impl fmt::Debug for FormatterVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => f.write_str("Service"),
            Self::Web(_) => f.write_str("Web"),
        }
    }
}

/// Formats [`LogRecord`]s as single-line JSON objects.
#[derive(Debug, Clone, Default)]
pub struct JsonLogFormatter {
    component: ComponentIdentity,
    variant: FormatterVariant,
}

impl JsonLogFormatter {
    /// Create a formatter with an explicit variant.
    #[must_use]
    pub fn new(component: ComponentIdentity, variant: FormatterVariant) -> Self {
        Self { component, variant }
    }

    /// Generic service formatter.
    #[must_use]
    pub fn service(component: ComponentIdentity) -> Self {
        Self::new(component, FormatterVariant::Service)
    }

    /// Web formatter reading the correlation id from `source`.
    #[must_use]
    pub fn web(component: ComponentIdentity, source: Arc<dyn CorrelationSource>) -> Self {
        Self::new(component, FormatterVariant::Web(source))
    }

    /// Web formatter reading the correlation id from the request task scope.
    #[must_use]
    pub fn web_task_local(component: ComponentIdentity) -> Self {
        Self::web(component, Arc::new(TaskLocalCorrelation))
    }

    /// The component identity stamped on every object.
    #[must_use]
    pub fn component(&self) -> &ComponentIdentity {
        &self.component
    }

    /// Format `record` into a JSON line (without trailing newline).
    ///
    /// Object keys are written in lexicographic order at every nesting level,
    /// whatever iteration order `serde_json::Map` was built with.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::MalformedMessage`] if the message text starts
    /// with `{` but is not valid JSON.
    pub fn format(&self, record: &LogRecord) -> TelemetryResult<String> {
        let object = self.format_value(record)?;
        serde_json::to_string(&SortedKeys(&object)).map_err(TelemetryError::Serialization)
    }

    /// Build the canonical log object for `record`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::MalformedMessage`] if the message text starts
    /// with `{` but is not valid JSON.
    pub fn format_value(&self, record: &LogRecord) -> TelemetryResult<Value> {
        let mut object = self.base_object(record)?;

        if let Some(props) = &record.props {
            for (key, value) in props {
                object.insert(key.clone(), value.clone());
            }
        }

        if let Some(exception) = &record.exception {
            object.insert(
                EXCEPTION_INFO_KEY.to_string(),
                Value::Object(exception.to_fields()),
            );
        }

        Ok(Value::Object(object))
    }

    fn base_object(&self, record: &LogRecord) -> TelemetryResult<Map<String, Value>> {
        let mut base = Map::new();
        base.insert("type".to_string(), Value::from("log"));
        base.insert(
            "written_at".to_string(),
            Value::String(iso_time_format(&record.timestamp)),
        );
        base.insert(
            "written_ts".to_string(),
            Value::from(epoch_nanos(&record.timestamp)),
        );
        base.insert(
            "component_id".to_string(),
            Value::String(self.component.id.clone()),
        );
        base.insert(
            "component_name".to_string(),
            Value::String(self.component.name.clone()),
        );
        base.insert(
            "component_instance".to_string(),
            Value::from(self.component.instance_index),
        );
        base.insert("logger".to_string(), Value::String(record.logger.clone()));
        base.insert("thread".to_string(), Value::String(record.thread.clone()));
        base.insert("level".to_string(), Value::from(record.level.as_str()));
        base.insert("line_no".to_string(), Value::from(record.line_no));
        base.insert("module".to_string(), Value::String(record.module.clone()));
        self.variant.extend_base(&mut base);
        base.insert("msg".to_string(), resolve_message(&record.message)?);
        Ok(base)
    }
}

/// Writes a JSON value with object keys sorted at every level.
struct SortedKeys<'a>(&'a Value);

impl Serialize for SortedKeys<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Array(items) => serializer.collect_seq(items.iter().map(SortedKeys)),
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
                serializer.collect_map(
                    entries
                        .into_iter()
                        .map(|(key, value)| (key, SortedKeys(value))),
                )
            },
            scalar => scalar.serialize(serializer),
        }
    }
}

/// Resolve the `msg` field.
///
/// Structured values pass through, `{`-prefixed text is parsed as JSON and
/// anything else is wrapped as `{"message": text}`.
///
/// # Errors
///
/// Returns [`TelemetryError::MalformedMessage`] when `{`-prefixed text does
/// not parse.
pub fn resolve_message(message: &Message) -> TelemetryResult<Value> {
    match message {
        Message::Structured(value) => Ok(value.clone()),
        Message::Text(text) if text.starts_with('{') => {
            serde_json::from_str(text).map_err(TelemetryError::MalformedMessage)
        },
        Message::Text(text) => {
            let mut wrapped = Map::new();
            wrapped.insert("message".to_string(), Value::String(text.clone()));
            Ok(Value::Object(wrapped))
        },
    }
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g.
/// `2024-01-15T10:30:00.123Z`.
#[must_use]
pub fn iso_time_format(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Nanoseconds since the Unix epoch.
///
/// Saturates to 0 outside the range representable in an `i64`.
#[must_use]
pub fn epoch_nanos(timestamp: &DateTime<Utc>) -> i64 {
    timestamp.timestamp_nanos_opt().unwrap_or_default()
}
