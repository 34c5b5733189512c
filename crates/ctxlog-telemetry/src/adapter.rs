//! Logger handed to service code during an invocation.

use serde_json::{Map, Value};

use crate::error::TelemetryResult;
use crate::metadata::MetadataBundle;
use crate::record::{ExceptionInfo, Level, LogRecord, Message};
use crate::sink::Dispatcher;

/// Logger that stamps every record with the same props.
///
/// Obtained from [`InvocationLogger::dependency`](crate::InvocationLogger::dependency)
/// so that log lines written by service code carry the invocation metadata.
#[derive(Debug, Clone)]
pub struct ContextLogger {
    name: String,
    props: Map<String, Value>,
    dispatcher: Dispatcher,
}

impl ContextLogger {
    /// Create a logger bound to `bundle`.
    #[must_use]
    pub fn new(name: impl Into<String>, bundle: MetadataBundle, dispatcher: Dispatcher) -> Self {
        Self {
            name: name.into(),
            props: bundle.into_props(),
            dispatcher,
        }
    }

    /// Logger name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Props attached to every record.
    #[must_use]
    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    /// Build the record this logger would emit.
    #[must_use]
    #[track_caller]
    pub fn record(&self, level: Level, message: impl Into<Message>) -> LogRecord {
        LogRecord::new(self.name.clone(), level, message).with_props(self.props.clone())
    }

    /// Emit a record at `level`.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting or the sink write fails.
    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<Message>) -> TelemetryResult<()> {
        self.dispatcher.dispatch(&self.record(level, message))
    }

    /// Emit a debug record.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting or the sink write fails.
    #[track_caller]
    pub fn debug(&self, message: impl Into<Message>) -> TelemetryResult<()> {
        self.log(Level::Debug, message)
    }

    /// Emit an info record.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting or the sink write fails.
    #[track_caller]
    pub fn info(&self, message: impl Into<Message>) -> TelemetryResult<()> {
        self.log(Level::Info, message)
    }

    /// Emit a warning record.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting or the sink write fails.
    #[track_caller]
    pub fn warning(&self, message: impl Into<Message>) -> TelemetryResult<()> {
        self.log(Level::Warning, message)
    }

    /// Emit an error record.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting or the sink write fails.
    #[track_caller]
    pub fn error(&self, message: impl Into<Message>) -> TelemetryResult<()> {
        self.log(Level::Error, message)
    }

    /// Emit a critical record.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting or the sink write fails.
    #[track_caller]
    pub fn critical(&self, message: impl Into<Message>) -> TelemetryResult<()> {
        self.log(Level::Critical, message)
    }

    /// Emit an error record carrying `err` as exception info.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting or the sink write fails.
    #[track_caller]
    pub fn exception<E>(&self, message: impl Into<Message>, err: &E) -> TelemetryResult<()>
    where
        E: std::error::Error + ?Sized,
    {
        let record = self
            .record(Level::Error, message)
            .with_exception(ExceptionInfo::from_error(err));
        self.dispatcher.dispatch(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InvocationContext;
    use crate::format::JsonLogFormatter;
    use crate::metadata::build_metadata;
    use crate::sink::MemorySink;
    use serde_json::json;
    use std::sync::Arc;

    fn logger(sink: Arc<MemorySink>) -> ContextLogger {
        let ctx = InvocationContext::new("orders", "create")
            .with_arg(5)
            .with_correlation_id("abc");
        let dispatcher = Dispatcher::new(JsonLogFormatter::default(), sink);
        ContextLogger::new("orders.service", build_metadata(&ctx, None), dispatcher)
    }

    #[test]
    fn test_every_record_carries_props() {
        let sink = Arc::new(MemorySink::new());
        let log = logger(sink.clone());

        log.info("first").unwrap();
        log.debug(json!({"step": 2})).unwrap();

        let objects = sink.objects();
        assert_eq!(objects.len(), 2);
        for object in &objects {
            assert_eq!(object["correlation_id"], "abc");
            assert_eq!(object["mservice"]["args"], "(5,)");
            assert_eq!(object["logger"], "orders.service");
        }
        assert_eq!(objects[0]["level"], "INFO");
        assert_eq!(objects[1]["msg"], json!({"step": 2}));
    }

    #[test]
    fn test_records_point_at_caller() {
        let sink = Arc::new(MemorySink::new());
        let log = logger(sink);

        let record = log.record(Level::Info, "x");
        assert_eq!(record.module, "adapter");
    }

    #[test]
    fn test_exception_record() {
        let sink = Arc::new(MemorySink::new());
        let log = logger(sink.clone());
        let err = std::io::Error::other("connection reset");

        log.exception("upstream failed", &err).unwrap();

        let object = &sink.objects()[0];
        assert_eq!(object["level"], "ERROR");
        assert_eq!(object["exception_info"]["message"], "connection reset");
        assert_eq!(object["msg"]["message"], "upstream failed");
    }
}
