//! Invocation lifecycle hooks.
//!
//! The hooks build the records for the start and end of a worker call and
//! leave dispatching to an explicit [`InvocationLogger::emit`] step.

use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::panic::Location;

use crate::adapter::ContextLogger;
use crate::context::InvocationContext;
use crate::error::{TelemetryError, TelemetryResult};
use crate::format::EXCEPTION_INFO_KEY;
use crate::metadata::build_metadata;
use crate::record::{ExceptionInfo, Level, LogRecord, module_from_file};
use crate::sink::Dispatcher;

/// How an invocation ended.
#[derive(Debug, Clone, Copy)]
pub enum InvocationOutcome<'a> {
    /// The call returned, with an optional result value.
    Finished(Option<&'a Value>),
    /// The call failed.
    Failed(&'a ExceptionInfo),
}

/// Logs the lifecycle of worker invocations and hands out per-call loggers.
#[derive(Debug, Clone)]
pub struct InvocationLogger {
    logger_name: String,
    dispatcher: Dispatcher,
}

impl InvocationLogger {
    /// Create a provider logging under `logger_name`.
    #[must_use]
    pub fn new(logger_name: impl Into<String>, dispatcher: Dispatcher) -> Self {
        Self {
            logger_name: logger_name.into(),
            dispatcher,
        }
    }

    /// Logger name used for lifecycle records.
    #[must_use]
    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// Logger carrying `ctx`'s metadata, for use by service code.
    #[must_use]
    pub fn dependency(&self, ctx: &InvocationContext) -> ContextLogger {
        ContextLogger::new(
            self.logger_name.clone(),
            build_metadata(ctx, None),
            self.dispatcher.clone(),
        )
    }

    /// Record announcing the start of an invocation.
    #[must_use]
    #[track_caller]
    pub fn on_start(&self, ctx: &InvocationContext) -> LogRecord {
        let message = format!("function {}() started", ctx.method_name);
        LogRecord::new(self.logger_name.clone(), Level::Debug, message)
            .with_props(build_metadata(ctx, None))
    }

    /// Record announcing the end of an invocation.
    ///
    /// A failed call yields an error record whose message is the JSON text
    /// of `{"exception_info": {...}}`; a finished call yields an info record
    /// whose metadata carries the rendered result.
    ///
    /// # Errors
    ///
    /// Returns an error if the exception message cannot be encoded.
    #[track_caller]
    pub fn on_finish(
        &self,
        ctx: &InvocationContext,
        outcome: InvocationOutcome<'_>,
    ) -> TelemetryResult<LogRecord> {
        let record = match outcome {
            InvocationOutcome::Failed(exception) => {
                let mut body = Map::new();
                body.insert(
                    EXCEPTION_INFO_KEY.to_string(),
                    Value::Object(exception.to_fields()),
                );
                let message = serde_json::to_string(&body).map_err(TelemetryError::Serialization)?;
                LogRecord::new(self.logger_name.clone(), Level::Error, message)
                    .with_props(build_metadata(ctx, None))
            },
            InvocationOutcome::Finished(result) => {
                let message = format!("function {}() finished", ctx.method_name);
                LogRecord::new(self.logger_name.clone(), Level::Info, message)
                    .with_props(build_metadata(ctx, result))
            },
        };
        Ok(record)
    }

    /// Format and write `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting or the sink write fails.
    pub fn emit(&self, record: &LogRecord) -> TelemetryResult<()> {
        self.dispatcher.dispatch(record)
    }

    /// Run `f` with start and finish records around it.
    ///
    /// The outcome of `f` is returned unchanged. Failures while logging are
    /// reported through `tracing` and never replace that outcome.
    #[track_caller]
    pub fn observe<T, E, F>(&self, ctx: &InvocationContext, f: F) -> Result<T, E>
    where
        T: Serialize,
        E: std::error::Error,
        F: FnOnce() -> Result<T, E>,
    {
        self.emit_or_warn(Ok(self.on_start(ctx)));
        let outcome = f();
        self.emit_or_warn(self.finish_record(ctx, &outcome));
        outcome
    }

    /// Async form of [`observe`](Self::observe).
    #[track_caller]
    pub fn observe_async<T, E, Fut>(
        &self,
        ctx: &InvocationContext,
        fut: Fut,
    ) -> impl Future<Output = Result<T, E>>
    where
        T: Serialize,
        E: std::error::Error,
        Fut: Future<Output = Result<T, E>>,
    {
        let caller = Location::caller();
        let started = self.on_start(ctx);
        async move {
            self.emit_or_warn(Ok(started));
            let outcome = fut.await;
            let finished = self.finish_record(ctx, &outcome).map(|record| {
                record.with_location(module_from_file(caller.file()), caller.line())
            });
            self.emit_or_warn(finished);
            outcome
        }
    }

    #[track_caller]
    fn finish_record<T, E>(
        &self,
        ctx: &InvocationContext,
        outcome: &Result<T, E>,
    ) -> TelemetryResult<LogRecord>
    where
        T: Serialize,
        E: std::error::Error,
    {
        match outcome {
            Ok(value) => {
                let result = serde_json::to_value(value).map_err(TelemetryError::Serialization)?;
                self.on_finish(ctx, InvocationOutcome::Finished(Some(&result)))
            },
            Err(err) => {
                let exception = ExceptionInfo::from_error(err);
                self.on_finish(ctx, InvocationOutcome::Failed(&exception))
            },
        }
    }

    fn emit_or_warn(&self, record: TelemetryResult<LogRecord>) {
        if let Err(e) = record.and_then(|record| self.emit(&record)) {
            tracing::warn!(logger = %self.logger_name, error = %e, "Failed to emit lifecycle record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::JsonLogFormatter;
    use crate::sink::MemorySink;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, thiserror::Error)]
    #[error("order rejected: {0}")]
    struct Rejected(String);

    fn provider() -> (InvocationLogger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = Dispatcher::new(JsonLogFormatter::default(), sink.clone());
        (InvocationLogger::new("orders", dispatcher), sink)
    }

    fn ctx() -> InvocationContext {
        InvocationContext::new("orders", "create")
            .with_args([json!(1), json!(2)])
            .with_correlation_id("abc")
    }

    #[test]
    fn test_on_start_record() {
        let (hooks, _) = provider();
        let record = hooks.on_start(&ctx());

        assert_eq!(record.level, Level::Debug);
        assert_eq!(
            record.message,
            crate::Message::Text("function create() started".to_string())
        );
        let props = record.props.unwrap();
        assert_eq!(props["correlation_id"], "abc");
        assert!(props["mservice"].get("result").is_none());
    }

    #[test]
    fn test_on_finish_success_carries_result() {
        let (hooks, sink) = provider();
        let result = json!({"id": 9});
        let record = hooks
            .on_finish(&ctx(), InvocationOutcome::Finished(Some(&result)))
            .unwrap();
        hooks.emit(&record).unwrap();

        let object = &sink.objects()[0];
        assert_eq!(object["level"], "INFO");
        assert_eq!(object["msg"], json!({"message": "function create() finished"}));
        assert_eq!(object["mservice"]["result"], "{'id': 9}");
    }

    #[test]
    fn test_on_finish_failure_embeds_exception() {
        let (hooks, sink) = provider();
        let exception = ExceptionInfo::new("Rejected", "out of stock", "trace");
        let record = hooks
            .on_finish(&ctx(), InvocationOutcome::Failed(&exception))
            .unwrap();
        hooks.emit(&record).unwrap();

        let object = &sink.objects()[0];
        assert_eq!(object["level"], "ERROR");
        assert_eq!(
            object["msg"],
            json!({"exception_info": {"type": "Rejected", "message": "out of stock", "traceback": "trace"}})
        );
        assert!(object["mservice"].get("result").is_none());
        assert!(object.get("exception_info").is_none());
    }

    #[test]
    fn test_observe_success() {
        let (hooks, sink) = provider();

        let value: Result<u32, Rejected> = hooks.observe(&ctx(), || Ok(7));

        assert_eq!(value.unwrap(), 7);
        let objects = sink.objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0]["level"], "DEBUG");
        assert_eq!(objects[1]["mservice"]["result"], "7");
    }

    #[test]
    fn test_observe_resurfaces_error() {
        let (hooks, sink) = provider();

        let value: Result<u32, Rejected> =
            hooks.observe(&ctx(), || Err(Rejected("sold out".to_string())));

        let err = value.unwrap_err();
        assert_eq!(err.0, "sold out");
        let objects = sink.objects();
        assert_eq!(objects[1]["level"], "ERROR");
        assert_eq!(
            objects[1]["msg"]["exception_info"]["message"],
            "order rejected: sold out"
        );
    }

    #[tokio::test]
    async fn test_observe_async() {
        let (hooks, sink) = provider();
        let ctx = ctx();

        let value: Result<String, Rejected> = hooks
            .observe_async(&ctx, async { Ok("done".to_string()) })
            .await;

        assert_eq!(value.unwrap(), "done");
        let objects = sink.objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1]["mservice"]["result"], "done");
    }

    #[tokio::test]
    async fn test_observe_async_records_point_at_caller() {
        let (hooks, sink) = provider();
        let ctx = ctx();

        let (line, fut) = (line!(), hooks.observe_async(&ctx, async { Ok::<_, Rejected>(1) }));
        fut.await.unwrap();

        let objects = sink.objects();
        assert_eq!(objects.len(), 2);
        for object in &objects {
            assert_eq!(object["line_no"], line);
            assert_eq!(object["module"], "hooks");
        }
    }

    #[test]
    fn test_observe_omits_empty_results() {
        let (hooks, sink) = provider();

        let _: Result<u32, Rejected> = hooks.observe(&ctx(), || Ok(0));
        let _: Result<bool, Rejected> = hooks.observe(&ctx(), || Ok(false));
        let _: Result<Vec<u32>, Rejected> = hooks.observe(&ctx(), || Ok(Vec::new()));

        let objects = sink.objects();
        assert_eq!(objects.len(), 6);
        for finished in objects.iter().skip(1).step_by(2) {
            assert_eq!(finished["level"], "INFO");
            assert!(finished["mservice"].get("result").is_none());
        }
    }

    #[test]
    fn test_dependency_logger_is_bound_to_context() {
        let (hooks, sink) = provider();
        hooks.dependency(&ctx()).warning("low stock").unwrap();

        let object = &sink.objects()[0];
        assert_eq!(object["level"], "WARNING");
        assert_eq!(object["mservice"]["method"], "create");
    }
}
