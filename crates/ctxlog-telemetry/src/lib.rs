//! ctxlog Telemetry - context-aware JSON logging for service workers.
//!
//! This crate provides:
//! - Metadata extraction from a worker's invocation context
//! - A canonical JSON log formatter (service and web variants)
//! - Invocation lifecycle hooks and a context-bound logger
//! - Request-scoped correlation ids
//! - Integration with the tracing ecosystem
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ctxlog_telemetry::{
//!     ComponentIdentity, Dispatcher, InvocationContext, InvocationLogger, JsonLogFormatter,
//!     WriterSink,
//! };
//!
//! # fn main() -> Result<(), ctxlog_telemetry::TelemetryError> {
//! let formatter = JsonLogFormatter::service(ComponentIdentity::new("c-1", "orders"));
//! let dispatcher = Dispatcher::new(formatter, Arc::new(WriterSink::stdout()));
//! let hooks = InvocationLogger::new("orders", dispatcher);
//!
//! let ctx = InvocationContext::new("orders", "create")
//!     .with_arg(42)
//!     .with_correlation_id("abc");
//!
//! hooks.emit(&hooks.on_start(&ctx))?;
//! hooks.dependency(&ctx).info("reserving stock")?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod adapter;
mod component;
mod context;
mod correlation;
mod error;
mod format;
mod hooks;
mod layer;
mod logging;
mod metadata;
mod record;
mod repr;
mod sink;

/// Sentinel written for context fields that are intentionally absent.
pub const EMPTY_VALUE: &str = "-";

pub use adapter::ContextLogger;
pub use component::ComponentIdentity;
pub use context::{
    APP_NAME_KEY, CLIENT_ID_KEY, CORRELATION_ID_KEY, DOMAIN_SUFFIX_KEY, InvocationContext,
};
pub use correlation::{
    CorrelationSource, StaticCorrelation, TaskLocalCorrelation, current_correlation_id,
    new_correlation_id, scope_correlation_id, scope_request, sync_scope_correlation_id,
};
pub use error::{TelemetryError, TelemetryResult};
pub use format::{
    EXCEPTION_INFO_KEY, FormatterVariant, JsonLogFormatter, epoch_nanos, iso_time_format,
    resolve_message,
};
pub use hooks::{InvocationLogger, InvocationOutcome};
pub use layer::ContextJsonFormat;
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
pub use metadata::{MetadataBundle, ServiceCall, build_metadata};
pub use record::{ExceptionInfo, Level, LogRecord, Message};
pub use sink::{Dispatcher, LogSink, MemorySink, WriterSink};
