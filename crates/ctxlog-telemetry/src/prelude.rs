//! Prelude module - commonly used types for convenient import.
//!
//! Use `use ctxlog_telemetry::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust,no_run
//! use ctxlog_telemetry::prelude::*;
//!
//! # fn main() -> TelemetryResult<()> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Web)
//!     .with_component(ComponentIdentity::new("c-1", "gateway"));
//!
//! setup_logging(&config)?;
//!
//! sync_scope_correlation_id("req-1", || {
//!     tracing::info!(path = "/orders", "request received");
//! });
//! # Ok(())
//! # }
//! ```

// Errors
pub use crate::{TelemetryError, TelemetryResult};

// Context and metadata
pub use crate::{ComponentIdentity, InvocationContext, MetadataBundle, build_metadata};

// Records and formatting
pub use crate::{ExceptionInfo, JsonLogFormatter, Level, LogRecord, Message};

// Dispatch and lifecycle
pub use crate::{ContextLogger, Dispatcher, InvocationLogger, InvocationOutcome, LogSink};

// Request correlation
pub use crate::{scope_correlation_id, scope_request, sync_scope_correlation_id};

// Logging configuration and setup
pub use crate::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
