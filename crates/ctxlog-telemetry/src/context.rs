//! Invocation context supplied by the host for each worker call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::EMPTY_VALUE;

/// Context data key carrying the request correlation id.
pub const CORRELATION_ID_KEY: &str = "correlation_id";
/// Context data key carrying the calling client id.
pub const CLIENT_ID_KEY: &str = "disco_client_id";
/// Context data key carrying the virtual host domain suffix.
pub const DOMAIN_SUFFIX_KEY: &str = "vhost_domain_suffix";
/// Context data key carrying the application name.
pub const APP_NAME_KEY: &str = "app_name";

/// Per-call record describing an in-flight invocation.
///
/// The host builds one of these for every call it dispatches. This crate only
/// reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationContext {
    /// Name of the service handling the call.
    pub service_name: String,
    /// Method invoked on the service entrypoint.
    pub method_name: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Keyword arguments.
    #[serde(default)]
    pub kwargs: Map<String, Value>,
    /// Free-form context data propagated with the call.
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl InvocationContext {
    /// Create a context for `service_name.method_name` with no arguments.
    #[must_use]
    pub fn new(service_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            method_name: method_name.into(),
            ..Default::default()
        }
    }

    /// Append a positional argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Replace the positional arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Add a keyword argument.
    #[must_use]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Add a context data entry.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Set the correlation id.
    #[must_use]
    pub fn with_correlation_id(self, id: impl Into<String>) -> Self {
        self.with_data(CORRELATION_ID_KEY, id)
    }

    /// Look up a context data entry, falling back to the `"-"` sentinel.
    #[must_use]
    pub fn data_or_empty(&self, key: &str) -> String {
        self.data
            .get(key)
            .cloned()
            .unwrap_or_else(|| EMPTY_VALUE.to_string())
    }

    /// Correlation id of the call, or `"-"`.
    #[must_use]
    pub fn correlation_id(&self) -> String {
        self.data_or_empty(CORRELATION_ID_KEY)
    }
}
