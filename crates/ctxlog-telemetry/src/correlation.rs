//! Request-scoped correlation ids.
//!
//! The web formatter reads the correlation id at format time from the
//! request that is currently executing, not from the metadata bundle. The id
//! lives in a tokio task-local so concurrent requests never observe each
//! other's ids.

use std::future::Future;
use uuid::Uuid;

use crate::EMPTY_VALUE;

tokio::task_local! {
    static REQUEST_CORRELATION_ID: String;
}

/// Source of the ambient correlation id.
pub trait CorrelationSource: Send + Sync {
    /// Correlation id of the in-flight request, or `"-"`.
    fn correlation_id(&self) -> String;
}

/// Reads the id from the enclosing [`scope_correlation_id`] scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskLocalCorrelation;

impl CorrelationSource for TaskLocalCorrelation {
    fn correlation_id(&self) -> String {
        current_correlation_id()
    }
}

/// A fixed id, for hosts that resolve the id themselves.
#[derive(Debug, Clone)]
pub struct StaticCorrelation(pub String);

impl CorrelationSource for StaticCorrelation {
    fn correlation_id(&self) -> String {
        self.0.clone()
    }
}

impl<F> CorrelationSource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn correlation_id(&self) -> String {
        self()
    }
}

/// Correlation id of the current request scope, or `"-"` outside one.
#[must_use]
pub fn current_correlation_id() -> String {
    REQUEST_CORRELATION_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| EMPTY_VALUE.to_string())
}

/// Run `fut` with `id` as its request correlation id.
pub async fn scope_correlation_id<F>(id: impl Into<String>, fut: F) -> F::Output
where
    F: Future,
{
    REQUEST_CORRELATION_ID.scope(id.into(), fut).await
}

/// Run `fut` as a request, reusing the inbound id when present and
/// generating a fresh one otherwise.
pub async fn scope_request<F>(inbound: Option<&str>, fut: F) -> F::Output
where
    F: Future,
{
    let id = inbound
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map_or_else(new_correlation_id, str::to_string);
    scope_correlation_id(id, fut).await
}

/// Run synchronous `f` with `id` as its request correlation id.
pub fn sync_scope_correlation_id<R>(id: impl Into<String>, f: impl FnOnce() -> R) -> R {
    REQUEST_CORRELATION_ID.sync_scope(id.into(), f)
}

/// Generate a new correlation id.
#[must_use]
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}
