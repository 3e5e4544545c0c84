//! Explicitly constructed backend client handle.
//!
//! The backend (auth, persistence, realtime delivery) is an opaque
//! collaborator behind the [`BackendClient`] trait. Applications build one
//! [`ClientHandle`] at startup and pass it to whoever needs it; the handle
//! owns no hidden global state and dies with its last clone.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Authenticated user as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}

/// Row-level change event types a subscription can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert,
    Update,
    Delete,
}

/// A row change delivered to a subscription sink.
#[derive(Debug, Clone)]
pub struct ChangeNotification {
    pub table: String,
    pub event: ChangeEvent,
}

/// Equality conditions for a count query.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    conditions: Vec<(String, String)>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }
}

/// Rows and exact count returned by a query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub rows: Vec<serde_json::Value>,
    pub count: u64,
}

/// Identifies an active realtime subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Opaque backend capability: auth, queries, realtime change feeds.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// The signed-in user, or `None` when nobody is signed in.
    async fn get_current_user(&self) -> Result<Option<User>>;

    async fn query(&self, table: &str, filter: &QueryFilter) -> Result<QueryResult>;

    /// Subscribe to row changes on `table`; matching events are pushed into
    /// `sink` until [`unsubscribe`](BackendClient::unsubscribe) is called.
    async fn subscribe(
        &self,
        table: &str,
        events: &[ChangeEvent],
        sink: mpsc::UnboundedSender<ChangeNotification>,
    ) -> Result<SubscriptionId>;

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;
}

/// Observer for calls made through a [`ClientHandle`].
///
/// `call_count` is the handle-lifetime total including the observed call.
pub trait CallInterceptor: Send + Sync {
    fn on_call(&self, method: &str, call_count: u64);
}

/// Cloneable, dependency-injected wrapper around a [`BackendClient`].
///
/// Clones share one call tally, so an interceptor installed at construction
/// observes every call made through any clone.
#[derive(Clone)]
pub struct ClientHandle {
    backend: Arc<dyn BackendClient>,
    interceptor: Option<Arc<dyn CallInterceptor>>,
    calls: Arc<AtomicU64>,
}

impl ClientHandle {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self {
            backend,
            interceptor: None,
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Install a call observer. Construction-path only; the hook cannot be
    /// swapped on a live handle.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn CallInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// Total calls made through this handle and its clones.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub async fn get_current_user(&self) -> Result<Option<User>> {
        self.trace("get_current_user");
        self.backend.get_current_user().await
    }

    pub async fn query(&self, table: &str, filter: &QueryFilter) -> Result<QueryResult> {
        self.trace("query");
        self.backend.query(table, filter).await
    }

    pub async fn subscribe(
        &self,
        table: &str,
        events: &[ChangeEvent],
        sink: mpsc::UnboundedSender<ChangeNotification>,
    ) -> Result<SubscriptionId> {
        self.trace("subscribe");
        self.backend.subscribe(table, events, sink).await
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.trace("unsubscribe");
        self.backend.unsubscribe(id).await
    }

    fn trace(&self, method: &str) {
        let count = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("backend call #{}: {}", count, method);
        if let Some(interceptor) = &self.interceptor {
            interceptor.on_call(method, count);
        }
    }
}
