//! Per-request execution context.
//!
//! The context is owned by whatever serves requests (HTTP layer, job runner).
//! The core only reads it: subscribers snapshot [`ExecutionContext`] through an
//! [`ExecutionContextAccessor`] at the moment an event is delivered.

use crate::TraceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Identity and trace metadata of the request currently being served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub trace_id: TraceId,
    pub session_id: Option<String>,
    /// Unique per request, even when the trace spans several requests.
    pub unique_id: Uuid,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub user_ip: Option<String>,
    pub is_authenticated: bool,
    pub started_at: DateTime<Utc>,
    pub language: Option<String>,
}

impl ExecutionContext {
    /// A context for work not attributable to a user (startup, background jobs).
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            trace_id: TraceId::new(),
            session_id: None,
            unique_id: Uuid::new_v4(),
            user_id: None,
            username: None,
            user_ip: None,
            is_authenticated: false,
            started_at: Utc::now(),
            language: None,
        }
    }

    /// Marks the context as authenticated for the given user.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>, username: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.username = Some(username.into());
        self.is_authenticated = true;
        self
    }

    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_ip(mut self, user_ip: impl Into<String>) -> Self {
        self.user_ip = Some(user_ip.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Read-only access to the execution context of the current request.
///
/// Implementations must be cheap and non-blocking: callers snapshot the
/// context synchronously, before their first suspension point.
pub trait ExecutionContextAccessor: Send + Sync {
    fn current(&self) -> ExecutionContext;
}

/// Always returns the same context. Useful for startup and background work.
#[derive(Debug, Clone)]
pub struct FixedExecutionContext(ExecutionContext);

impl FixedExecutionContext {
    pub fn new(context: ExecutionContext) -> Self {
        Self(context)
    }
}

impl ExecutionContextAccessor for FixedExecutionContext {
    fn current(&self) -> ExecutionContext {
        self.0.clone()
    }
}

/// A swappable context holder.
///
/// The request layer calls [`SharedExecutionContext::set`] when it starts
/// serving a request; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SharedExecutionContext {
    inner: Arc<RwLock<ExecutionContext>>,
}

impl SharedExecutionContext {
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            inner: Arc::new(RwLock::new(context)),
        }
    }

    /// Replaces the active context, returning the previous one.
    pub fn set(&self, context: ExecutionContext) -> ExecutionContext {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, context)
    }
}

impl ExecutionContextAccessor for SharedExecutionContext {
    fn current(&self) -> ExecutionContext {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
