//! # Context Module
//!
//! Request-scoped state threaded through every pipeline phase.
//!
//! A [`RequestContext`] is created by the dispatcher for each incoming request and
//! handed to the response factory, every handler phase, and finalization. Phases
//! receive it as `&mut RequestContext`: values one phase stores (an authenticated
//! user id, a tenant, a parsed header) are visible to the phases after it.
//!
//! ```rust
//! use brrt_pipeline::context::RequestContext;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct TenantId(u32);
//!
//! let mut ctx = RequestContext::new();
//! ctx.insert(TenantId(7));
//! assert_eq!(ctx.get::<TenantId>(), Some(&TenantId(7)));
//! ```
//!
//! ## Cancellation
//!
//! The dispatcher never checks cancellation. A transport that can detect a client
//! going away holds a [`CancelHandle`] and flips it; handlers that care poll
//! [`RequestContext::is_cancelled`].

use crate::ids::RequestId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Request-scoped context passed to every phase.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    started: Instant,
    values: http::Extensions,
    cancelled: Arc<AtomicBool>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Fresh context with a generated request id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            started: Instant::now(),
            values: http::Extensions::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Context for an incoming request.
    ///
    /// Honours an `x-request-id` header holding a valid ULID. A [`CancelHandle`] the
    /// transport placed in the request extensions is adopted so the transport can
    /// signal cancellation to the handler.
    #[must_use]
    pub fn from_request<B>(req: &http::Request<B>) -> Self {
        let mut ctx = Self::with_request_id(RequestId::from_headers(req.headers()));
        if let Some(handle) = req.extensions().get::<CancelHandle>() {
            ctx.cancelled = Arc::clone(&handle.0);
        }
        ctx
    }

    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Store a request-scoped value, returning the previous value of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.values.insert(value)
    }

    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.values.remove::<T>()
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Handle that cancels this context from elsewhere.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancelled))
    }
}

/// Flips the cancellation flag of the contexts it was created for.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
