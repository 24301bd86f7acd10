//! Dispatcher core module - hot path for request dispatch.
//!
//! Everything here runs once per request on the serving coroutine. Handler phases run
//! inside one `catch_unwind`; finalization runs outside it on every exit path.

use crate::context::RequestContext;
use crate::response::{
    panic_message, PanicPayload, RawRequest, Responder, ResponseFactory, ResponseWriter,
};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, info_span, warn};

/// Range of statuses that turn a [`Redirect`](crate::response::Redirect) into an actual
/// redirect.
const REDIRECT_STATUSES: std::ops::Range<u16> = 300..400;

/// An endpoint that parses, validates and executes one kind of request.
///
/// `Request` is whatever the endpoint wants to work with, usually a struct
/// deserialized from the body. `Response` is the [`Responder`] all three phases write
/// into.
///
/// No phase returns an error. A phase that finds a problem appends a diagnostic to
/// the response; if the response reports [`has_errors`](Responder::has_errors) once the
/// phase returns, the remaining phases are skipped. Diagnostics added part-way through
/// a phase never interrupt that phase.
///
/// Request-scoped values go into the [`RequestContext`]; whatever one phase stores there
/// is visible to the phases after it.
pub trait Handler: Send + Sync {
    type Request;
    type Response: Responder;

    /// Turn the transport request into `Self::Request`.
    ///
    /// On malformed input, record an error on `resp` and return any placeholder value;
    /// it is never passed to the later phases.
    fn parse_request(
        &self,
        ctx: &mut RequestContext,
        raw: &RawRequest,
        resp: &mut Self::Response,
    ) -> Self::Request;

    /// Check that `req` is valid for this endpoint. Only called after a clean parse.
    fn validate_request(
        &self,
        ctx: &mut RequestContext,
        req: &Self::Request,
        resp: &mut Self::Response,
    );

    /// Perform the action described by `req` and fill in the success payload. Only
    /// called after validation passed.
    fn execute_request(
        &self,
        ctx: &mut RequestContext,
        req: &Self::Request,
        resp: &mut Self::Response,
    );
}

/// Pipeline stage a request reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Response created by the factory, no handler phase run yet
    Created,
    Parse,
    Validate,
    Execute,
}

/// How the handler phases of a request ended. Finalization runs in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// All three phases ran.
    Completed,
    /// The response reported errors after the given phase.
    Aborted(Phase),
    /// The given phase panicked and the response's `handle_panic` ran.
    Panicked(Phase),
}

/// How the response left the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Redirected(u16),
    Sent,
}

/// A request-processing entry point the transport can hold as a trait object.
pub trait Endpoint: Send + Sync {
    /// Process `req` and write the response into `writer`.
    fn serve(&self, req: &RawRequest, writer: &mut dyn ResponseWriter) -> Outcome;
}

/// Drives a [`Handler`] through parse, validate and execute for each request.
///
/// The handler and the factory must agree on the response type; this is checked at
/// compile time by the `H: Handler<Response = F::Response>` bound.
///
/// The dispatcher holds no per-request state. One instance is shared by every
/// concurrent request.
#[derive(Debug, Clone)]
pub struct Dispatcher<F, H> {
    factory: F,
    handler: H,
}

/// Wire a response factory and a handler into a single endpoint.
#[must_use]
pub fn handle<F, H>(factory: F, handler: H) -> Dispatcher<F, H>
where
    F: ResponseFactory,
    H: Handler<Response = F::Response>,
{
    Dispatcher::new(factory, handler)
}

impl<F, H> Dispatcher<F, H>
where
    F: ResponseFactory,
    H: Handler<Response = F::Response>,
{
    #[must_use]
    pub fn new(factory: F, handler: H) -> Self {
        Self { factory, handler }
    }

    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Process one request.
    ///
    /// 1. Build the context and a fresh response from the factory.
    /// 2. Run the phases, stopping at the first boundary where the response has errors.
    /// 3. If a phase panics, call `handle_panic` exactly once.
    /// 4. Finalize: write cookies, then redirect or send.
    ///
    /// A panic never escapes this function unless the response's `handle_panic` itself
    /// panics to escalate; that escalation is re-raised after finalization.
    pub fn dispatch(&self, raw: &RawRequest, writer: &mut dyn ResponseWriter) -> Outcome {
        let mut ctx = RequestContext::from_request(raw);
        let span = info_span!(
            "pipeline",
            request_id = %ctx.request_id(),
            method = %raw.method(),
            path = %raw.uri().path()
        );
        let _entered = span.enter();

        let mut response = self.factory.new_response(&ctx, raw);
        let mut phase = Phase::Created;

        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_phases(&mut ctx, raw, &mut response, &mut phase)
        }));

        let mut escalation: Option<PanicPayload> = None;
        let outcome = match run {
            Ok(None) => Outcome::Completed,
            Ok(Some(stopped_at)) => {
                debug!(
                    request_id = %ctx.request_id(),
                    phase = ?stopped_at,
                    "Pipeline stopped on diagnostics"
                );
                Outcome::Aborted(stopped_at)
            }
            Err(payload) => {
                error!(
                    request_id = %ctx.request_id(),
                    phase = ?phase,
                    panic_message = %panic_message(&payload),
                    "Handler panicked - CRITICAL"
                );
                if let Err(escalated) = panic::catch_unwind(AssertUnwindSafe(|| {
                    response.handle_panic(&ctx, payload);
                })) {
                    warn!(
                        request_id = %ctx.request_id(),
                        panic_message = %panic_message(&escalated),
                        "Response escalated the panic; re-raising after finalization"
                    );
                    escalation = Some(escalated);
                }
                Outcome::Panicked(phase)
            }
        };

        let delivery = finalize(response, &ctx, writer);
        info!(
            request_id = %ctx.request_id(),
            outcome = ?outcome,
            delivery = ?delivery,
            latency_ms = ctx.elapsed().as_millis() as u64,
            "Request complete"
        );

        if let Some(payload) = escalation {
            panic::resume_unwind(payload);
        }
        outcome
    }

    /// Returns the phase after which the response reported errors, or `None` once
    /// execute has run. `phase` tracks the phase in progress for panic reporting.
    fn run_phases(
        &self,
        ctx: &mut RequestContext,
        raw: &RawRequest,
        response: &mut F::Response,
        phase: &mut Phase,
    ) -> Option<Phase> {
        if response.has_errors() {
            return Some(Phase::Created);
        }

        *phase = Phase::Parse;
        let request = self.handler.parse_request(ctx, raw, response);
        trace_phase(ctx, Phase::Parse);
        if response.has_errors() {
            return Some(Phase::Parse);
        }

        *phase = Phase::Validate;
        self.handler.validate_request(ctx, &request, response);
        trace_phase(ctx, Phase::Validate);
        if response.has_errors() {
            return Some(Phase::Validate);
        }

        *phase = Phase::Execute;
        self.handler.execute_request(ctx, &request, response);
        trace_phase(ctx, Phase::Execute);
        None
    }
}

#[inline]
fn trace_phase(ctx: &RequestContext, phase: Phase) {
    debug!(
        request_id = %ctx.request_id(),
        phase = ?phase,
        elapsed_us = ctx.elapsed().as_micros() as u64,
        "Phase finished"
    );
}

/// Cookies first, then either a redirect or `send`. Runs on every exit path.
fn finalize<R: Responder>(
    response: R,
    ctx: &RequestContext,
    writer: &mut dyn ResponseWriter,
) -> Delivery {
    if let Some(cookie_writer) = response.as_cookie_writer() {
        for cookie in cookie_writer.write_cookies() {
            writer.set_cookie(&cookie);
        }
    }

    if let Some(redirect) = response.as_redirect() {
        let (location, status) = redirect.redirect_to();
        if REDIRECT_STATUSES.contains(&status) {
            debug!(
                request_id = %ctx.request_id(),
                location = %location,
                status = status,
                "Redirecting instead of sending"
            );
            writer.redirect(location, status);
            return Delivery::Redirected(status);
        }
    }

    response.send(ctx, writer);
    Delivery::Sent
}

impl<F, H> Endpoint for Dispatcher<F, H>
where
    F: ResponseFactory,
    H: Handler<Response = F::Response>,
{
    fn serve(&self, req: &RawRequest, writer: &mut dyn ResponseWriter) -> Outcome {
        self.dispatch(req, writer)
    }
}
