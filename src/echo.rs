//! Example endpoint: echoes a JSON message back.
//!
//! Exercises every part of the pipeline and backs the `serve` command:
//!
//! - parse: requires a JSON body, records the `x-client` header in the context
//! - validate: `message` must be present and non-empty; over-long messages only warn
//! - execute: echoes the message, sets a cookie, optionally redirects to a local path

use crate::context::RequestContext;
use crate::diagnostics::{codes, Code, Steps};
use crate::dispatcher::{handle, Dispatcher, Handler};
use crate::response::{Cookie, RawRequest, Response, SameSite, StandardResponseFactory};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Messages longer than this are truncated with a warning.
pub const MAX_MESSAGE_CHARS: usize = 280;

/// Warning recorded when a message is truncated.
pub const MESSAGE_TRUNCATED: Code = Code::from_static("message_truncated");

#[derive(Debug, Default, Deserialize)]
pub struct EchoRequest {
    pub message: Option<String>,
    /// Local path to send the client to afterwards, with a 303
    pub redirect: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoReply {
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

/// Cookie set on every echoed response.
pub const SEEN_COOKIE: &str = "echo_seen";

/// An absolute path on this host: starts with a single `/`, is not protocol-relative
/// (`//host`, `/\host`) and contains no control characters.
fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !target.chars().any(char::is_control)
}

/// Value of the `x-client` header, stored during parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientName(pub String);

#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl Handler for EchoHandler {
    type Request = EchoRequest;
    type Response = Response<EchoReply>;

    fn parse_request(
        &self,
        ctx: &mut RequestContext,
        raw: &RawRequest,
        resp: &mut Self::Response,
    ) -> EchoRequest {
        if let Some(client) = raw
            .headers()
            .get("x-client")
            .and_then(|v| v.to_str().ok())
        {
            ctx.insert(ClientName(client.to_string()));
        }

        let content_type = raw
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json");
        if !content_type.starts_with("application/json") {
            resp.set_status(415);
            resp.add_error(codes::UNSUPPORTED_MEDIA_TYPE, []);
            return EchoRequest::default();
        }

        match serde_json::from_slice(raw.body()) {
            Ok(req) => req,
            Err(err) => {
                debug!(request_id = %ctx.request_id(), error = %err, "Malformed echo body");
                resp.add_error(codes::MALFORMED_BODY, []);
                EchoRequest::default()
            }
        }
    }

    fn validate_request(
        &self,
        _ctx: &mut RequestContext,
        req: &EchoRequest,
        resp: &mut Self::Response,
    ) {
        match req.message.as_deref() {
            None => resp.add_error(codes::MISSING_FIELD, [Steps::root().field("message")]),
            Some(m) if m.trim().is_empty() => {
                resp.add_error(codes::INVALID_VALUE, [Steps::root().field("message")]);
            }
            Some(m) if m.chars().count() > MAX_MESSAGE_CHARS => {
                resp.add_warning(MESSAGE_TRUNCATED, [Steps::root().field("message")]);
            }
            Some(_) => {}
        }
        if let Some(target) = &req.redirect {
            if !is_local_path(target) {
                resp.add_error(codes::INVALID_VALUE, [Steps::root().field("redirect")]);
            }
        }
    }

    fn execute_request(
        &self,
        ctx: &mut RequestContext,
        req: &EchoRequest,
        resp: &mut Self::Response,
    ) {
        let message: String = req
            .message
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(MAX_MESSAGE_CHARS)
            .collect();
        let request_id = ctx.request_id().to_string();

        // Same value on every response so the header line is shared
        resp.add_cookie(
            Cookie::new(SEEN_COOKIE, "1")
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax),
        );
        resp.set_data(EchoReply {
            message,
            request_id,
            client: ctx.get::<ClientName>().map(|c| c.0.clone()),
        });
        if let Some(target) = &req.redirect {
            resp.redirect(target.clone(), 303);
        }
    }
}

/// The echo endpoint wired to a factory.
pub fn echo_endpoint(
    factory: StandardResponseFactory<EchoReply>,
) -> Dispatcher<StandardResponseFactory<EchoReply>, EchoHandler> {
    handle(factory, EchoHandler)
}
