//! Stock response type and its negotiating factory.

use super::core::{
    panic_message, Cookie, CookieWriter, PanicPayload, RawRequest, Redirect, Responder,
    ResponseFactory, ResponseWriter,
};
use crate::context::RequestContext;
use crate::diagnostics::{codes, Code, Diagnostics, Steps};
use crate::encoding::{Encoding, JsonEncoding};
use crate::negotiate::negotiate;
use crate::runtime_config::PanicPolicy;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error};

/// Builds [`Response`]s primed with the encoding the client asked for.
///
/// # Example
///
/// ```rust
/// use brrt_pipeline::encoding::YamlEncoding;
/// use brrt_pipeline::response::StandardResponseFactory;
///
/// let factory = StandardResponseFactory::<serde_json::Value>::json().with_encoding(YamlEncoding);
/// ```
pub struct StandardResponseFactory<T> {
    encodings: Vec<Arc<dyn Encoding>>,
    default_encoding: Arc<dyn Encoding>,
    panic_policy: PanicPolicy,
    _payload: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for StandardResponseFactory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardResponseFactory")
            .field("encodings", &self.encodings)
            .field("default_encoding", &self.default_encoding)
            .field("panic_policy", &self.panic_policy)
            .finish()
    }
}

impl<T> Clone for StandardResponseFactory<T> {
    fn clone(&self) -> Self {
        Self {
            encodings: self.encodings.clone(),
            default_encoding: Arc::clone(&self.default_encoding),
            panic_policy: self.panic_policy,
            _payload: PhantomData,
        }
    }
}

impl<T> Default for StandardResponseFactory<T> {
    fn default() -> Self {
        Self::json()
    }
}

impl<T> StandardResponseFactory<T> {
    /// Factory whose fallback encoding is `default_encoding`. No other encodings are
    /// registered yet.
    #[must_use]
    pub fn new(default_encoding: impl Encoding + 'static) -> Self {
        Self {
            encodings: Vec::new(),
            default_encoding: Arc::new(default_encoding),
            panic_policy: PanicPolicy::default(),
            _payload: PhantomData,
        }
    }

    /// Factory falling back to [`JsonEncoding`].
    #[must_use]
    pub fn json() -> Self {
        Self::new(JsonEncoding)
    }

    /// Register an encoding the client may negotiate.
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Encoding + 'static) -> Self {
        self.encodings.push(Arc::new(encoding));
        self
    }

    #[must_use]
    pub fn with_panic_policy(mut self, policy: PanicPolicy) -> Self {
        self.panic_policy = policy;
        self
    }

    /// Pick the encoding for an `Accept` header value.
    ///
    /// Registered encodings are tried in registration order; the default encoding is
    /// always available as a final alternative and is the answer when nothing matches.
    #[must_use]
    pub fn select_encoding(&self, accept: &str) -> Arc<dyn Encoding> {
        let default_registered = self
            .encodings
            .iter()
            .any(|enc| enc.content_type() == self.default_encoding.content_type());
        let mut alternatives: Vec<&str> = self.encodings.iter().map(|e| e.content_type()).collect();
        if !default_registered {
            alternatives.push(self.default_encoding.content_type());
        }

        match negotiate(accept, &alternatives) {
            Some(idx) if idx < self.encodings.len() => Arc::clone(&self.encodings[idx]),
            _ => Arc::clone(&self.default_encoding),
        }
    }
}

impl<T: Serialize> ResponseFactory for StandardResponseFactory<T> {
    type Response = Response<T>;

    fn new_response(&self, ctx: &RequestContext, req: &RawRequest) -> Response<T> {
        let accept = req
            .headers()
            .get(http::header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let encoding = self.select_encoding(accept);
        debug!(
            request_id = %ctx.request_id(),
            accept = %accept,
            content_type = %encoding.content_type(),
            "Response encoding negotiated"
        );
        Response::new(encoding, self.panic_policy)
    }
}

/// Information conveyed back to the client.
///
/// Carries the negotiated encoding, a status, accumulated [`Diagnostics`], an optional
/// success payload, cookies and an optional redirect. Serialized as
///
/// ```json
/// { "diags": [ ... ], "data": { ... } }
/// ```
///
/// with either key omitted when empty.
#[derive(Debug)]
pub struct Response<T> {
    encoding: Arc<dyn Encoding>,
    panic_policy: PanicPolicy,
    status: Option<u16>,
    diags: Diagnostics,
    data: Option<T>,
    cookies: Vec<Cookie>,
    redirect: Option<(String, u16)>,
}

impl<T> Response<T> {
    #[must_use]
    pub fn new(encoding: Arc<dyn Encoding>, panic_policy: PanicPolicy) -> Self {
        Self {
            encoding,
            panic_policy,
            status: None,
            diags: Diagnostics::new(),
            data: None,
            cookies: Vec::new(),
            redirect: None,
        }
    }

    #[must_use]
    pub fn encoding(&self) -> &Arc<dyn Encoding> {
        &self.encoding
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// Status `send` will use: the one set explicitly, else 400 with errors, else 200.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
            .unwrap_or(if self.diags.has_errors() { 400 } else { 200 })
    }

    pub fn set_data(&mut self, data: T) {
        self.data = Some(data);
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Append an error-level diagnostic.
    pub fn add_error(&mut self, code: Code, paths: impl IntoIterator<Item = Steps>) {
        self.diags.error(code, paths);
    }

    /// Append a warning-level diagnostic.
    pub fn add_warning(&mut self, code: Code, paths: impl IntoIterator<Item = Steps>) {
        self.diags.warning(code, paths);
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diags
    }

    pub fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }

    /// Redirect the client instead of sending a body. Only statuses in `300..400` take
    /// effect; others leave the response to be sent normally.
    pub fn redirect(&mut self, location: impl Into<String>, status: u16) {
        self.redirect = Some((location.into(), status));
    }
}

impl<T: Serialize> Response<T> {
    fn body(&self) -> serde_json::Result<Value> {
        let mut body = Map::new();
        if !self.diags.is_empty() {
            body.insert("diags".to_string(), serde_json::to_value(&self.diags)?);
        }
        if let Some(data) = &self.data {
            body.insert("data".to_string(), serde_json::to_value(data)?);
        }
        Ok(Value::Object(body))
    }
}

impl<T: Serialize> Responder for Response<T> {
    fn has_errors(&self) -> bool {
        self.diags.has_errors()
    }

    fn send(self, ctx: &RequestContext, writer: &mut dyn ResponseWriter) {
        let encoded = self
            .body()
            .map_err(anyhow::Error::from)
            .and_then(|body| self.encoding.encode(&body));

        match encoded {
            Ok(bytes) => {
                writer.set_header("content-type", self.encoding.content_type());
                writer.set_status(self.status());
                writer.write_body(&bytes);
            }
            Err(err) => {
                error!(
                    request_id = %ctx.request_id(),
                    content_type = %self.encoding.content_type(),
                    error = %err,
                    "Failed to encode response body"
                );
                writer.set_status(500);
            }
        }
    }

    fn handle_panic(&mut self, ctx: &RequestContext, payload: PanicPayload) {
        // Nothing produced before the panic can be trusted; under either policy the
        // response finalized afterwards is a bare internal error
        self.data = None;
        self.redirect = None;
        self.status = Some(500);
        self.diags.error(codes::INTERNAL_ERROR, []);

        if self.panic_policy == PanicPolicy::Escalate {
            panic!(
                "request {} panicked: {}",
                ctx.request_id(),
                panic_message(&payload)
            );
        }
    }

    fn as_redirect(&self) -> Option<&dyn Redirect> {
        Some(self)
    }

    fn as_cookie_writer(&self) -> Option<&dyn CookieWriter> {
        Some(self)
    }
}

impl<T> Redirect for Response<T> {
    fn redirect_to(&self) -> (&str, u16) {
        match &self.redirect {
            Some((location, status)) => (location.as_str(), *status),
            None => ("", 0),
        }
    }
}

impl<T> CookieWriter for Response<T> {
    fn write_cookies(&self) -> Vec<Cookie> {
        self.cookies.clone()
    }
}
