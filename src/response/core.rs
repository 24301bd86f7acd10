use crate::context::RequestContext;
use std::any::Any;
use std::fmt::{self, Display, Formatter};

/// The transport-level request handed to the pipeline.
pub type RawRequest = http::Request<Vec<u8>>;

/// Value recovered from a panic by `std::panic::catch_unwind`.
pub type PanicPayload = Box<dyn Any + Send + 'static>;

/// Best-effort human readable message from a panic payload.
#[must_use]
pub fn panic_message(payload: &PanicPayload) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Output sink the pipeline writes the final response into.
///
/// Implemented by the transport layer; see
/// [`BufferedResponse`](crate::server::BufferedResponse).
pub trait ResponseWriter {
    /// Set a header, replacing any previous value of the same name.
    fn set_header(&mut self, name: &str, value: &str);

    /// Add a header without removing existing values of the same name.
    fn append_header(&mut self, name: &str, value: &str);

    fn set_status(&mut self, status: u16);

    /// Append bytes to the body.
    fn write_body(&mut self, body: &[u8]);

    fn set_cookie(&mut self, cookie: &Cookie) {
        self.append_header("set-cookie", &cookie.to_header_value());
    }

    /// Point the client at `location` with a 3xx `status`.
    fn redirect(&mut self, location: &str, status: u16) {
        self.set_header("location", location);
        self.set_status(status);
    }
}

/// Contract every response type must satisfy.
///
/// A response is created once per request by a [`ResponseFactory`], mutated by the
/// handler's phases, and consumed by [`send`](Self::send). Consuming `self` means a
/// response can be sent at most once and never touched afterwards.
///
/// The two optional capabilities, [`Redirect`] and [`CookieWriter`], are exposed through
/// [`as_redirect`](Self::as_redirect) and [`as_cookie_writer`](Self::as_cookie_writer).
/// The dispatcher checks both, independently, on every response.
pub trait Responder {
    /// True iff processing should not proceed. Called repeatedly; must not have side
    /// effects.
    fn has_errors(&self) -> bool;

    /// Serialize the response and write it to `writer`.
    fn send(self, ctx: &RequestContext, writer: &mut dyn ResponseWriter);

    /// Put the response into a sendable error state after a phase panicked.
    ///
    /// Test and diagnostic builds may panic here instead to escalate the failure; the
    /// dispatcher still finalizes the response before re-raising.
    fn handle_panic(&mut self, ctx: &RequestContext, payload: PanicPayload);

    fn as_redirect(&self) -> Option<&dyn Redirect> {
        None
    }

    fn as_cookie_writer(&self) -> Option<&dyn CookieWriter> {
        None
    }
}

/// A response that sometimes answers by redirecting the client.
pub trait Redirect {
    /// URL and status to redirect with. A status in `300..400` makes the dispatcher
    /// redirect instead of calling [`Responder::send`]; anything else sends normally.
    fn redirect_to(&self) -> (&str, u16);
}

/// A response that writes cookies.
pub trait CookieWriter {
    /// Cookies to set. Always written, whether the response redirects or sends.
    fn write_cookies(&self) -> Vec<Cookie>;
}

/// Produces a fresh response for each incoming request.
///
/// Configured once and shared by every request, so it must be safe for concurrent
/// read-only use.
pub trait ResponseFactory: Send + Sync {
    type Response: Responder;

    fn new_response(&self, ctx: &RequestContext, req: &RawRequest) -> Self::Response;
}

impl<F, R> ResponseFactory for F
where
    F: Fn(&RequestContext, &RawRequest) -> R + Send + Sync,
    R: Responder,
{
    type Response = R;

    fn new_response(&self, ctx: &RequestContext, req: &RawRequest) -> R {
        self(ctx, req)
    }
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl Display for SameSite {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// A cookie to send with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// Lifetime in seconds; zero or negative deletes the cookie
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Render as a `Set-Cookie` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(max_age) = self.max_age {
            // Set-Cookie has no negative Max-Age
            out.push_str(&format!("; Max-Age={}", max_age.max(0)));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if let Some(same_site) = self.same_site {
            out.push_str(&format!("; SameSite={same_site}"));
        }
        out
    }
}
