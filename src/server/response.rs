use crate::response::ResponseWriter;
use once_cell::sync::Lazy;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::warn;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Upper bound on distinct header lines ever handed to `may_minihttp`.
pub const MAX_INTERNED_HEADER_LINES: usize = 4096;

/// Stack-allocated header storage, names lowercased
pub type HeaderVec = SmallVec<[(String, String); MAX_INLINE_HEADERS]>;

/// A [`ResponseWriter`] that records everything in memory.
///
/// The dispatcher writes into it; the transport then copies it onto the wire with
/// [`write_to`](Self::write_to), or tests inspect it via [`into_http`](Self::into_http).
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    status: u16,
    headers: HeaderVec,
    body: Vec<u8>,
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferedResponse {
    /// Empty `200` response.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// First value of a header (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a header, in the order written.
    #[must_use]
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into an `http::Response`. Headers that are not valid HTTP are dropped
    /// with a warning; an out-of-range status becomes `500`.
    #[must_use]
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let mut builder = http::Response::builder().status(
            http::StatusCode::from_u16(self.status)
                .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR),
        );
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in &self.headers {
                match (
                    http::HeaderName::from_bytes(name.as_bytes()),
                    http::HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(value)) => {
                        headers.append(name, value);
                    }
                    _ => warn!(header = %name, "Dropping invalid response header"),
                }
            }
        }
        builder.body(self.body).unwrap_or_else(|_| {
            let mut fallback = http::Response::new(Vec::new());
            *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }

    /// Copy onto a `may_minihttp` response. `may_minihttp` adds `Content-Length` itself.
    pub fn write_to(self, res: &mut may_minihttp::Response) {
        res.status_code(self.status as usize, status_reason(self.status));
        for line in self.wire_header_lines() {
            res.header(line);
        }
        res.body_vec(self.body);
    }
}

/// True if `name: value` is a legal header line. CR, LF and other control bytes
/// in either part would let a value start a new header or end the head early.
fn is_valid_header(name: &str, value: &str) -> bool {
    if http::HeaderName::from_bytes(name.as_bytes()).is_err()
        || http::HeaderValue::from_str(value).is_err()
    {
        warn!(header = %name.escape_debug(), "Dropping invalid response header");
        return false;
    }
    true
}

impl BufferedResponse {
    /// Header lines as written to the wire. `Content-Length` is left to the transport.
    fn wire_header_lines(&self) -> Vec<&'static str> {
        self.headers
            .iter()
            .filter(|(name, _)| name != "content-length")
            .filter_map(|(name, value)| {
                let line = intern_header_line(name, value);
                if line.is_none() {
                    warn!(header = %name, "Header line table full, dropping header");
                }
                line
            })
            .collect()
    }
}

impl ResponseWriter for BufferedResponse {
    fn set_header(&mut self, name: &str, value: &str) {
        if !is_valid_header(name, value) {
            return;
        }
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers
            .push((name.to_ascii_lowercase(), value.to_string()));
    }

    fn append_header(&mut self, name: &str, value: &str) {
        if !is_valid_header(name, value) {
            return;
        }
        self.headers
            .push((name.to_ascii_lowercase(), value.to_string()));
    }

    fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    fn write_body(&mut self, body: &[u8]) {
        self.body.extend_from_slice(body);
    }
}

/// Reason phrase for a status line.
fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

static HEADER_LINES: Lazy<RwLock<HashSet<&'static str>>> =
    Lazy::new(|| RwLock::new(HashSet::new()));

/// `may_minihttp` only accepts `&'static str` header lines. Each distinct line is
/// leaked once and reused; once [`MAX_INTERNED_HEADER_LINES`] lines exist, new ones
/// are refused and `None` is returned. Handlers should keep header values that vary
/// per request (ids, timestamps) out of responses served this way.
// TODO: drop the interner once the may_minihttp fork accepts owned header lines.
fn intern_header_line(name: &str, value: &str) -> Option<&'static str> {
    let line = format!("{name}: {value}");
    {
        let lines = HEADER_LINES.read().unwrap_or_else(|p| p.into_inner());
        if let Some(existing) = lines.get(line.as_str()) {
            return Some(*existing);
        }
    }

    let mut lines = HEADER_LINES.write().unwrap_or_else(|p| p.into_inner());
    if let Some(existing) = lines.get(line.as_str()) {
        return Some(*existing);
    }
    if lines.len() >= MAX_INTERNED_HEADER_LINES {
        return None;
    }
    let leaked: &'static str = Box::leak(line.into_boxed_str());
    lines.insert(leaked);
    Some(leaked)
}

/// Number of distinct header lines leaked so far.
#[must_use]
pub fn interned_header_lines() -> usize {
    HEADER_LINES
        .read()
        .unwrap_or_else(|p| p.into_inner())
        .len()
}
