use crate::response::RawRequest;
use may_minihttp::Request;
use std::io::{self, Read};
use tracing::{debug, info};

/// Convert a `may_minihttp` request into the [`RawRequest`] the pipeline works on.
///
/// Method, URI (path and query), headers and the full body are carried over.
///
/// # Errors
///
/// Returns `InvalidData` if the method, URI or a header is not valid HTTP, or the
/// underlying error if the body cannot be read.
pub fn to_http_request(req: Request) -> io::Result<RawRequest> {
    let method = http::Method::from_bytes(req.method().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let uri: http::Uri = req
        .path()
        .parse()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut builder = http::Request::builder().method(method).uri(uri);
    let mut header_count = 0usize;
    for h in req.headers() {
        let name = http::HeaderName::from_bytes(h.name.as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let value = http::HeaderValue::from_bytes(h.value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        builder = builder.header(name, value);
        header_count += 1;
    }
    debug!(header_count = header_count, "Headers extracted");

    // body() consumes the request, so it goes last
    let mut body = Vec::new();
    req.body().read_to_end(&mut body)?;
    if !body.is_empty() {
        debug!(body_size_bytes = body.len(), "Request body read");
    }

    let raw = builder
        .body(body)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    info!(
        method = %raw.method(),
        path = %raw.uri().path(),
        headers_count = header_count,
        "HTTP request parsed"
    );
    Ok(raw)
}
