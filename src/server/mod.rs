//! # Server Module
//!
//! Serves an [`Endpoint`](crate::dispatcher::Endpoint) over HTTP with `may_minihttp`.
//!
//! - [`to_http_request`] turns the wire request into an `http::Request<Vec<u8>>`
//! - [`BufferedResponse`] is the [`ResponseWriter`](crate::response::ResponseWriter) the
//!   dispatcher writes into; it is copied onto the wire afterwards
//! - [`PipelineService`] is the `HttpService` gluing the two together
//! - [`HttpServer`] starts it and returns a [`ServerHandle`]
//!
//! Each connection is served on its own `may` coroutine, so requests are processed
//! concurrently while each request's pipeline runs synchronously.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::to_http_request;
pub use response::{
    interned_header_lines, BufferedResponse, HeaderVec, MAX_INLINE_HEADERS,
    MAX_INTERNED_HEADER_LINES,
};
pub use service::{health_endpoint, PipelineService};
