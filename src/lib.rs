//! # brrt-pipeline
//!
//! **brrt-pipeline** is a typed request-handling pipeline for HTTP endpoints. Every
//! endpoint goes through the same life-cycle: parse → validate → execute → respond.
//!
//! ## Overview
//!
//! An endpoint author supplies a [`Handler`](dispatcher::Handler) with three phases and
//! picks a response type. The [`Dispatcher`](dispatcher::Dispatcher) does the rest:
//!
//! - creates a fresh response per request, with its encoding negotiated from `Accept`
//! - runs the phases in order and stops at the first boundary where the response has
//!   error diagnostics
//! - recovers panics from any phase into a well-formed error response
//! - writes cookies, then either redirects or sends the response, on every exit path
//!
//! ## Architecture
//!
//! - **[`diagnostics`]** - error/warning records, the only way a phase signals failure
//! - **[`context`]** - request-scoped values and cancellation threaded through phases
//! - **[`negotiate`]** - `Accept` header parsing and content negotiation
//! - **[`encoding`]** - JSON and YAML response encodings
//! - **[`response`]** - the response capability contracts and the stock response
//! - **[`dispatcher`]** - the pipeline itself
//! - **[`server`]** - `may_minihttp` transport for an endpoint
//! - **[`runtime_config`]** / **[`logging`]** - environment configuration and `tracing` setup
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as PipelineService<br/>(may_minihttp)
//!     participant Dispatcher
//!     participant Handler
//!     participant Response
//!
//!     Client->>Server: HTTP Request
//!     Server->>Dispatcher: serve(http::Request, BufferedResponse)
//!     Dispatcher->>Response: factory.new_response (negotiate Accept)
//!     Dispatcher->>Handler: parse_request
//!     alt has_errors
//!         Dispatcher->>Response: finalize
//!     end
//!     Dispatcher->>Handler: validate_request
//!     alt has_errors
//!         Dispatcher->>Response: finalize
//!     end
//!     Dispatcher->>Handler: execute_request
//!     alt Handler Panics
//!         Dispatcher->>Response: handle_panic
//!     end
//!     Dispatcher->>Response: cookies, then redirect or send
//!     Server-->>Client: HTTP Response
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrt_pipeline::context::RequestContext;
//! use brrt_pipeline::diagnostics::{codes, Steps};
//! use brrt_pipeline::dispatcher::{handle, Endpoint, Handler};
//! use brrt_pipeline::response::{RawRequest, Response, StandardResponseFactory};
//! use brrt_pipeline::server::BufferedResponse;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Deserialize)]
//! struct AddPet {
//!     name: String,
//! }
//!
//! #[derive(Serialize)]
//! struct Pet {
//!     id: u64,
//!     name: String,
//! }
//!
//! struct AddPetHandler;
//!
//! impl Handler for AddPetHandler {
//!     type Request = AddPet;
//!     type Response = Response<Pet>;
//!
//!     fn parse_request(
//!         &self,
//!         _ctx: &mut RequestContext,
//!         raw: &RawRequest,
//!         resp: &mut Response<Pet>,
//!     ) -> AddPet {
//!         serde_json::from_slice(raw.body()).unwrap_or_else(|_| {
//!             resp.add_error(codes::MALFORMED_BODY, []);
//!             AddPet::default()
//!         })
//!     }
//!
//!     fn validate_request(
//!         &self,
//!         _ctx: &mut RequestContext,
//!         req: &AddPet,
//!         resp: &mut Response<Pet>,
//!     ) {
//!         if req.name.is_empty() {
//!             resp.add_error(codes::MISSING_FIELD, [Steps::root().field("name")]);
//!         }
//!     }
//!
//!     fn execute_request(
//!         &self,
//!         _ctx: &mut RequestContext,
//!         req: &AddPet,
//!         resp: &mut Response<Pet>,
//!     ) {
//!         resp.set_status(201);
//!         resp.set_data(Pet { id: 1, name: req.name.clone() });
//!     }
//! }
//!
//! let endpoint = handle(StandardResponseFactory::json(), AddPetHandler);
//!
//! let req = http::Request::post("/pets").body(br#"{"name":"Fluffy"}"#.to_vec()).unwrap();
//! let mut out = BufferedResponse::new();
//! endpoint.serve(&req, &mut out);
//! assert_eq!(out.status(), 201);
//! ```
//!
//! ## Runtime Considerations
//!
//! The bundled server uses the `may` coroutine runtime, not tokio. Each connection is a
//! coroutine; the stack size is configurable via `BRRTR_STACK_SIZE`. The pipeline
//! itself never blocks or yields.
//!
//! Release builds must keep `panic = "unwind"`: panic recovery relies on
//! `catch_unwind`.

pub mod cli;
pub mod context;
pub mod diagnostics;
pub mod dispatcher;
pub mod echo;
pub mod encoding;
pub mod ids;
pub mod logging;
pub mod negotiate;
pub mod response;
pub mod runtime_config;
pub mod server;

pub use context::RequestContext;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use dispatcher::{handle, Dispatcher, Endpoint, Handler, Outcome, Phase};
pub use response::{
    Cookie, CookieWriter, Redirect, Responder, Response, ResponseFactory, ResponseWriter,
    StandardResponseFactory,
};
