//! # Dispatcher Module
//!
//! The dispatcher drives every request through the same life-cycle:
//! parse → validate → execute → respond.
//!
//! ## Overview
//!
//! A [`Dispatcher`] wires a [`ResponseFactory`](crate::response::ResponseFactory) and a
//! [`Handler`] into one [`Endpoint`]. It owns the control flow:
//!
//! - creates a fresh response per request
//! - runs the handler's phases strictly in order
//! - stops at the first phase boundary where the response has errors
//! - contains panics from any phase and hands them to the response
//! - finalizes the response on every exit path
//!
//! ## Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport
//!     participant D as Dispatcher
//!     participant F as ResponseFactory
//!     participant H as Handler
//!     participant R as Response
//!
//!     T->>D: serve(request, writer)
//!     D->>F: new_response(ctx, request)
//!     F-->>D: response (encoding negotiated)
//!     D->>R: has_errors()?
//!     D->>H: parse_request(ctx, request, response)
//!     D->>R: has_errors()?
//!     D->>H: validate_request(ctx, req, response)
//!     D->>R: has_errors()?
//!     D->>H: execute_request(ctx, req, response)
//!     alt any phase panics
//!         D->>R: handle_panic(ctx, payload)
//!     end
//!     D->>R: write_cookies() (if CookieWriter)
//!     alt redirect_to() status in 300..400
//!         D->>T: redirect(location, status)
//!     else
//!         D->>R: send(ctx, writer)
//!     end
//! ```
//!
//! ## Error Handling
//!
//! - Expected problems (bad input, failed validation) are diagnostics on the response.
//!   The dispatcher only ever asks `has_errors()`.
//! - Unexpected failures (panics) are caught around all three phases and turned into
//!   whatever terminal state `handle_panic` leaves the response in. The response is
//!   still finalized, so the client always gets a well-formed answer.
//!
//! ## Concurrency
//!
//! The dispatcher is stateless. Factory and handler are `Send + Sync` and shared
//! read-only by every request; the response belongs to a single request.

mod core;

pub use core::{handle, Dispatcher, Endpoint, Handler, Outcome, Phase};
