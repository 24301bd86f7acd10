//! # Response Module
//!
//! The contracts a response must satisfy, the optional capabilities the dispatcher
//! looks for, and a stock implementation.
//!
//! ## Capability Set
//!
//! | Trait | Required | Used by the dispatcher for |
//! |-------|----------|----------------------------|
//! | [`Responder`] | yes | `has_errors` between phases, `handle_panic`, `send` |
//! | [`Redirect`] | no | redirecting instead of sending when the status is 3xx |
//! | [`CookieWriter`] | no | writing cookies before redirect-or-send |
//!
//! Optional capabilities are not supertraits. A response opts in by returning
//! `Some(self)` from [`Responder::as_redirect`] or [`Responder::as_cookie_writer`];
//! the defaults return `None`. Redirect and cookie writing are independent of each
//! other and both are checked on every response.
//!
//! ## Factories
//!
//! A [`ResponseFactory`] creates one response per request. Any
//! `Fn(&RequestContext, &RawRequest) -> R` is a factory; [`StandardResponseFactory`]
//! additionally negotiates the encoding from the request's `Accept` header.
//!
//! ## Stock Response
//!
//! [`Response<T>`](Response) accumulates [`Diagnostics`](crate::diagnostics::Diagnostics),
//! a status and a payload `T`, and supports both optional capabilities.

mod core;
mod standard;

pub use core::{
    panic_message, Cookie, CookieWriter, PanicPayload, RawRequest, Redirect, Responder,
    ResponseFactory, ResponseWriter, SameSite,
};
pub use standard::{Response, StandardResponseFactory};
