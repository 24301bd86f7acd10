//! # Diagnostics Module
//!
//! Structured records of problems found while processing a request.
//!
//! ## Overview
//!
//! Every phase of the pipeline reports problems by appending a [`Diagnostic`] to the
//! response rather than returning an error. A diagnostic carries:
//!
//! - a [`Severity`] - `error` aborts the pipeline at the next phase boundary, `warning`
//!   is informational only
//! - a [`Code`] identifying the problem class (see [`codes`])
//! - zero or more [`Steps`] locating the problem inside the request
//!
//! The dispatcher never looks inside the collection; it only asks
//! [`Diagnostics::has_errors`].
//!
//! ## Wire Format
//!
//! ```json
//! {
//!   "severity": "error",
//!   "code": "missing_field",
//!   "paths": [["pets", 0, "name"]]
//! }
//! ```
//!
//! `paths` is omitted when empty.

mod core;

pub use core::{codes, Code, Diagnostic, Diagnostics, Severity, Step, Steps};
