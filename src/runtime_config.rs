//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the pipeline and the bundled server.
//!
//! ## Environment Variables
//!
//! ### `BRRTR_STACK_SIZE`
//!
//! Stack size for the `may` coroutines serving requests. Accepts values in:
//! - Decimal: `16384` (16 KB)
//! - Hexadecimal: `0x4000` (16 KB)
//!
//! Default: `0x4000` (16 KB)
//!
//! Handlers run on this stack, including any panic unwinding out of them. Deep
//! serde structures need more than the default:
//! - Simple handlers: `0x4000` (16 KB)
//! - Large request bodies: `0x8000` (32 KB)
//! - Deep recursion: `0x10000` (64 KB)
//!
//! ### `BRRTR_PANIC_POLICY`
//!
//! What the stock [`Response`](crate::response::Response) does when a phase panics:
//! - `recover` (default): answer `500` with an `internal_error` diagnostic
//! - `escalate`: finalize the same `500`, then re-raise the panic from
//!   [`Endpoint::serve`](crate::dispatcher::Endpoint::serve) so tests fail loudly. The
//!   bundled server stops the re-raised panic at the transport, logs it at `error!`
//!   and still writes the `500`.
//!
//! ### `BRRTR_ADDR`
//!
//! Address the bundled server binds to. Default: `0.0.0.0:8080`.
//!
//! ## Usage
//!
//! ```rust
//! use brrt_pipeline::runtime_config::PipelineConfig;
//!
//! let config = PipelineConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;

const DEFAULT_STACK_SIZE: usize = 0x4000;
const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// How a panic inside a handler phase is surfaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanicPolicy {
    /// Turn the panic into a well-formed `500` response.
    #[default]
    Recover,
    /// Finalize the `500` response, then let the panic continue. For tests.
    Escalate,
}

impl PanicPolicy {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "escalate" => PanicPolicy::Escalate,
            _ => PanicPolicy::Recover,
        }
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Stack size for coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
    /// Panic handling of stock responses
    pub panic_policy: PanicPolicy,
    /// Bind address of the bundled server
    pub addr: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            panic_policy: PanicPolicy::Recover,
            addr: DEFAULT_ADDR.to_string(),
        }
    }
}

/// Parse a size in decimal or `0x`-prefixed hexadecimal.
fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let stack_size = lookup("BRRTR_STACK_SIZE")
            .and_then(|v| parse_size(&v))
            .unwrap_or(DEFAULT_STACK_SIZE);
        let panic_policy = lookup("BRRTR_PANIC_POLICY")
            .map(|v| PanicPolicy::parse(&v))
            .unwrap_or_default();
        let addr = lookup("BRRTR_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        PipelineConfig {
            stack_size,
            panic_policy,
            addr,
        }
    }
}
