//! # Encoding Module
//!
//! Strategies for turning a response body into bytes.
//!
//! An [`Encoding`] pairs a content type with a serialize function. The
//! [`StandardResponseFactory`](crate::response::StandardResponseFactory) holds a set of
//! them and picks one per request by content negotiation; the chosen encoding is fixed
//! for the life of the response and used by `send` for both the body and the
//! `Content-Type` header.
//!
//! Bodies are handed over as [`serde_json::Value`] so the trait stays object safe and
//! any `Serialize` payload can be encoded by any registered encoding.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fmt::Debug;

/// A content type together with the function producing it.
pub trait Encoding: Debug + Send + Sync {
    /// Value for the `Content-Type` header, e.g. `application/json`.
    fn content_type(&self) -> &str;

    /// Serialize `body`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented in this encoding.
    fn encode(&self, body: &Value) -> Result<Vec<u8>>;
}

/// `application/json` via `serde_json`. The usual default encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoding;

impl Encoding for JsonEncoding {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn encode(&self, body: &Value) -> Result<Vec<u8>> {
        serde_json::to_vec(body).context("failed to encode JSON body")
    }
}

/// `application/yaml` via `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlEncoding;

impl Encoding for YamlEncoding {
    fn content_type(&self) -> &str {
        "application/yaml"
    }

    fn encode(&self, body: &Value) -> Result<Vec<u8>> {
        serde_yaml::to_string(body)
            .map(String::into_bytes)
            .context("failed to encode YAML body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_encoding() {
        let bytes = JsonEncoding.encode(&json!({"a": 1})).unwrap();
        assert_eq!(bytes, br#"{"a":1}"#);
        assert_eq!(JsonEncoding.content_type(), "application/json");
    }

    #[test]
    fn test_yaml_encoding() {
        let bytes = YamlEncoding.encode(&json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap().trim(), "a: 1");
        assert_eq!(YamlEncoding.content_type(), "application/yaml");
    }
}
