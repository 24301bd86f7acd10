//! Integration tests for the HTTP server and the pipeline behind it
//!
//! # Test Coverage
//!
//! - Server startup on a random port and shutdown on drop
//! - `/health` answered without touching the endpoint
//! - Echo endpoint over real TCP: success, validation errors, redirects, cookies
//! - Content negotiation via the `Accept` header
//! - Header injection: CR/LF in header values never reaches the wire
//! - Escalated panics: the finalized `500` still reaches the client
//!
//! # Test Fixtures
//!
//! - `TestServer::start()` (in `common`): binds to a random available port and
//!   stops the server when dropped, even if the test panics
//!
//! # Important Notes
//!
//! - Tests use May coroutines with 32KB stack size
//! - Requests are written as raw HTTP/1.1 so headers are exactly what a client sends

use brrt_pipeline::context::RequestContext;
use brrt_pipeline::dispatcher::{handle, Handler};
use brrt_pipeline::echo::echo_endpoint;
use brrt_pipeline::encoding::YamlEncoding;
use brrt_pipeline::response::{RawRequest, Response, StandardResponseFactory};
use brrt_pipeline::runtime_config::PanicPolicy;
use serde_json::Value;
use std::sync::Arc;

mod common;
use common::http::{post_json, send_request};
use common::test_server::TestServer;

fn echo_server() -> TestServer {
    let factory = StandardResponseFactory::json().with_encoding(YamlEncoding);
    TestServer::start(Arc::new(echo_endpoint(factory)))
}

#[test]
fn test_health_endpoint() {
    let server = echo_server();
    let resp = send_request(
        &server.addr(),
        "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert_eq!(resp.status, 200);
    assert_eq!(resp.json(), serde_json::json!({ "status": "ok" }));
}

#[test]
fn test_echo_over_tcp() {
    let server = echo_server();
    let resp = post_json(
        &server.addr(),
        "/echo",
        r#"{"message":"over the wire"}"#,
        "X-Client: server-tests\r\n",
    );

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("application/json"));
    assert!(resp
        .header("set-cookie")
        .is_some_and(|c| c.starts_with("echo_seen=")));
    let body = resp.json();
    assert_eq!(body["data"]["message"], "over the wire");
    assert_eq!(body["data"]["client"], "server-tests");
}

#[test]
fn test_request_id_is_echoed_back() {
    let server = echo_server();
    let resp = post_json(
        &server.addr(),
        "/echo",
        r#"{"message":"id"}"#,
        "X-Request-Id: 01HZX3J3Q2P7Y9S6W6C2N4M8KD\r\n",
    );
    assert_eq!(resp.json()["data"]["request_id"], "01HZX3J3Q2P7Y9S6W6C2N4M8KD");
}

#[test]
fn test_validation_error_over_tcp() {
    let server = echo_server();
    let resp = post_json(&server.addr(), "/echo", r#"{"message":""}"#, "");

    assert_eq!(resp.status, 400);
    let body = resp.json();
    assert_eq!(body["diags"][0]["code"], "invalid_value");
    assert!(body.get("data").is_none());
}

#[test]
fn test_redirect_over_tcp() {
    let server = echo_server();
    let resp = post_json(
        &server.addr(),
        "/echo",
        r#"{"message":"bye","redirect":"/done"}"#,
        "",
    );
    assert_eq!(resp.status, 303);
    assert_eq!(resp.header("location"), Some("/done"));
}

#[test]
fn test_yaml_negotiated_over_tcp() {
    let server = echo_server();
    let resp = post_json(
        &server.addr(),
        "/echo",
        r#"{"message":"yaml please"}"#,
        "Accept: application/yaml, application/json;q=0.5\r\n",
    );
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("application/yaml"));
    let parsed: serde_json::Value = serde_yaml::from_slice(&resp.body).unwrap();
    assert_eq!(parsed["data"]["message"], "yaml please");
}

#[test]
fn test_crlf_redirect_is_rejected_over_tcp() {
    let server = echo_server();
    let resp = post_json(
        &server.addr(),
        "/echo",
        r#"{"message":"hi","redirect":"/x\r\nX-Injected: yes"}"#,
        "",
    );
    assert_eq!(resp.status, 400);
    assert!(resp.header("x-injected").is_none());
    assert!(resp.header("location").is_none());
}

/// Redirects to whatever the body says, without validating it.
struct Reflect;

impl Handler for Reflect {
    type Request = String;
    type Response = Response<Value>;

    fn parse_request(
        &self,
        _ctx: &mut RequestContext,
        raw: &RawRequest,
        _resp: &mut Response<Value>,
    ) -> String {
        String::from_utf8_lossy(raw.body()).into_owned()
    }

    fn validate_request(
        &self,
        _ctx: &mut RequestContext,
        _req: &String,
        _resp: &mut Response<Value>,
    ) {
    }

    fn execute_request(
        &self,
        _ctx: &mut RequestContext,
        req: &String,
        resp: &mut Response<Value>,
    ) {
        resp.redirect(req.clone(), 302);
    }
}

#[test]
fn test_transport_drops_split_headers() {
    let server = TestServer::start(Arc::new(handle(StandardResponseFactory::json(), Reflect)));
    let resp = post_json(&server.addr(), "/reflect", "/x\r\nX-Injected: yes", "");

    assert_eq!(resp.status, 302);
    assert!(resp.header("x-injected").is_none());
    assert!(resp.header("location").is_none());
}

/// Fails in execute, after parse and validate succeeded.
struct Failing;

impl Handler for Failing {
    type Request = ();
    type Response = Response<Value>;

    fn parse_request(
        &self,
        _ctx: &mut RequestContext,
        _raw: &RawRequest,
        _resp: &mut Response<Value>,
    ) {
    }

    fn validate_request(
        &self,
        _ctx: &mut RequestContext,
        _req: &(),
        _resp: &mut Response<Value>,
    ) {
    }

    fn execute_request(&self, _ctx: &mut RequestContext, _req: &(), resp: &mut Response<Value>) {
        resp.set_data(Value::from("half done"));
        panic!("disk full");
    }
}

#[test]
fn test_escalated_panic_still_answers() {
    let factory = StandardResponseFactory::json().with_panic_policy(PanicPolicy::Escalate);
    let server = TestServer::start(Arc::new(handle(factory, Failing)));

    for _ in 0..2 {
        let resp = post_json(&server.addr(), "/fail", "{}", "");
        assert_eq!(resp.status, 500);
        assert_eq!(
            resp.json(),
            serde_json::json!({ "diags": [{"severity": "error", "code": "internal_error"}] })
        );
    }
}
