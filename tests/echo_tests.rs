//! End-to-end tests of the echo endpoint without a network
//!
//! # Test Coverage
//!
//! - Clean flow: JSON body in, `{"data": ...}` out with a cookie
//! - Parse and validate failures: diagnostics in the body, execute never runs
//! - Warnings: still a 2xx response, warning listed alongside the data
//! - Redirects: 303 with `Location`, no body
//! - Panic recovery with the stock response: 500 with an `internal_error` diagnostic
//! - YAML output when the client asks for it

use brrt_pipeline::context::RequestContext;
use brrt_pipeline::dispatcher::{handle, Endpoint, Handler, Outcome, Phase};
use brrt_pipeline::echo::{echo_endpoint, EchoHandler, EchoRequest, MAX_MESSAGE_CHARS};
use brrt_pipeline::encoding::YamlEncoding;
use brrt_pipeline::response::{RawRequest, StandardResponseFactory};
use brrt_pipeline::runtime_config::PanicPolicy;
use brrt_pipeline::server::BufferedResponse;
use serde_json::{json, Value};

fn post() -> http::request::Builder {
    http::Request::post("/echo").header("content-type", "application/json")
}

fn send(endpoint: &dyn Endpoint, req: RawRequest) -> (Outcome, http::Response<Vec<u8>>) {
    let mut out = BufferedResponse::new();
    let outcome = endpoint.serve(&req, &mut out);
    (outcome, out.into_http())
}

fn json_body(resp: &http::Response<Vec<u8>>) -> Value {
    serde_json::from_slice(resp.body()).unwrap()
}

fn echo() -> impl Endpoint {
    echo_endpoint(StandardResponseFactory::json())
}

#[test]
fn test_echo_clean_flow() {
    let body = r#"{"message":"hello"}"#;
    let req = post()
        .header("x-client", "tests")
        .header("x-request-id", "01HZX3J3Q2P7Y9S6W6C2N4M8KD")
        .body(body.as_bytes().to_vec())
        .unwrap();
    let (outcome, resp) = send(&echo(), req);

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "application/json");
    assert_eq!(
        json_body(&resp),
        json!({
            "data": {
                "message": "hello",
                "request_id": "01HZX3J3Q2P7Y9S6W6C2N4M8KD",
                "client": "tests"
            }
        })
    );
    let cookie = resp.headers()["set-cookie"].to_str().unwrap();
    assert_eq!(
        cookie,
        "echo_seen=1; Path=/; HttpOnly; SameSite=Lax"
    );
}

#[test]
fn test_echo_missing_message_reports_path() {
    let body = r#"{}"#;
    let req = post().body(body.as_bytes().to_vec()).unwrap();
    let (outcome, resp) = send(&echo(), req);

    assert_eq!(outcome, Outcome::Aborted(Phase::Validate));
    assert_eq!(resp.status(), 400);
    assert!(resp.headers().get("set-cookie").is_none());
    assert_eq!(
        json_body(&resp),
        json!({
            "diags": [{"severity": "error", "code": "missing_field", "paths": [["message"]]}]
        })
    );
}

#[test]
fn test_echo_bad_redirect_collects_every_validation_error() {
    let body = r#"{"message":"  ","redirect":"https://elsewhere"}"#;
    let req = post().body(body.as_bytes().to_vec()).unwrap();
    let (_, resp) = send(&echo(), req);

    let body = json_body(&resp);
    let codes: Vec<_> = body["diags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| (d["code"].as_str().unwrap(), d["paths"][0][0].as_str().unwrap()))
        .collect();
    assert_eq!(
        codes,
        vec![("invalid_value", "message"), ("invalid_value", "redirect")]
    );
}

#[test]
fn test_echo_malformed_body() {
    let req = post().body(b"{not json".to_vec()).unwrap();
    let (outcome, resp) = send(&echo(), req);

    assert_eq!(outcome, Outcome::Aborted(Phase::Parse));
    assert_eq!(resp.status(), 400);
    assert_eq!(json_body(&resp)["diags"][0]["code"], "malformed_body");
}

#[test]
fn test_echo_rejects_non_json_content_type() {
    let req = http::Request::post("/echo")
        .header("content-type", "text/plain")
        .body(b"hello".to_vec())
        .unwrap();
    let (_, resp) = send(&echo(), req);

    assert_eq!(resp.status(), 415);
    assert_eq!(json_body(&resp)["diags"][0]["code"], "unsupported_media_type");
}

#[test]
fn test_echo_long_message_warns_but_succeeds() {
    let long = "x".repeat(MAX_MESSAGE_CHARS + 20);
    let body = json!({ "message": long }).to_string();
    let req = post().body(body.into_bytes()).unwrap();
    let (outcome, resp) = send(&echo(), req);

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(resp.status(), 200);
    let body = json_body(&resp);
    assert_eq!(body["diags"][0]["severity"], "warning");
    assert_eq!(body["diags"][0]["code"], "message_truncated");
    assert_eq!(
        body["data"]["message"].as_str().unwrap().chars().count(),
        MAX_MESSAGE_CHARS
    );
}

#[test]
fn test_echo_redirect() {
    let body = r#"{"message":"hi","redirect":"/thanks"}"#;
    let req = post().body(body.as_bytes().to_vec()).unwrap();
    let (outcome, resp) = send(&echo(), req);

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers()["location"], "/thanks");
    assert!(resp.headers().get("set-cookie").is_some());
    assert!(resp.body().is_empty());
}

#[test]
fn test_echo_refuses_off_site_redirects() {
    for target in [
        "//evil.example/phish",
        "/\\evil.example/phish",
        "/x\r\nX-Injected: yes",
        "/tab\there",
    ] {
        let body = json!({ "message": "hi", "redirect": target }).to_string();
        let req = post().body(body.into_bytes()).unwrap();
        let (outcome, resp) = send(&echo(), req);

        assert_eq!(outcome, Outcome::Aborted(Phase::Validate), "{target:?}");
        assert_eq!(resp.status(), 400);
        assert!(resp.headers().get("location").is_none());
        assert!(resp.headers().get("x-injected").is_none());
        let body = json_body(&resp);
        assert_eq!(body["diags"][0]["code"], "invalid_value");
        assert_eq!(body["diags"][0]["paths"], json!([["redirect"]]));
    }
}

#[test]
fn test_echo_yaml_when_requested() {
    let endpoint =
        echo_endpoint(StandardResponseFactory::json().with_encoding(YamlEncoding));
    let body = r#"{"message":"hello"}"#;
    let req = post()
        .header("accept", "application/yaml")
        .body(body.as_bytes().to_vec())
        .unwrap();
    let (_, resp) = send(&endpoint, req);

    assert_eq!(resp.headers()["content-type"], "application/yaml");
    let parsed: Value = serde_yaml::from_slice(resp.body()).unwrap();
    assert_eq!(parsed["data"]["message"], "hello");
}

/// Echo handler whose execute phase panics after producing output.
struct Exploding;

impl Handler for Exploding {
    type Request = EchoRequest;
    type Response = <EchoHandler as Handler>::Response;

    fn parse_request(
        &self,
        ctx: &mut RequestContext,
        raw: &RawRequest,
        resp: &mut Self::Response,
    ) -> EchoRequest {
        EchoHandler.parse_request(ctx, raw, resp)
    }

    fn validate_request(
        &self,
        ctx: &mut RequestContext,
        req: &EchoRequest,
        resp: &mut Self::Response,
    ) {
        EchoHandler.validate_request(ctx, req, resp)
    }

    fn execute_request(
        &self,
        ctx: &mut RequestContext,
        req: &EchoRequest,
        resp: &mut Self::Response,
    ) {
        EchoHandler.execute_request(ctx, req, resp);
        panic!("storage unavailable");
    }
}

#[test]
fn test_panic_becomes_internal_error() {
    let endpoint = handle(StandardResponseFactory::json(), Exploding);
    let body = r#"{"message":"hello","redirect":"/thanks"}"#;
    let req = post().body(body.as_bytes().to_vec()).unwrap();
    let (outcome, resp) = send(&endpoint, req);

    assert_eq!(outcome, Outcome::Panicked(Phase::Execute));
    assert_eq!(resp.status(), 500);
    assert!(resp.headers().get("location").is_none());
    // cookies set before the panic are still written
    assert!(resp.headers().get("set-cookie").is_some());
    assert_eq!(
        json_body(&resp),
        json!({ "diags": [{"severity": "error", "code": "internal_error"}] })
    );
}

#[test]
#[should_panic(expected = "storage unavailable")]
fn test_escalate_policy_propagates_panic() {
    let factory: StandardResponseFactory<_> =
        StandardResponseFactory::json().with_panic_policy(PanicPolicy::Escalate);
    let endpoint = handle(factory, Exploding);
    let body = r#"{"message":"hello"}"#;
    let req = post().body(body.as_bytes().to_vec()).unwrap();
    let _ = send(&endpoint, req);
}
