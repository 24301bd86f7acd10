use super::request::to_http_request;
use super::response::BufferedResponse;
use crate::dispatcher::Endpoint;
use crate::response::{panic_message, ResponseWriter};
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, warn};

/// `HttpService` running every request through one [`Endpoint`].
///
/// There is no routing: the endpoint sees every path except `GET /health`.
///
/// A panic escalated out of the endpoint (see
/// [`PanicPolicy::Escalate`](crate::runtime_config::PanicPolicy::Escalate)) stops here:
/// it is logged at `error!` and the already finalized response is still written.
#[derive(Clone)]
pub struct PipelineService {
    endpoint: Arc<dyn Endpoint>,
}

impl PipelineService {
    pub fn new(endpoint: Arc<dyn Endpoint>) -> Self {
        Self { endpoint }
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
pub fn health_endpoint(res: &mut Response) -> io::Result<()> {
    let mut out = BufferedResponse::new();
    out.set_header("content-type", "application/json");
    out.write_body(br#"{"status":"ok"}"#);
    out.write_to(res);
    Ok(())
}

fn bad_request(res: &mut Response, err: &io::Error) {
    warn!(error = %err, "Rejecting unparseable request");
    let mut out = BufferedResponse::new();
    out.set_status(400);
    out.set_header("content-type", "application/json");
    out.write_body(
        serde_json::json!({ "error": "Bad Request" })
            .to_string()
            .as_bytes(),
    );
    out.write_to(res);
}

impl HttpService for PipelineService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        if req.method() == "GET" && req.path() == "/health" {
            return health_endpoint(res);
        }

        let raw = match to_http_request(req) {
            Ok(raw) => raw,
            Err(err) => {
                bad_request(res, &err);
                return Ok(());
            }
        };

        let mut out = BufferedResponse::new();
        let served =
            panic::catch_unwind(AssertUnwindSafe(|| self.endpoint.serve(&raw, &mut out)));
        if let Err(payload) = served {
            // The response was finalized before the escalation; deliver it and keep
            // the connection coroutine alive
            error!(
                method = %raw.method(),
                path = %raw.uri().path(),
                status = out.status(),
                panic_message = %panic_message(&payload),
                "Escalated handler panic reached the transport"
            );
        }
        out.write_to(res);
        Ok(())
    }
}
