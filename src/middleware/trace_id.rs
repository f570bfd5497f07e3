//! Trace ID propagation (§6): accepts `X-Trace-Id` or `X-Request-Id` from the
//! caller, generates one otherwise, and echoes it on every response. The same
//! id (and a small debug context) is made available to error construction via
//! a task-local, so the error envelope's `trace_id` always matches the
//! `X-Trace-Id` response header instead of a freshly minted one.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{json, Value};
use uuid::Uuid;

pub const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("x-trace-id");
const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct TraceId(pub String);

#[derive(Debug, Clone)]
struct PropagatedContext {
    trace_id: String,
    context: Value,
}

tokio::task_local! {
    static CURRENT: PropagatedContext;
}

pub async fn trace_id_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get(TRACE_ID_HEADER)
        .or_else(|| request.headers().get(REQUEST_ID_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(TraceId(trace_id.clone()));

    let propagated = PropagatedContext {
        trace_id: trace_id.clone(),
        context: json!({ "method": request.method().as_str(), "path": request.uri().path() }),
    };

    let mut response = CURRENT.scope(propagated, next.run(request)).await;
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

/// The trace id propagated from the request currently being handled.
/// `None` outside request scope (background workers, tests).
pub fn current_trace_id() -> Option<String> {
    CURRENT.try_with(|c| c.trace_id.clone()).ok()
}

/// The debug context (method + path) propagated from the current request.
pub fn current_context() -> Option<Value> {
    CURRENT.try_with(|c| c.context.clone()).ok()
}
