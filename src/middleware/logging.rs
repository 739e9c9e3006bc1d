//! Request logging middleware
//!
//! `TraceLayer` opens a span per request; [`log_requests`] records the
//! outcome and duration of every request and flags slow ones.

use std::time::{Duration, Instant};

use axum::{extract::Request, middleware::Next, response::Response};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{debug, info, warn, Level};

/// Requests slower than this are logged at warn level
const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_secs(2);

pub type HttpTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse>;

pub fn http_trace_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::DEBUG)
                .latency_unit(LatencyUnit::Millis),
        )
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    let duration_ms = elapsed.as_millis() as u64;

    if elapsed > SLOW_REQUEST_THRESHOLD {
        warn!(method = %method, path = %path, status = status, duration_ms = duration_ms, "Slow request");
    } else if response.status().is_server_error() {
        warn!(method = %method, path = %path, status = status, duration_ms = duration_ms, "Request failed");
    } else if path == "/health" || path == "/ready" {
        debug!(method = %method, path = %path, status = status, duration_ms = duration_ms, "Probe");
    } else {
        info!(method = %method, path = %path, status = status, duration_ms = duration_ms, "Request handled");
    }

    response
}
