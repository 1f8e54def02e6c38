//! Request logging middleware configuration

use axum::body::Body;
use http::{Request, Response};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, ServerErrorsFailureClass, SharedClassifier};
use tower_http::trace::{DefaultOnBodyChunk, DefaultOnEos, TraceLayer};
use tracing::{info_span, Span};

pub type HttpTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    fn(&Request<Body>) -> Span,
    fn(&Request<Body>, &Span),
    fn(&Response<Body>, Duration, &Span),
    DefaultOnBodyChunk,
    DefaultOnEos,
    fn(ServerErrorsFailureClass, Duration, &Span),
>;

pub fn logging_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(make_span as fn(&Request<Body>) -> Span)
        .on_request(on_request as fn(&Request<Body>, &Span))
        .on_response(on_response as fn(&Response<Body>, Duration, &Span))
        .on_failure(on_failure as fn(ServerErrorsFailureClass, Duration, &Span))
}

fn make_span(request: &Request<Body>) -> Span {
    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        query = ?request.uri().query(),
        version = ?request.version(),
    )
}

fn on_request(request: &Request<Body>, _span: &Span) {
    tracing::debug!(
        "started processing request {} {}",
        request.method(),
        request.uri().path()
    );
}

fn on_response(response: &Response<Body>, latency: Duration, _span: &Span) {
    let status = response.status();
    let latency_ms = latency.as_millis();

    if status.is_success() || status.is_informational() || status.is_redirection() {
        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency_ms,
            "request completed successfully"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            status = status.as_u16(),
            latency_ms = latency_ms,
            "client error response"
        );
    } else {
        tracing::error!(
            status = status.as_u16(),
            latency_ms = latency_ms,
            "server error response"
        );
    }
}

fn on_failure(error: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    tracing::error!(
        latency_ms = latency.as_millis(),
        error = ?error,
        "request failed"
    );
}
