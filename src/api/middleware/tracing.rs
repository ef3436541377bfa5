//! HTTP request/response tracing middleware.

use axum::{body::Body, http::Request, http::header};
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{Level, Span};

type MakeSpan = for<'a> fn(&'a Request<Body>) -> Span;

fn make_span(req: &Request<Body>) -> Span {
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        user_agent,
    )
}

/// Request span with method, path and user agent, plus a response event
/// with status and latency in milliseconds.
///
/// ```text
/// INFO request{method=GET path=/s/nightfall user_agent="Mozilla/5.0 ..."}: finished processing request latency=3 ms status=200
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, MakeSpan> {
    TraceLayer::new_for_http()
        .make_span_with(make_span as MakeSpan)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
