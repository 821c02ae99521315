//! `x-request-id` handling: generated when the client sends none, echoed on
//! the response, recorded on the request span and handed to handlers as
//! [`ReqId`].

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Request, Response};
use axum::{body::Body, middleware::Next};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::request_id::{MakeRequestId, RequestId};
use tower_http::trace::{DefaultOnRequest, TraceLayer};
use tracing::{field::Empty, Span};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id of the current request, as a request extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReqId(pub String);

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

/// Issues 21-character nanoids.
#[derive(Clone, Copy, Default)]
pub struct NanoReqId;

impl MakeRequestId for NanoReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&nanoid::nanoid!())
            .ok()
            .map(RequestId::new)
    }
}

fn read_request_id<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a")
}

pub async fn record_request_id(mut req: Request<Body>, next: Next) -> axum::response::Response {
    let rid = read_request_id(&req).to_owned();
    Span::current().record("request_id", rid.as_str());
    req.extensions_mut().insert(ReqId(rid));
    next.run(req).await
}

/// One `http_request` span per request; status and latency are filled in
/// when the response is produced.
#[allow(clippy::type_complexity)]
pub fn trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> Span + Clone,
    DefaultOnRequest,
    impl Fn(&Response<Body>, Duration, &Span) + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                path = %req.uri().path(),
                request_id = %read_request_id(req),
                status = Empty,
                latency_ms = Empty,
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, span: &Span| {
            let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
            span.record("status", res.status().as_u16());
            span.record("latency_ms", latency_ms);
            tracing::debug!(parent: span, status = res.status().as_u16(), latency_ms, "request finished");
        })
}
