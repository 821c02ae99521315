use std::time::Duration;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::middleware::{response_headers, ApiVersion};
use crate::request_id::{record_request_id, request_id_header, trace_layer, NanoReqId};
use crate::router::not_found;

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub version: ApiVersion,
    pub timeout: Duration,
    pub body_limit: usize,
    pub cors: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            version: ApiVersion::parse(env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            body_limit: 16 * 1024 * 1024,
            cors: false,
        }
    }
}

/// Installs the envelope 404 fallback and the shared middleware stack.
///
/// Layers are added innermost first, so a request passes
/// BodyLimit -> SetRequestId -> PropagateRequestId -> Trace -> record_request_id
/// -> response headers -> Timeout -> CORS -> handler.
pub fn finish_router(router: Router, opts: &HttpOptions) -> Router {
    let x_request_id = request_id_header();
    let mut router = router.fallback(not_found);

    if opts.cors {
        router = router.layer(CorsLayer::permissive());
    }
    router = router.layer(TimeoutLayer::new(opts.timeout));
    router = router.layer(from_fn_with_state(opts.version.clone(), response_headers));
    router = router.layer(from_fn(record_request_id));
    router = router.layer(trace_layer());
    router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
    router = router.layer(SetRequestIdLayer::new(x_request_id, NanoReqId));
    router.layer(RequestBodyLimitLayer::new(opts.body_limit))
}
