use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub const VERSION_HEADER: &str = "version";
pub const PERFORMANCE_HEADER: &str = "req-performance-time";

/// API version advertised on every response as `V{major}.{minor}.{bug}`.
#[derive(Debug, Clone)]
pub struct ApiVersion(HeaderValue);

impl ApiVersion {
    pub fn new(major: u32, minor: u32, bug: u32) -> Self {
        let v = format!("V{major}.{minor}.{bug}");
        Self(HeaderValue::from_str(&v).unwrap_or_else(|_| HeaderValue::from_static("V0.0.0")))
    }

    /// Parses a `major.minor.bug` string such as `CARGO_PKG_VERSION`.
    pub fn parse(version: &str) -> Self {
        let mut parts = version.split('.').map(|p| {
            let digits = p.split(|c: char| !c.is_ascii_digit()).next().unwrap_or("");
            digits.parse::<u32>().unwrap_or(0)
        });
        let mut next = || parts.next().unwrap_or(0);
        Self::new(next(), next(), next())
    }

    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap_or("")
    }
}

/// `H:MM:SS.micros[HH:MM:SS:MS] | millis[MS]`
pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}[HH:MM:SS:MS] | {:.3}[MS]",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        d.subsec_micros(),
        d.as_secs_f64() * 1000.0
    )
}

/// Adds the `Version` and `Req-Performance-Time` headers.
pub async fn response_headers(
    State(version): State<ApiVersion>,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let mut resp = next.run(req).await;
    let elapsed = format_elapsed(started.elapsed());

    let headers = resp.headers_mut();
    headers.insert(HeaderName::from_static(VERSION_HEADER), version.0);
    if let Ok(v) = HeaderValue::from_str(&elapsed) {
        headers.insert(HeaderName::from_static(PERFORMANCE_HEADER), v);
    }
    resp
}
