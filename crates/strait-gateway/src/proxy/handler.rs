//! Per-request dispatch pipeline.
//!
//! Stage order mirrors the gateway's public surface: CORS preflight, the
//! greeting route, the ad-hoc endpoint, the route table, and finally the
//! not-found fallback. Exactly one stage answers any request, and every
//! response leaves through `handle_request`, which stamps the gateway's
//! response headers and records metrics.

use super::adhoc::{handle_adhoc_proxy, ADHOC_PROXY_PATH};
use super::client::HttpClient;
use super::forwarding::{failure_response, forward_bounded, text_response, ProxyBody, ResponseExt};
use super::headers::{
    StraitHeadersExt, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS, VALUE_ALLOW_METHODS,
    VALUE_ANY_ORIGIN, VALUE_NO, X_ACCEL_BUFFERING,
};
use super::routes::{rewrite_url, RouteTable};
use crate::metrics;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info};

/// Banner served at `GET /`.
const GREETING: &str = "A proxy for AI!";

/// Body of the not-found fallback.
const NOT_FOUND: &str = "404 Not Found";

/// Everything a request handler needs, borrowed from the server.
pub struct RequestHandlerContext<'a> {
    pub http_client: &'a HttpClient,
    pub routes: &'a RouteTable,
    pub forward_timeout: Duration,
}

/// Handle one request end to end.
pub async fn handle_request(
    ctx: &RequestHandlerContext<'_>,
    req: Request<hyper::body::Incoming>,
) -> Result<Response<ProxyBody>, Infallible> {
    let start_time = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Received request: {} {}", method, req.uri());

    let mut response = dispatch(ctx, req).await;

    // Every response the gateway emits is marked against intermediary
    // buffering and answers cross-origin callers.
    response.set_header(&X_ACCEL_BUFFERING, &VALUE_NO);
    response.set_header(&ACCESS_CONTROL_ALLOW_ORIGIN, &VALUE_ANY_ORIGIN);

    let status = response.status().as_u16();
    let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    metrics::record_request(method.as_str(), status);
    info!("{} {} -> {} ({:.1}ms)", method, path, status, duration_ms);

    Ok(response)
}

/// Route a request to the stage that owns it.
async fn dispatch(
    ctx: &RequestHandlerContext<'_>,
    req: Request<hyper::body::Incoming>,
) -> Response<ProxyBody> {
    // Preflights are answered here; they never reach an upstream.
    if req.method() == Method::OPTIONS {
        return preflight_response(&req);
    }

    if req.method() == Method::GET && req.uri().path() == "/" {
        return text_response(StatusCode::OK, GREETING).into_boxed();
    }

    if req.method() == Method::POST && req.uri().path() == ADHOC_PROXY_PATH {
        return handle_adhoc_proxy(ctx.http_client, req).await;
    }

    match route_request(ctx, req).await {
        RouteOutcome::Forwarded(response) | RouteOutcome::Errored(response) => response,
        RouteOutcome::Unmatched(req) => {
            debug!("No route matched {}, falling through", req.uri().path());
            text_response(StatusCode::NOT_FOUND, NOT_FOUND).into_boxed()
        }
    }
}

/// Result of offering a request to the route table.
pub enum RouteOutcome {
    /// A rule matched and the upstream answered; stream it back.
    Forwarded(Response<ProxyBody>),
    /// A rule matched but the forward failed; the error response is ours.
    Errored(Response<ProxyBody>),
    /// No rule matched. The request passes onward untouched.
    Unmatched(Request<hyper::body::Incoming>),
}

/// Offer a request to the route table and forward it if a rule matches.
pub async fn route_request(
    ctx: &RequestHandlerContext<'_>,
    req: Request<hyper::body::Incoming>,
) -> RouteOutcome {
    let (upstream_url, route, strip_origin) = match ctx.routes.match_request(&req) {
        Some(matched) => (
            rewrite_url(&matched, req.uri()),
            matched.rule.path_segment.clone(),
            matched.rule.strip_origin,
        ),
        None => return RouteOutcome::Unmatched(req),
    };

    info!("Matched route '{}', forwarding to {}", route, upstream_url);

    let start = std::time::Instant::now();
    match forward_bounded(
        ctx.http_client,
        req,
        &upstream_url,
        strip_origin,
        ctx.forward_timeout,
    )
    .await
    {
        Ok(response) => {
            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
            let status = response.status().as_u16();
            metrics::record_upstream_duration(&route, status, duration_ms);
            debug!("Upstream '{}' answered with {}", route, status);
            RouteOutcome::Forwarded(response)
        }
        Err(e) => {
            metrics::record_forward_failure(&route, e.kind());
            RouteOutcome::Errored(failure_response(&e).into_boxed())
        }
    }
}

/// Answer a CORS preflight directly.
fn preflight_response(req: &Request<hyper::body::Incoming>) -> Response<ProxyBody> {
    let mut response = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Full::new(Bytes::new()))
        .unwrap()
        .into_boxed();

    response.set_header(&ACCESS_CONTROL_ALLOW_ORIGIN, &VALUE_ANY_ORIGIN);
    response.set_header(&ACCESS_CONTROL_ALLOW_METHODS, &VALUE_ALLOW_METHODS);
    if let Some(requested) = req.headers().get(&ACCESS_CONTROL_REQUEST_HEADERS) {
        response
            .headers_mut()
            .insert(ACCESS_CONTROL_ALLOW_HEADERS.clone(), requested.clone());
    }
    response
}
