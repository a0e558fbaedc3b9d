//! Upstream forwarding with streaming bodies.
//!
//! The bounded forward covers connection setup and the arrival of the
//! response head with one deadline. Once the head is in, the timer is gone
//! and the body may take as long as it takes; a slow event stream never
//! trips the deadline. The unbounded forward backs the ad-hoc endpoint.

use super::client::HttpClient;
use super::headers::outbound_headers;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Body type every handler response uses.
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

/// Failure modes of an upstream forward. No response head was produced in
/// any of these; the client gets a gateway-owned error response instead.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// No response head within the deadline. Elapsing drops the in-flight
    /// call future, which tears down the attempt.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
    /// Connection or protocol failure talking to the upstream.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
    /// The target could not be turned into an HTTP request.
    #[error("target URL not usable for an HTTP request: {0}")]
    Target(#[source] hyper::http::Error),
}

impl ForwardError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Timeout(_) => "timeout",
            ForwardError::Upstream(_) => "network",
            ForwardError::Target(_) => "target",
        }
    }
}

/// Forward a matched request upstream, streaming both bodies.
///
/// The request body passes through without buffering, and the returned
/// response still carries the upstream's live body. Status and headers are
/// taken from the response head before a single body byte is consumed.
pub async fn forward_bounded(
    http_client: &HttpClient,
    req: Request<hyper::body::Incoming>,
    upstream_url: &str,
    strip_origin: bool,
    deadline: Duration,
) -> Result<Response<ProxyBody>, ForwardError> {
    let headers = outbound_headers(req.headers(), strip_origin);
    let (parts, body) = req.into_parts();

    let mut upstream_req = Request::builder()
        .method(parts.method)
        .uri(upstream_url)
        .body(BoxBody::new(body))
        .map_err(ForwardError::Target)?;
    *upstream_req.headers_mut() = headers;

    debug!("Forwarding to: {}", upstream_url);

    // The timeout wraps only the wait for the response head. Whichever way
    // this returns, the timer is dropped here and never outlives the call.
    let response = match tokio::time::timeout(deadline, http_client.request(upstream_req)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return Err(ForwardError::Upstream(e)),
        Err(_) => return Err(ForwardError::Timeout(deadline)),
    };

    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, BoxBody::new(body)))
}

/// Forward with no deadline and headers untouched.
///
/// The ad-hoc endpoint uses this; the caller owns the risk of a target that
/// never answers.
pub async fn forward_unbounded(
    http_client: &HttpClient,
    req: Request<hyper::body::Incoming>,
    target_url: &str,
) -> Result<Response<ProxyBody>, ForwardError> {
    let headers = req.headers().clone();
    let (parts, body) = req.into_parts();

    let mut upstream_req = Request::builder()
        .method(parts.method)
        .uri(target_url)
        .body(BoxBody::new(body))
        .map_err(ForwardError::Target)?;
    *upstream_req.headers_mut() = headers;

    debug!("Forwarding (unbounded) to: {}", target_url);

    let response = http_client.request(upstream_req).await?;
    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, BoxBody::new(body)))
}

/// Map a forwarding failure to the client-facing response.
pub fn failure_response(err: &ForwardError) -> Response<Full<Bytes>> {
    match err {
        ForwardError::Timeout(deadline) => {
            warn!("Upstream gave no response head within {:?}", deadline);
            text_response(StatusCode::GATEWAY_TIMEOUT, "Request timeout")
        }
        ForwardError::Upstream(e) => {
            error!("Upstream request failed: {}", e);
            text_response(StatusCode::BAD_GATEWAY, "Proxy fetch error")
        }
        ForwardError::Target(e) => {
            error!("Target not usable for an HTTP request: {}", e);
            text_response(StatusCode::BAD_GATEWAY, "Proxy fetch error")
        }
    }
}

/// Helper to build a plain-text response.
pub fn text_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(message.to_string())))
        .unwrap()
}

/// Helper to build a JSON error response.
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Extension trait for converting fixed-body responses into the handler's
/// boxed body type.
pub trait ResponseExt {
    fn into_boxed(self) -> Response<ProxyBody>;
}

impl ResponseExt for Response<Full<Bytes>> {
    fn into_boxed(self) -> Response<ProxyBody> {
        self.map(|b| BoxBody::new(b.map_err(|never: Infallible| match never {})))
    }
}
