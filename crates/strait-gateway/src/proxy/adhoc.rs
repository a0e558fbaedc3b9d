//! The ad-hoc target endpoint.
//!
//! `POST /custom-model-proxy?url=...` forwards the request to an arbitrary
//! absolute URL. The URL check is syntax only, and the forward carries the
//! caller's method, headers, and body untouched with no deadline. This is a
//! deliberate escape hatch for providers that have no table entry; it is
//! not a hardened surface, and deployments are expected to keep it away
//! from untrusted callers.

use super::client::HttpClient;
use super::forwarding::{
    error_response, failure_response, forward_unbounded, ProxyBody, ResponseExt,
};
use hyper::{Request, Response, StatusCode};
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

/// Path the ad-hoc endpoint is registered on.
pub const ADHOC_PROXY_PATH: &str = "/custom-model-proxy";

/// Handle the ad-hoc endpoint. The caller has already checked method and path.
pub async fn handle_adhoc_proxy(
    http_client: &HttpClient,
    req: Request<hyper::body::Incoming>,
) -> Response<ProxyBody> {
    let target = match parse_target_url(req.uri().query()) {
        Ok(target) => target,
        Err(msg) => {
            info!("Ad-hoc proxy rejected: {}", msg);
            return error_response(StatusCode::BAD_REQUEST, msg).into_boxed();
        }
    };

    debug!("Ad-hoc proxy to: {}", target);

    match forward_unbounded(http_client, req, &target).await {
        Ok(response) => response,
        Err(e) => failure_response(&e).into_boxed(),
    }
}

/// Extract and validate the `url` query parameter.
///
/// Returns the parsed absolute URL in serialized form, or a message for the
/// 400 response. Anything that parses as an absolute URL is accepted;
/// reachability and scheme policy are the caller's business.
pub fn parse_target_url(query: Option<&str>) -> Result<String, &'static str> {
    let params = parse_query_string(query);
    let raw = match params.get("url") {
        Some(raw) => raw,
        None => return Err("missing required query parameter 'url'"),
    };
    match Url::parse(raw) {
        Ok(parsed) => Ok(String::from(parsed)),
        Err(_) => Err("query parameter 'url' is not a valid absolute URL"),
    }
}

/// Split a raw query string into decoded key/value pairs.
fn parse_query_string(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(q) = query {
        for pair in q.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                params.insert(
                    key.to_string(),
                    urlencoding::decode(value).unwrap_or_default().to_string(),
                );
            } else if !pair.is_empty() {
                params.insert(pair.to_string(), String::new());
            }
        }
    }
    params
}
