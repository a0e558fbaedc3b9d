//! Header names, response header helpers, and the outbound header policy.
//!
//! Header names and values the gateway stamps on responses are declared
//! statically so call sites never need a runtime `.parse().unwrap()`.

use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::http::response::Parts;
use hyper::Response;

// Headers the gateway owns on its responses.
pub static X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");
pub static ACCESS_CONTROL_ALLOW_ORIGIN: HeaderName =
    HeaderName::from_static("access-control-allow-origin");
pub static ACCESS_CONTROL_ALLOW_METHODS: HeaderName =
    HeaderName::from_static("access-control-allow-methods");
pub static ACCESS_CONTROL_ALLOW_HEADERS: HeaderName =
    HeaderName::from_static("access-control-allow-headers");
pub static ACCESS_CONTROL_REQUEST_HEADERS: HeaderName =
    HeaderName::from_static("access-control-request-headers");

// Static values for those headers.
pub static VALUE_NO: HeaderValue = HeaderValue::from_static("no");
pub static VALUE_ANY_ORIGIN: HeaderValue = HeaderValue::from_static("*");
pub static VALUE_ALLOW_METHODS: HeaderValue =
    HeaderValue::from_static("GET,HEAD,PUT,POST,DELETE,PATCH");

/// Copy request headers for forwarding, dropping the ones the gateway owns.
///
/// `content-length` goes because the outbound client re-frames the body;
/// `host` goes so the client can set the upstream's own. Rules with
/// `strip_origin` also lose the `origin` header. Everything else, credentials
/// included, passes through untouched.
pub fn outbound_headers(headers: &HeaderMap, strip_origin: bool) -> HeaderMap {
    let mut out = headers.clone();
    out.remove(header::CONTENT_LENGTH);
    out.remove(header::HOST);
    if strip_origin {
        out.remove(header::ORIGIN);
    }
    out
}

/// Extension trait for stamping gateway headers onto responses.
pub trait StraitHeadersExt {
    /// Insert a header with a static name and value.
    /// Accepts references; cloning is handled internally (cheap for `from_static` headers).
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue);
}

impl<B> StraitHeadersExt for Response<B> {
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue) {
        self.headers_mut().insert(name.clone(), value.clone());
    }
}

impl StraitHeadersExt for Parts {
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue) {
        self.headers.insert(name.clone(), value.clone());
    }
}
