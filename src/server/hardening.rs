//! Cache-defeating middleware applied around every response.
//!
//! The served tree is regenerated continuously by analysis pipelines, so a
//! browser must never be handed a cached or "not modified" answer:
//!
//! - conditional request headers are stripped before the request reaches a
//!   handler, so file serving always sends the full body
//! - every response (listings, files, redirects, errors, the viewer page)
//!   is stamped with no-cache directives
//!
//! # Example
//!
//! ```ignore
//! use axum::{middleware, Router};
//! use labserve::server::hardening::harden_response;
//!
//! let app = Router::new().layer(middleware::from_fn(harden_response));
//! ```

use axum::{extract::Request, middleware::Next, response::Response};
use http::header::{
    HeaderValue, CACHE_CONTROL, EXPIRES, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE, PRAGMA,
};

/// `Cache-Control` value set on every response.
pub const NO_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Remove conditional headers from the request and disable caching on the response.
pub async fn harden_response(mut request: Request, next: Next) -> Response {
    strip_conditional_headers(&mut request);
    let mut response = next.run(request).await;
    stamp_no_cache(&mut response);
    response
}

/// Drop `If-Modified-Since`, `If-None-Match` and `If-Range` from a request.
pub fn strip_conditional_headers(request: &mut Request) {
    let headers = request.headers_mut();
    headers.remove(IF_MODIFIED_SINCE);
    headers.remove(IF_NONE_MATCH);
    headers.remove(IF_RANGE);
}

/// Overwrite the caching headers of a response.
pub fn stamp_no_cache(response: &mut Response) {
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE_CONTROL));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
}
