//! Content negotiation layers
//!
//! `accept(mimetype)` rejects requests whose `Accept` header rules the
//! mimetype out (406). `require(mimetype)` rejects requests whose
//! `Content-Type` is something else (415). The two combine into one tower
//! layer wrapped around a handler and pass matching requests through
//! untouched.

use axum::{
    extract::Request,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderMap,
    },
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

use crate::ApiError;

pub const APPLICATION_JSON: &str = "application/json";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Layer enforcing an `Accept` rule, a `Content-Type` rule, or both.
/// Build with [`accept`] / [`require`] and chain the other as a method.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegotiationLayer {
    accept: Option<&'static str>,
    require: Option<&'static str>,
}

/// Layer rejecting requests that cannot accept `mimetype` responses
pub fn accept(mimetype: &'static str) -> NegotiationLayer {
    NegotiationLayer::default().accept(mimetype)
}

/// Layer rejecting requests whose body is not `mimetype`
pub fn require(mimetype: &'static str) -> NegotiationLayer {
    NegotiationLayer::default().require(mimetype)
}

impl NegotiationLayer {
    pub fn accept(mut self, mimetype: &'static str) -> Self {
        self.accept = Some(mimetype);
        self
    }

    pub fn require(mut self, mimetype: &'static str) -> Self {
        self.require = Some(mimetype);
        self
    }

    /// Accept is checked before Content-Type
    fn check(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        if let Some(mimetype) = self.accept {
            check_accept(headers, mimetype)?;
        }
        if let Some(mimetype) = self.require {
            check_content_type(headers, mimetype)?;
        }
        Ok(())
    }
}

fn check_accept(headers: &HeaderMap, mimetype: &'static str) -> Result<(), ApiError> {
    let mut values = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .peekable();

    // No Accept header means any representation will do
    if values.peek().is_none() {
        return Ok(());
    }

    let joined = values.collect::<Vec<_>>().join(",");
    if accepts(&joined, mimetype) {
        Ok(())
    } else {
        Err(ApiError::NotAcceptable(mimetype))
    }
}

fn check_content_type(headers: &HeaderMap, mimetype: &'static str) -> Result<(), ApiError> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    match content_type {
        Some(value) if essence(value).eq_ignore_ascii_case(mimetype) => Ok(()),
        _ => Err(ApiError::UnsupportedMediaType(mimetype)),
    }
}

impl<S> Layer<S> for NegotiationLayer {
    type Service = Negotiation<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Negotiation {
            inner,
            rules: *self,
        }
    }
}

/// Tower service that short-circuits on a negotiation failure
#[derive(Debug, Clone)]
pub struct Negotiation<S> {
    inner: S,
    rules: NegotiationLayer,
}

impl<S> Service<Request> for Negotiation<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        if let Err(rejection) = self.rules.check(request.headers()) {
            debug!(
                "Rejected {} {}: {}",
                request.method(),
                request.uri().path(),
                rejection
            );
            let response = rejection.into_response();
            return Box::pin(async move { Ok::<_, S::Error>(response) });
        }

        // The clone is not guaranteed ready; keep the one poll_ready drove
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { inner.call(request).await })
    }
}

/// Media type without parameters, e.g. `text/html` for `text/html; charset=utf-8`
fn essence(value: &str) -> &str {
    value.split(';').next().unwrap_or("").trim()
}

/// Whether an `Accept` header value admits `mimetype`.
///
/// The most specific matching range decides (`type/subtype` over `type/*`
/// over `*/*`); the mimetype is acceptable when that range has `q > 0`.
pub fn accepts(header: &str, mimetype: &str) -> bool {
    let (wanted_type, _) = mimetype.split_once('/').unwrap_or((mimetype, ""));

    let mut best: Option<(u8, f32)> = None;
    for range in header.split(',') {
        let range = range.trim();
        if range.is_empty() {
            continue;
        }

        let media = essence(range);
        let specificity = if media.eq_ignore_ascii_case(mimetype) {
            2
        } else if media == "*/*" || media == "*" {
            0
        } else {
            match media.split_once('/') {
                Some((ty, "*")) if ty.eq_ignore_ascii_case(wanted_type) => 1,
                _ => continue,
            }
        };

        let quality = range
            .split(';')
            .skip(1)
            .filter_map(|param| param.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);

        if best.map_or(true, |(s, _)| specificity > s) {
            best = Some((specificity, quality));
        }
    }

    matches!(best, Some((_, q)) if q > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_accepts_exact_and_wildcards() {
        assert!(accepts("application/json", APPLICATION_JSON));
        assert!(accepts("application/*", APPLICATION_JSON));
        assert!(accepts("*/*", APPLICATION_JSON));
        assert!(accepts("text/html, application/json;q=0.5", APPLICATION_JSON));
        assert!(accepts("APPLICATION/JSON", APPLICATION_JSON));
    }

    #[test]
    fn test_rejects_other_types() {
        assert!(!accepts("text/html", APPLICATION_JSON));
        assert!(!accepts("text/*, image/png", APPLICATION_JSON));
        assert!(!accepts("", APPLICATION_JSON));
    }

    #[test]
    fn test_zero_quality_excludes() {
        assert!(!accepts("application/json;q=0", APPLICATION_JSON));
        assert!(!accepts("*/*, application/json; q=0", APPLICATION_JSON));
        assert!(accepts("*/*;q=0, application/json", APPLICATION_JSON));
    }

    #[test]
    fn test_missing_accept_header_passes() {
        let headers = HeaderMap::new();
        assert!(accept(APPLICATION_JSON).check(&headers).is_ok());
    }

    #[test]
    fn test_require_ignores_parameters() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=xyz"),
        );
        assert!(require(MULTIPART_FORM_DATA).check(&headers).is_ok());
        assert!(require(APPLICATION_JSON).check(&headers).is_err());
    }

    #[test]
    fn test_accept_checked_before_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let err = accept(APPLICATION_JSON)
            .require(APPLICATION_JSON)
            .check(&headers)
            .unwrap_err();
        assert!(matches!(err, ApiError::NotAcceptable(_)));
    }

    #[test]
    fn test_require_rejects_missing_content_type() {
        let err = require(APPLICATION_JSON)
            .check(&HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Request must contain application/json data");
    }
}
