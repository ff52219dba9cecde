//! Security response headers.
//!
//! # Responsibilities
//! - Attach the fixed security-header set to every outgoing response
//! - Prevent content-type sniffing, framing, and response caching
//!
//! # Design Decisions
//! - Headers are attached in exactly one place (the envelope's
//!   `IntoResponse` impl), so handlers never need to remember them
//! - API responses are never cacheable and never indexed

use axum::http::{HeaderMap, HeaderName, HeaderValue};

static X_CONTENT_TYPE_OPTIONS: HeaderName = HeaderName::from_static("x-content-type-options");
static X_FRAME_OPTIONS: HeaderName = HeaderName::from_static("x-frame-options");
static X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");
static REFERRER_POLICY: HeaderName = HeaderName::from_static("referrer-policy");
static CONTENT_SECURITY_POLICY: HeaderName = HeaderName::from_static("content-security-policy");
static STRICT_TRANSPORT_SECURITY: HeaderName = HeaderName::from_static("strict-transport-security");
static X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");
static CACHE_CONTROL: HeaderName = HeaderName::from_static("cache-control");
static PRAGMA: HeaderName = HeaderName::from_static("pragma");

/// Attach the fixed security-header set to a response header map.
///
/// Existing values are overwritten; the set is not configurable per
/// endpoint.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    headers.insert(
        X_CONTENT_TYPE_OPTIONS.clone(),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(X_FRAME_OPTIONS.clone(), HeaderValue::from_static("DENY"));
    // Legacy header; kept for older browsers that still honor it.
    headers.insert(
        X_XSS_PROTECTION.clone(),
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        REFERRER_POLICY.clone(),
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        CONTENT_SECURITY_POLICY.clone(),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        STRICT_TRANSPORT_SECURITY.clone(),
        HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
    );
    headers.insert(
        X_ROBOTS_TAG.clone(),
        HeaderValue::from_static("noindex, nofollow"),
    );
    headers.insert(
        CACHE_CONTROL.clone(),
        HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
    );
    headers.insert(PRAGMA.clone(), HeaderValue::from_static("no-cache"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attaches_full_header_set() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers);

        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("x-xss-protection").unwrap(), "1; mode=block");
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
        assert_eq!(
            headers.get("content-security-policy").unwrap(),
            "default-src 'none'; frame-ancestors 'none'"
        );
        assert_eq!(
            headers.get("strict-transport-security").unwrap(),
            "max-age=63072000; includeSubDomains; preload"
        );
        assert_eq!(headers.get("x-robots-tag").unwrap(), "noindex, nofollow");
        assert_eq!(
            headers.get("cache-control").unwrap(),
            "no-store, no-cache, must-revalidate, private"
        );
        assert_eq!(headers.get("pragma").unwrap(), "no-cache");
    }

    #[test]
    fn overwrites_handler_supplied_values() {
        let mut headers = HeaderMap::new();
        headers.insert("cache-control", HeaderValue::from_static("max-age=3600"));
        apply_security_headers(&mut headers);
        assert_eq!(
            headers.get("cache-control").unwrap(),
            "no-store, no-cache, must-revalidate, private"
        );
    }
}
