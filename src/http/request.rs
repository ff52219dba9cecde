//! Request-side helpers: caller identification and query parsing.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use serde_json::{Map, Value};

/// Bucket used when no caller address can be derived. Coarse by design:
/// every unidentifiable caller shares one rate-limit bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the rate-limit identifier for a request.
///
/// Forwarding headers win over the socket peer so that deployments
/// behind a proxy key on the real client. Without a trusted-proxy list
/// these headers are spoofable; see DESIGN.md before tightening.
pub fn client_identifier<B>(request: &Request<B>) -> String {
    let headers = request.headers();
    if let Some(ip) = forwarded_ip(headers) {
        return ip;
    }
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    UNKNOWN_CLIENT.to_string()
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a raw query string into a JSON object of string values.
/// Repeated keys keep the last occurrence.
pub fn query_to_value(raw: Option<&str>) -> Value {
    let mut entries = Map::new();
    if let Some(raw) = raw {
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            entries.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }
    Value::Object(entries)
}
