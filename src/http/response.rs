//! Uniform response envelope.
//!
//! # Responsibilities
//! - Build the success/error wire shape every endpoint returns
//! - Attach the security-header set on conversion to an HTTP response
//!
//! # Design Decisions
//! - Only the `success`/`error` constructors exist, so `success: true`
//!   can never coexist with an error and vice versa
//! - The timestamp is fixed at construction time, RFC 3339 in UTC

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::security::headers::apply_security_headers;

/// The wire shape: `{ success, data?, message?, error?, details?,
/// requestId, timestamp }`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub request_id: String,
    pub timestamp: String,
}

/// An envelope paired with its HTTP status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl ApiResponse {
    pub fn success(data: Option<Value>, message: Option<String>, request_id: &str) -> Self {
        Self::success_with_status(StatusCode::OK, data, message, request_id)
    }

    pub fn success_with_status(
        status: StatusCode,
        data: Option<Value>,
        message: Option<String>,
        request_id: &str,
    ) -> Self {
        Self {
            status,
            envelope: Envelope {
                success: true,
                data,
                message,
                error: None,
                details: None,
                request_id: request_id.to_string(),
                timestamp: timestamp(),
            },
        }
    }

    pub fn error(
        status: StatusCode,
        code: &str,
        message: &str,
        details: Option<Value>,
        request_id: &str,
    ) -> Self {
        Self {
            status,
            envelope: Envelope {
                success: false,
                data: None,
                message: Some(message.to_string()),
                error: Some(code.to_string()),
                details,
                request_id: request_id.to_string(),
                timestamp: timestamp(),
            },
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let body = serde_json::to_string(&self.envelope)
            .unwrap_or_else(|_| r#"{"success":false,"error":"SERIALIZATION"}"#.to_string());
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        // The single place security headers are attached.
        apply_security_headers(response.headers_mut());
        response
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_never_carries_error() {
        let resp = ApiResponse::success(Some(json!({ "id": 1 })), None, "req-1");
        assert!(resp.envelope.success);
        assert!(resp.envelope.error.is_none());
        assert!(resp.envelope.details.is_none());
        assert_eq!(resp.envelope.request_id, "req-1");
    }

    #[test]
    fn error_never_carries_data() {
        let resp = ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Request validation failed",
            Some(json!([{ "field": "name" }])),
            "req-2",
        );
        assert!(!resp.envelope.success);
        assert!(resp.envelope.data.is_none());
        assert_eq!(resp.envelope.error.as_deref(), Some("VALIDATION_FAILED"));
    }

    #[test]
    fn wire_shape_uses_camel_case_and_skips_absent_fields() {
        let resp = ApiResponse::success(None, Some("ok".into()), "req-3");
        let wire = serde_json::to_value(&resp.envelope).unwrap();
        assert_eq!(wire["requestId"], "req-3");
        assert_eq!(wire["message"], "ok");
        assert!(wire.get("data").is_none());
        assert!(wire.get("error").is_none());
        // RFC 3339 with a trailing Z.
        assert!(wire["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn conversion_attaches_security_headers() {
        let response = ApiResponse::success(None, None, "req-4").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
