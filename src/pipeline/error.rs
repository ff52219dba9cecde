//! Pipeline error taxonomy, in stage order.

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::http::ApiResponse;
use crate::validate::FieldError;

/// Every way a request can fail before or inside the handler. Each
/// variant maps to exactly one status code and envelope error code.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("method not allowed")]
    MethodNotAllowed { allowed: Vec<String> },

    #[error("suspicious input detected")]
    SuspiciousInput,

    #[error("rate limit exceeded")]
    RateLimited {
        retry_after_secs: u64,
        limit: usize,
        window_ms: u64,
    },

    #[error("authentication required")]
    Unauthenticated,

    #[error("insufficient permissions")]
    Unauthorized,

    #[error("request validation failed")]
    ValidationFailed(Vec<FieldError>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            PipelineError::SuspiciousInput | PipelineError::ValidationFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            PipelineError::Unauthenticated => StatusCode::UNAUTHORIZED,
            PipelineError::Unauthorized => StatusCode::FORBIDDEN,
            PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            PipelineError::SuspiciousInput => "SUSPICIOUS_INPUT",
            PipelineError::RateLimited { .. } => "RATE_LIMITED",
            PipelineError::Unauthenticated => "UNAUTHENTICATED",
            PipelineError::Unauthorized => "UNAUTHORIZED",
            PipelineError::ValidationFailed(_) => "VALIDATION_FAILED",
            PipelineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Build the caller-facing envelope. `expose_detail` controls
    /// whether internal error text is included (development builds only).
    pub fn into_response(self, request_id: &str, expose_detail: bool) -> ApiResponse {
        let status = self.status();
        let code = self.code();
        let (message, details): (String, Option<Value>) = match self {
            PipelineError::MethodNotAllowed { allowed } => (
                "Method not allowed".to_string(),
                Some(json!({ "allowedMethods": allowed })),
            ),
            PipelineError::SuspiciousInput => ("Request rejected".to_string(), None),
            PipelineError::RateLimited {
                retry_after_secs,
                limit,
                window_ms,
            } => (
                "Too many requests".to_string(),
                Some(json!({
                    "retryAfter": retry_after_secs,
                    "limit": limit,
                    "window": window_ms,
                })),
            ),
            PipelineError::Unauthenticated => ("Authentication required".to_string(), None),
            PipelineError::Unauthorized => ("Insufficient permissions".to_string(), None),
            PipelineError::ValidationFailed(errors) => (
                "Request validation failed".to_string(),
                Some(serde_json::to_value(errors).unwrap_or(Value::Null)),
            ),
            PipelineError::Internal(detail) => {
                let details = expose_detail.then(|| json!({ "detail": detail }));
                ("Internal server error".to_string(), details)
            }
        };
        ApiResponse::error(status, code, &message, details, request_id)
    }
}
