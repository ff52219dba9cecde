//! Pipeline orchestration.
//!
//! # Responsibilities
//! - Wrap a business handler and its policy into a routable endpoint
//! - Enforce every pipeline stage, in order, before the handler runs
//! - Emit one start and one end log record per request
//!
//! # Stage Order
//! ```text
//! correlation id → method check → abuse scan → rate limit
//!     → authenticate → authorize → sanitize + validate
//!     → handler → security headers → end log
//! ```
//!
//! Any stage failure short-circuits; the handler never runs after a
//! pre-stage fails, and handler failures are the only ones converted
//! generically to 500.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::RawPathParams;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, MethodRouter};
use futures_util::FutureExt;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::{is_authorized, Authenticator, TokenVerifier};
use crate::config::{AppConfig, Environment, RateLimitConfig};
use crate::http::request::{client_identifier, query_to_value};
use crate::http::ApiResponse;
use crate::observability::metrics;
use crate::pipeline::context::RequestContext;
use crate::pipeline::error::PipelineError;
use crate::pipeline::policy::{AuthMode, EndpointPolicy, RateLimitSelector};
use crate::security::abuse::{scan_target, AbuseDetector};
use crate::security::rate_limit::{Quota, RateLimitStore, RateLimiter};
use crate::security::sanitize::clean;
use crate::storage::AccountStore;
use crate::validate::{Contract, FieldError};

/// What a business handler hands back on success. The orchestrator wraps
/// it into the uniform envelope.
#[derive(Debug, Clone)]
pub struct HandlerReply {
    pub status: StatusCode,
    pub data: Option<Value>,
    pub message: Option<String>,
    /// Set for domain-level failures (e.g. bad credentials). The
    /// orchestrator builds an error envelope instead of a success one.
    pub error_code: Option<String>,
}

impl HandlerReply {
    pub fn ok(data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            data: Some(data),
            message: None,
            error_code: None,
        }
    }

    pub fn created(data: Value) -> Self {
        Self {
            status: StatusCode::CREATED,
            data: Some(data),
            message: None,
            error_code: None,
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            data: None,
            message: Some(text.into()),
            error_code: None,
        }
    }

    /// A domain failure the handler wants reported in the uniform
    /// envelope shape.
    pub fn error(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            data: None,
            message: Some(message.into()),
            error_code: Some(code.into()),
        }
    }

    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.message = Some(text.into());
        self
    }

    fn into_api_response(self, request_id: &str) -> ApiResponse {
        match self.error_code {
            Some(code) => ApiResponse::error(
                self.status,
                &code,
                self.message.as_deref().unwrap_or("Request failed"),
                None,
                request_id,
            ),
            None => {
                ApiResponse::success_with_status(self.status, self.data, self.message, request_id)
            }
        }
    }
}

/// Handler outcome. Errors are opaque to the pipeline; they all become a
/// generic internal error.
pub type HandlerResult = Result<HandlerReply, tower::BoxError>;

/// Composes the security stages around business handlers. One instance
/// serves the whole application; endpoints share its rate-limit state.
pub struct Pipeline {
    limiter: RateLimiter,
    detector: AbuseDetector,
    authenticator: Authenticator,
    store: Arc<dyn AccountStore>,
    rate_config: RateLimitConfig,
    environment: Environment,
    max_body_bytes: usize,
}

impl Pipeline {
    pub fn new(config: &AppConfig, store: Arc<dyn AccountStore>) -> Self {
        let verifier = TokenVerifier::new(&config.auth.jwt_secret, config.auth.leeway_secs);
        Self {
            limiter: RateLimiter::new(),
            detector: AbuseDetector::new(),
            authenticator: Authenticator::new(verifier),
            store,
            rate_config: config.rate_limit.clone(),
            environment: config.environment,
            max_body_bytes: config.server.max_body_bytes,
        }
    }

    /// Swap the rate-limit backend (e.g. for a shared external store).
    pub fn with_rate_store(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.limiter = RateLimiter::with_store(store);
        self
    }

    /// Replace the abuse signature set.
    pub fn with_detector(mut self, detector: AbuseDetector) -> Self {
        self.detector = detector;
        self
    }

    /// The verifier endpoints use to issue tokens (login) and tests use
    /// to mint credentials.
    pub fn token_verifier(&self) -> &TokenVerifier {
        self.authenticator.verifier()
    }

    /// Wrap a handler and its policy into a routable endpoint with the
    /// same external signature: request in, response out.
    pub fn endpoint<H, Fut>(self: &Arc<Self>, policy: EndpointPolicy, handler: H) -> MethodRouter
    where
        H: Fn(Arc<RequestContext>) -> Fut + Clone + Send + Sync + 'static,
        Fut: std::future::Future<Output = HandlerResult> + Send + 'static,
    {
        let pipeline = self.clone();
        let policy = Arc::new(policy);
        any(move |params: RawPathParams, request: Request<Body>| {
            let pipeline = pipeline.clone();
            let policy = policy.clone();
            let handler = handler.clone();
            async move { pipeline.execute(&policy, params, request, handler).await }
        })
    }

    async fn execute<H, Fut>(
        &self,
        policy: &EndpointPolicy,
        params: RawPathParams,
        request: Request<Body>,
        handler: H,
    ) -> Response
    where
        H: Fn(Arc<RequestContext>) -> Fut + Send + Sync,
        Fut: std::future::Future<Output = HandlerResult> + Send,
    {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let client = client_identifier(&request);

        tracing::info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            client = %client,
            "request started"
        );

        let mut principal_id = None;
        let outcome = self
            .run_stages(policy, params, request, &request_id, &client, &mut principal_id, handler)
            .await;

        let response = match outcome {
            Ok(reply) => reply,
            Err(err) => {
                let expose = self.environment != Environment::Production;
                err.into_response(&request_id, expose)
            }
        };

        let status = response.status.as_u16();
        metrics::record_request(status);
        tracing::info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            client = %client,
            principal = principal_id.as_deref().unwrap_or("-"),
            status = status,
            duration_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );

        response.into_response()
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_stages<H, Fut>(
        &self,
        policy: &EndpointPolicy,
        params: RawPathParams,
        request: Request<Body>,
        request_id: &str,
        client: &str,
        principal_id: &mut Option<String>,
        handler: H,
    ) -> Result<ApiResponse, PipelineError>
    where
        H: Fn(Arc<RequestContext>) -> Fut + Send + Sync,
        Fut: std::future::Future<Output = HandlerResult> + Send,
    {
        // (1) Method check.
        if !policy.allows_method(request.method()) {
            metrics::record_rejection("method");
            return Err(PipelineError::MethodNotAllowed {
                allowed: policy.allowed_method_names(),
            });
        }

        // (2) Abuse scan over URL + headers.
        let target = scan_target(request.uri(), request.headers());
        if let Some(signature) = self.detector.is_suspicious(&target) {
            tracing::warn!(
                request_id = %request_id,
                client = %client,
                signature = signature,
                "suspicious request blocked"
            );
            metrics::record_rejection("abuse");
            return Err(PipelineError::SuspiciousInput);
        }

        // (3) Rate limit, keyed by caller identifier.
        let quota = self.resolve_quota(policy);
        let decision = self.limiter.admit(client, quota);
        if !decision.admitted {
            tracing::warn!(request_id = %request_id, client = %client, "rate limit exceeded");
            metrics::record_rejection("rate_limit");
            return Err(PipelineError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
                limit: decision.limit,
                window_ms: decision.window_ms,
            });
        }

        // (4) Authentication per policy mode.
        let principal = match policy.auth {
            AuthMode::None => None,
            AuthMode::Required | AuthMode::Optional => self
                .authenticator
                .resolve(request.headers(), self.store.as_ref())
                .await
                .map_err(|err| PipelineError::Internal(err.to_string()))?,
        };
        if policy.auth == AuthMode::Required && principal.is_none() {
            metrics::record_rejection("auth");
            return Err(PipelineError::Unauthenticated);
        }
        *principal_id = principal.as_ref().map(|p| p.id.clone());

        // (5) Authorization; anonymous callers on optional/none
        // endpoints bypass this entirely.
        if let Some(principal) = &principal {
            if !is_authorized(principal, &policy.required_roles) {
                metrics::record_rejection("authz");
                return Err(PipelineError::Unauthorized);
            }
        }

        // (6) Sanitize, then validate each declared channel.
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let query = clean(query_to_value(request.uri().query()));
        let path_params = clean(path_params_to_value(&params));
        let body = clean(read_json_body(request, self.max_body_bytes).await?);

        let body = apply_contract(policy.body.as_ref(), &body)?;
        let query = apply_contract(policy.query.as_ref(), &query)?;
        let path_params = apply_contract(policy.params.as_ref(), &path_params)?;

        // (7) Invoke the handler with the populated context. Panics are
        // contained and reported like any other handler failure.
        let context = Arc::new(RequestContext {
            request_id: request_id.to_string(),
            method,
            path,
            principal,
            store: self.store.clone(),
            body,
            query,
            params: path_params,
        });

        match AssertUnwindSafe(handler(context)).catch_unwind().await {
            Ok(Ok(reply)) => Ok(reply.into_api_response(request_id)),
            Ok(Err(err)) => {
                tracing::error!(request_id = %request_id, error = %err, "handler failed");
                Err(PipelineError::Internal(err.to_string()))
            }
            Err(_) => {
                tracing::error!(request_id = %request_id, "handler panicked");
                Err(PipelineError::Internal("handler panicked".to_string()))
            }
        }
    }

    fn resolve_quota(&self, policy: &EndpointPolicy) -> Quota {
        match policy.rate_limit {
            RateLimitSelector::Class(class) => self.rate_config.quota(class),
            RateLimitSelector::Custom(quota) => quota,
        }
    }
}

/// Buffer and parse the request body. Empty bodies are `Null`; anything
/// non-empty must be JSON.
async fn read_json_body(
    request: Request<Body>,
    max_bytes: usize,
) -> Result<Value, PipelineError> {
    let body = request.into_body();
    let bytes = to_bytes(body, max_bytes).await.map_err(|_| {
        PipelineError::ValidationFailed(vec![FieldError {
            field: "body".to_string(),
            message: "request body is unreadable or too large".to_string(),
            code: "invalid_body",
        }])
    })?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|_| {
        PipelineError::ValidationFailed(vec![FieldError {
            field: "body".to_string(),
            message: "request body must be valid JSON".to_string(),
            code: "invalid_json",
        }])
    })
}

fn path_params_to_value(params: &RawPathParams) -> Value {
    let mut entries = Map::new();
    for (name, value) in params.iter() {
        entries.insert(name.to_string(), Value::String(value.to_string()));
    }
    Value::Object(entries)
}

fn apply_contract(contract: Option<&Contract>, value: &Value) -> Result<Value, PipelineError> {
    match contract {
        Some(contract) => contract
            .validate(value)
            .map_err(PipelineError::ValidationFailed),
        None => Ok(value.clone()),
    }
}
