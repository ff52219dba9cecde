//! Demo server for the agent trust-registry API.
//!
//! Wires a handful of thin endpoints through the pipeline so the whole
//! stack can be exercised end to end. Real business handlers live
//! outside this crate; the ones below only echo validated input.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use agent_trust_api::config::{load_config, AppConfig};
use agent_trust_api::observability::logging::init_logging;
use agent_trust_api::pipeline::{AuthMode, EndpointPolicy, HandlerReply, Pipeline, RateClass};
use agent_trust_api::storage::{Account, MemoryStore};
use agent_trust_api::validate::{Contract, FieldRule};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)?,
        None => {
            let mut config = AppConfig::default();
            config.auth.jwt_secret = "development-only-secret-change-me!!".to_string();
            config
        }
    };
    init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.server.bind_address,
        environment = ?config.environment,
        "agent-trust-api starting"
    );

    let store = Arc::new(MemoryStore::new());
    seed_demo_accounts(&store);

    let pipeline = Arc::new(Pipeline::new(&config, store.clone()));
    let app = build_router(&pipeline, store, config.auth.token_ttl_secs)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "listening for connections");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

fn build_router(pipeline: &Arc<Pipeline>, store: Arc<MemoryStore>, token_ttl_secs: i64) -> Router {
    let login_pipeline = pipeline.clone();
    Router::new()
        .route(
            "/api/auth/login",
            pipeline.endpoint(
                EndpointPolicy::new([Method::POST])
                    .auth(AuthMode::None)
                    .rate_class(RateClass::Auth)
                    .body(
                        Contract::strict()
                            .field(
                                FieldRule::string("email")
                                    .required()
                                    .pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"),
                            )
                            .field(FieldRule::string("password").required().min_len(8)),
                    ),
                move |ctx| {
                    let pipeline = login_pipeline.clone();
                    let store = store.clone();
                    async move {
                        let email = ctx.body["email"].as_str().unwrap_or_default();
                        let password = ctx.body["password"].as_str().unwrap_or_default();
                        // Demo wiring: plaintext comparison against the
                        // seeded record. Production login lives outside
                        // this crate.
                        let account = store
                            .find_by_email(email)
                            .filter(|account| account.password_hash == password);
                        match account {
                            Some(account) => {
                                let token = pipeline
                                    .token_verifier()
                                    .issue(&account.id, token_ttl_secs)?;
                                Ok(HandlerReply::ok(json!({ "token": token })))
                            }
                            None => Ok(HandlerReply::error(
                                StatusCode::UNAUTHORIZED,
                                "INVALID_CREDENTIALS",
                                "Invalid credentials",
                            )),
                        }
                    }
                },
            ),
        )
        .route(
            "/api/agents",
            pipeline.endpoint(
                EndpointPolicy::new([Method::GET, Method::POST])
                    .rate_class(RateClass::Agents)
                    .query(
                        Contract::permissive()
                            .field(FieldRule::integer("page").coerce().min(1))
                            .field(FieldRule::integer("limit").coerce().min(1).max(100)),
                    )
                    .body(
                        Contract::strict()
                            .field(FieldRule::string("name").required().min_len(1).max_len(64))
                            .field(
                                FieldRule::string("kind").one_of(&["autonomous", "supervised"]),
                            )
                            .field(FieldRule::array("capabilities")),
                    ),
                |ctx| async move {
                    if ctx.method == Method::POST {
                        Ok(HandlerReply::created(json!({ "agent": ctx.body })))
                    } else {
                        Ok(HandlerReply::ok(json!({ "agents": [], "query": ctx.query })))
                    }
                },
            ),
        )
        .route(
            "/api/agents/{id}",
            pipeline.endpoint(
                EndpointPolicy::new([Method::DELETE])
                    .roles(["admin"])
                    .rate_class(RateClass::Agents)
                    .params(
                        Contract::strict()
                            .field(FieldRule::string("id").required().pattern(r"^[\w-]{1,64}$")),
                    ),
                |ctx| async move {
                    Ok(HandlerReply::message(format!(
                        "agent {} deleted",
                        ctx.params["id"].as_str().unwrap_or_default()
                    )))
                },
            ),
        )
        .route(
            "/api/trust/declarations",
            pipeline.endpoint(
                EndpointPolicy::new([Method::GET, Method::POST])
                    .rate_class(RateClass::Trust)
                    .body(
                        Contract::strict()
                            .field(FieldRule::string("subject").required())
                            .field(FieldRule::string("object").required())
                            .field(
                                FieldRule::integer("confidence").required().min(0).max(100),
                            ),
                    ),
                |ctx| async move {
                    if ctx.method == Method::POST {
                        Ok(HandlerReply::created(json!({ "declaration": ctx.body })))
                    } else {
                        Ok(HandlerReply::ok(json!({ "declarations": [] })))
                    }
                },
            ),
        )
}

fn seed_demo_accounts(store: &MemoryStore) {
    store.insert(Account {
        id: "agent-admin".to_string(),
        email: "admin@example.com".to_string(),
        password_hash: "admin-password".to_string(),
        role: "admin".to_string(),
        scopes: vec![],
    });
    store.insert(Account {
        id: "agent-user".to_string(),
        email: "user@example.com".to_string(),
        password_hash: "user-password".to_string(),
        role: "user".to_string(),
        scopes: vec!["agents:read".to_string()],
    });
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
