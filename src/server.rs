//!
//! factdeck HTTP server
//! --------------------
//! This module defines the Axum-based HTTP API for factdeck.
//!
//! Responsibilities:
//! - Account endpoints: register, login, refresh, logout, and user CRUD.
//! - Fact endpoints: list/get/create/delete quiz questions.
//! - The authorization gate in front of every protected route.
//! - JSON failure bodies for every error, including unknown routes.
//! - Background sweep of expired sessions.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::facts::{FactStore, MemoryFactStore};
use crate::identity::{
    AuthorizationGate, CodecError, CredentialIssuer, MemorySessionStore, SessionRegistry, SessionService, SessionStore,
    TokenSettings,
};
use crate::users::{MemoryUserStore, UserStore};

pub mod auth_routes;
pub mod cookies;
pub mod fact_routes;
pub mod middleware;
pub mod user_routes;

use cookies::CookieSettings;

/// Handles shared by every request. Cloning is cheap; all stores sit behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub facts: Arc<dyn FactStore>,
    pub sessions: SessionService,
    pub gate: AuthorizationGate,
    pub cookies: CookieSettings,
}

impl AppState {
    /// Wire the auth core over the given stores. Fails if either key pair does not
    /// decode.
    pub fn new(
        cfg: &AppConfig,
        session_store: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        facts: Arc<dyn FactStore>,
    ) -> Result<Self, CodecError> {
        let access_keys = Arc::new(cfg.access.keys()?);
        let refresh_keys = Arc::new(cfg.refresh.keys()?);
        let registry = SessionRegistry::new(session_store, cfg.session_store_timeout);

        let gate = AuthorizationGate::new(access_keys.clone(), registry.clone(), users.clone(), cfg.session_store_timeout);
        let sessions = SessionService::new(
            TokenSettings {
                issuer: CredentialIssuer::new(access_keys),
                ttl: cfg.access.expires_in,
                max_age: cfg.access.max_age,
            },
            TokenSettings {
                issuer: CredentialIssuer::new(refresh_keys),
                ttl: cfg.refresh.expires_in,
                max_age: cfg.refresh.max_age,
            },
            registry,
            users.clone(),
            cfg.session_store_timeout,
        );
        let cookies = CookieSettings { domain: cfg.cookie_domain.clone(), secure: cfg.cookie_secure };

        Ok(Self { users, facts, sessions, gate, cookies })
    }
}

/// Full route table. Register, login and refresh are public; everything else
/// passes through the authorization gate first.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/v1/register", post(auth_routes::register))
        .route("/auth/v1/login", post(auth_routes::login))
        .route("/auth/v1/refresh", get(auth_routes::refresh));

    let protected = Router::new()
        .route("/auth/v1/logout", get(auth_routes::logout))
        .route("/auth/v1/users/me", get(user_routes::me))
        .route(
            "/auth/v1/users/{id}",
            get(user_routes::get_user).put(user_routes::update_user).delete(user_routes::delete_user),
        )
        .route("/api/v1/facts", get(fact_routes::list_facts).post(fact_routes::create_fact))
        .route("/api/v1/facts/{id}", get(fact_routes::get_fact).delete(fact_routes::delete_fact))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(no_such_route)
        .layer(from_fn(middleware::log_requests))
        .with_state(state)
}

async fn no_such_route() -> AppError {
    AppError::not_found("no_such_route", "Route not found")
}

/// Start the factdeck HTTP server with in-memory stores.
pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    info!(
        target: "startup",
        "factdeck starting: http_port={}, access_ttl={:?}, refresh_ttl={:?}, cookie_domain={:?}, cookie_secure={}, store_timeout={:?}",
        cfg.http_port, cfg.access.expires_in, cfg.refresh.expires_in, cfg.cookie_domain, cfg.cookie_secure, cfg.session_store_timeout
    );

    let session_store = MemorySessionStore::new();
    // Dropping the handle detaches the task; it lives as long as the runtime.
    let _sweeper = session_store.spawn_sweeper(cfg.session_sweep_interval);

    let state = AppState::new(
        &cfg,
        Arc::new(session_store),
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryFactStore::new()),
    )
    .context("While decoding credential keys")?;

    let app = build_router(state);
    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
