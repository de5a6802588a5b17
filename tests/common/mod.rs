//! Shared harness for the HTTP integration tests: an in-memory app wired with
//! the RSA fixtures, plus request/response helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use base64::Engine;
use serde_json::Value;
use tower::ServiceExt;

use factdeck::config::AppConfig;
use factdeck::facts::MemoryFactStore;
use factdeck::identity::{MemorySessionStore, SessionStore};
use factdeck::server::{build_router, AppState};
use factdeck::users::MemoryUserStore;

const ACCESS_PRIVATE: &str = include_str!("../fixtures/access_private.pem");
const ACCESS_PUBLIC: &str = include_str!("../fixtures/access_public.pem");
const REFRESH_PRIVATE: &str = include_str!("../fixtures/refresh_private.pem");
const REFRESH_PUBLIC: &str = include_str!("../fixtures/refresh_public.pem");

fn b64(pem: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(pem)
}

pub fn config_with(overrides: &[(&str, &str)]) -> AppConfig {
    let mut env: HashMap<String, String> = HashMap::new();
    env.insert("ACCESS_TOKEN_PRIVATE_KEY".into(), b64(ACCESS_PRIVATE));
    env.insert("ACCESS_TOKEN_PUBLIC_KEY".into(), b64(ACCESS_PUBLIC));
    env.insert("ACCESS_TOKEN_EXPIRED_IN".into(), "15m".into());
    env.insert("ACCESS_TOKEN_MAX_AGE".into(), "15".into());
    env.insert("REFRESH_TOKEN_PRIVATE_KEY".into(), b64(REFRESH_PRIVATE));
    env.insert("REFRESH_TOKEN_PUBLIC_KEY".into(), b64(REFRESH_PUBLIC));
    env.insert("REFRESH_TOKEN_EXPIRED_IN".into(), "60m".into());
    env.insert("REFRESH_TOKEN_MAX_AGE".into(), "60".into());
    env.insert("SESSION_STORE_TIMEOUT_MS".into(), "200".into());
    for (k, v) in overrides {
        env.insert(k.to_string(), v.to_string());
    }
    AppConfig::from_lookup(|k| env.get(k).cloned()).expect("test config")
}

pub struct TestApp {
    pub router: Router,
    pub sessions: MemorySessionStore,
    pub users: MemoryUserStore,
    pub facts: MemoryFactStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(config_with(&[]))
    }

    pub fn with_config(cfg: AppConfig) -> Self {
        let sessions = MemorySessionStore::new();
        let users = MemoryUserStore::new();
        let facts = MemoryFactStore::new();
        let state = AppState::new(&cfg, Arc::new(sessions.clone()), Arc::new(users.clone()), Arc::new(facts.clone()))
            .expect("fixture keys decode");
        Self { router: build_router(state), sessions, users, facts }
    }

    /// App over an arbitrary session backend.
    pub fn with_session_store(store: Arc<dyn SessionStore>) -> Self {
        let cfg = config_with(&[]);
        let users = MemoryUserStore::new();
        let facts = MemoryFactStore::new();
        let state = AppState::new(&cfg, store, Arc::new(users.clone()), Arc::new(facts.clone())).expect("fixture keys decode");
        Self { router: build_router(state), sessions: MemorySessionStore::new(), users, facts }
    }

    pub async fn send(&self, req: Request<Body>) -> Reply {
        let resp = self.router.clone().oneshot(req).await.expect("router is infallible");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        Reply { status, headers, body }
    }

    pub async fn register(&self, username: &str, password: &str) -> Reply {
        let body = serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username.to_lowercase()),
            "password": password,
        });
        self.send(json_request(Method::POST, "/auth/v1/register", &body, None)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Reply {
        let body = serde_json::json!({"username": username, "password": password});
        self.send(json_request(Method::POST, "/auth/v1/login", &body, None)).await
    }

    /// Register then log in; returns the login reply.
    pub async fn signed_in(&self, username: &str) -> Reply {
        let reg = self.register(username, "hunter22").await;
        assert_eq!(reg.status, StatusCode::CREATED, "register: {}", reg.body);
        let reply = self.login(username, "hunter22").await;
        assert_eq!(reply.status, StatusCode::ACCEPTED, "login: {}", reply.body);
        reply
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    /// Value of a cookie set by this response, if any.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers.get_all(header::SET_COOKIE).iter().find_map(|v| {
            let s = v.to_str().ok()?;
            let first = s.split(';').next()?;
            let (k, val) = first.split_once('=')?;
            (k == name).then(|| val.to_string())
        })
    }

    pub fn set_cookie_line(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|s| s.starts_with(&format!("{}=", name)))
            .map(|s| s.to_string())
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

pub fn request(method: Method, uri: &str, bearer: Option<&str>, cookie: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
        b = b.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    if let Some(c) = cookie {
        b = b.header(header::COOKIE, c);
    }
    b.body(Body::empty()).expect("request")
}

pub fn json_request(method: Method, uri: &str, body: &Value, bearer: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = bearer {
        b = b.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    b.body(Body::from(body.to_string())).expect("request")
}
