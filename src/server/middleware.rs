use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::cookies::extract_access_credential;
use super::AppState;
use crate::error::AppError;

/// Gate for protected routes. On success the [`crate::identity::RequestContext`]
/// is placed in request extensions for handlers to pick up.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, AppError> {
    let credential = extract_access_credential(request.headers());
    match state.gate.authorize(credential.as_deref()).await {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::debug!(path = %request.uri().path(), reason = %e, code = e.code(), "request rejected");
            Err(AppError::from(e))
        }
    }
}

pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "http"
    );
    response
}
