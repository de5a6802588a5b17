use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::auth_routes::bad_body;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::RequestContext;
use crate::users::{hash_password_blocking, is_email, normalize_username, UserPatch};

/// Empty or missing fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserPayload {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn user_id(path: Result<Path<Uuid>, PathRejection>) -> AppResult<Uuid> {
    path.map(|Path(id)| id).map_err(|e| {
        tracing::debug!("rejected user id: {}", e);
        AppError::user("invalid_id", "User id must be a UUID")
    })
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub async fn me(Extension(ctx): Extension<RequestContext>) -> impl IntoResponse {
    Json(json!({"status": "success", "data": {"user": ctx.user}}))
}

pub async fn get_user(State(state): State<AppState>, path: Result<Path<Uuid>, PathRejection>) -> AppResult<impl IntoResponse> {
    let id = user_id(path)?;
    let user = state.users.find_by_id(id).await?;
    Ok(Json(user.view()))
}

pub async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let id = user_id(path)?;
    let Json(payload) = payload.map_err(bad_body)?;

    let mut patch = UserPatch::default();
    if let Some(raw) = non_empty(payload.username) {
        patch.username = Some(normalize_username(&raw).map_err(|e| AppError::user("invalid_username".to_string(), e.to_string()))?);
    }
    if let Some(email) = non_empty(payload.email) {
        if !is_email(&email) {
            return Err(AppError::user("invalid_email", "Email address is not valid"));
        }
        patch.email = Some(email);
    }
    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        patch.password_hash = Some(hash_password_blocking(password).await?);
    }

    let user = state.users.update(id, patch).await?;
    tracing::info!(user = %user.id, "user updated");
    Ok(Json(user.view()))
}

pub async fn delete_user(State(state): State<AppState>, path: Result<Path<Uuid>, PathRejection>) -> AppResult<impl IntoResponse> {
    let id = user_id(path)?;
    let user = state.users.delete(id).await?;
    tracing::info!(user = %user.id, "user deleted");
    Ok(Json(user.view()))
}
