//! Register, login, refresh and logout.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use super::cookies::{parse_cookie, ACCESS_COOKIE, LOGGED_IN_COOKIE, REFRESH_COOKIE};
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::RequestContext;
use crate::users::{hash_password_blocking, is_email, normalize_username, verify_password_blocking, NewUser, UserStoreError};

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Identity can be a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

pub(crate) fn bad_body(e: JsonRejection) -> AppError {
    tracing::debug!("rejected request body: {}", e);
    AppError::user("invalid_body", "Something's wrong with your input")
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(bad_body)?;
    let username = normalize_username(&payload.username).map_err(|e| AppError::user("invalid_username".to_string(), e.to_string()))?;
    let email = payload.email.trim().to_string();
    if !is_email(&email) {
        return Err(AppError::user("invalid_email", "Email address is not valid"));
    }
    if payload.password.is_empty() {
        return Err(AppError::user("invalid_password", "Password must not be empty"));
    }
    let password_hash = hash_password_blocking(payload.password).await?;

    let user = state.users.create(NewUser { username, email, password_hash }).await?;
    tracing::info!(user = %user.id, username = %user.username, "register");
    Ok((StatusCode::CREATED, Json(user.view())))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(bad_body)?;

    let email = payload.email.as_deref().map(str::trim).filter(|e| is_email(e));
    let (field, lookup) = match email {
        Some(email) => ("email", state.users.find_by_email(email).await),
        None => {
            let raw = payload.username.as_deref().unwrap_or_default();
            let username = normalize_username(raw).map_err(|e| AppError::user("invalid_username".to_string(), e.to_string()))?;
            ("username", state.users.find_by_username(&username).await)
        }
    };
    let user = match lookup {
        Ok(u) => u,
        Err(UserStoreError::NotFound) => {
            return Err(AppError::not_found("user_not_found".to_string(), format!("No user with that {} exists", field)))
        }
        Err(e) => return Err(e.into()),
    };
    if !verify_password_blocking(user.password_hash.clone(), payload.password).await {
        tracing::debug!(user = %user.id, "login: password mismatch");
        return Err(AppError::user("invalid_credentials", "Invalid credentials"));
    }

    let creds = state.sessions.login(user.id).await?;
    let access = state.sessions.access();
    let refresh = state.sessions.refresh_settings();

    let mut headers = HeaderMap::new();
    state.cookies.set(&mut headers, ACCESS_COOKIE, &creds.access.token, access.max_age, true)?;
    state.cookies.set(&mut headers, REFRESH_COOKIE, &creds.refresh.token, refresh.max_age, true)?;
    state.cookies.set(&mut headers, LOGGED_IN_COOKIE, "true", access.max_age, false)?;

    Ok((
        StatusCode::ACCEPTED,
        headers,
        Json(json!({
            "status": "success",
            "message": "Login Success",
            "user": user.view(),
            "access_token": creds.access.token,
        })),
    ))
}

pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let raw = parse_cookie(&headers, REFRESH_COOKIE);
    let (access, user) = state.sessions.refresh(raw.as_deref()).await.map_err(|e| {
        tracing::debug!(reason = %e, code = e.code(), "refresh rejected");
        AppError::from(e)
    })?;
    let max_age = state.sessions.access().max_age;

    let mut out = HeaderMap::new();
    state.cookies.set(&mut out, ACCESS_COOKIE, &access.token, max_age, true)?;
    state.cookies.set(&mut out, LOGGED_IN_COOKIE, "true", max_age, false)?;

    Ok((
        StatusCode::ACCEPTED,
        out,
        Json(json!({
            "status": "success",
            "message": "Access token refreshed",
            "user": user.view(),
            "access_token": access.token,
        })),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let refresh = parse_cookie(&headers, REFRESH_COOKIE);
    state.sessions.logout(ctx.user.id, ctx.access_session_id, refresh.as_deref()).await?;

    let mut out = HeaderMap::new();
    state.cookies.expire(&mut out, ACCESS_COOKIE, "", true)?;
    state.cookies.expire(&mut out, REFRESH_COOKIE, "", true)?;
    state.cookies.set_session(&mut out, LOGGED_IN_COOKIE, "false", false)?;

    Ok((StatusCode::OK, out, Json(json!({"status": "success", "message": "Successfully logged out"}))))
}
