//! Unified application error model and mapping helpers.
//! Handlers return `AppResult<T>`; every variant maps to an HTTP status and to the
//! `{"status": "fail"|"error", "message": ...}` body the API uses for all failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::facts::{FactStoreError, QuestionRuleError};
use crate::identity::AuthError;
use crate::users::UserStoreError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    /// Well-formed input that breaks a domain rule; 400 with status "error".
    Invalid { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    Unauthenticated { code: String, message: String },
    Forbidden { code: String, message: String },
    Upstream { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::Invalid { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Unauthenticated { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Upstream { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::Invalid { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Unauthenticated { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Upstream { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn invalid<S: Into<String>>(code: S, msg: S) -> Self { AppError::Invalid { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn unauthenticated<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unauthenticated { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn upstream<S: Into<String>>(code: S, msg: S) -> Self { AppError::Upstream { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } | AppError::Invalid { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::Unauthenticated { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::Upstream { .. } => 502,
            AppError::Internal { .. } => 500,
        }
    }

    /// Value of the `status` field in the JSON body: "fail" for client-side
    /// problems, "error" for rule violations and server or store faults.
    pub fn body_status(&self) -> &'static str {
        match self {
            AppError::Invalid { .. } | AppError::Upstream { .. } | AppError::Internal { .. } => "error",
            _ => "fail",
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "status": self.body_status(),
            "message": self.message(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal("internal".to_string(), err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.public_message().to_string();
        let code = err.code().to_string();
        match err {
            AuthError::Unauthenticated => AppError::unauthenticated(code, message),
            AuthError::Credential(_)
            | AuthError::SessionExpiredOrRevoked
            | AuthError::UserGone => AppError::forbidden(code, message),
            AuthError::StoreUnavailable(_) => AppError::upstream(code, message),
            AuthError::Issue(_) => AppError::internal(code, message),
        }
    }
}

impl From<UserStoreError> for AppError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::NotFound => AppError::not_found("user_not_found", "No user with that id exists"),
            UserStoreError::UsernameTaken(name) => {
                AppError::conflict("username_taken".to_string(), format!("Username '{}' is already taken", name))
            }
            UserStoreError::Unavailable(msg) => AppError::upstream("user_store_unavailable".to_string(), msg),
        }
    }
}

impl From<FactStoreError> for AppError {
    fn from(err: FactStoreError) -> Self {
        match err {
            FactStoreError::NotFound => AppError::not_found("fact_not_found", "No data with that Id exists"),
            FactStoreError::Unavailable(msg) => AppError::upstream("fact_store_unavailable".to_string(), msg),
        }
    }
}

impl From<QuestionRuleError> for AppError {
    fn from(err: QuestionRuleError) -> Self {
        AppError::invalid("invalid_question".to_string(), err.to_string())
    }
}
