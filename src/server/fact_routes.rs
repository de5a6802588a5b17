use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};

use super::auth_routes::bad_body;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::facts::{check_question, NewQuestion};
use crate::identity::RequestContext;

fn fact_id(path: Result<Path<u64>, PathRejection>) -> AppResult<u64> {
    // A non-numeric id can never match a row.
    path.map(|Path(id)| id).map_err(|_| AppError::not_found("fact_not_found", "No data with that Id exists"))
}

pub async fn list_facts(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.facts.list().await?))
}

pub async fn get_fact(State(state): State<AppState>, path: Result<Path<u64>, PathRejection>) -> AppResult<impl IntoResponse> {
    let id = fact_id(path)?;
    Ok(Json(state.facts.get(id).await?))
}

pub async fn create_fact(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<NewQuestion>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(new) = payload.map_err(|e| match bad_body(e) {
        AppError::UserInput { code, message } => AppError::invalid(code, message),
        other => other,
    })?;
    check_question(&new)?;
    let question = state.facts.create(ctx.user.id, new).await?;
    tracing::info!(question = question.id, author = %ctx.user.id, "fact created");
    Ok(Json(question))
}

pub async fn delete_fact(State(state): State<AppState>, path: Result<Path<u64>, PathRejection>) -> AppResult<impl IntoResponse> {
    let id = fact_id(path)?;
    let question = state.facts.delete(id).await?;
    tracing::info!(question = question.id, "fact deleted");
    Ok(Json(question))
}
