// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    db::AttemptStore,
    error::AppError,
    models::attempt::{CheckTestRequest, SubmitTestRequest},
};

/// Trimmed value of a required field; whitespace alone counts as missing.
fn not_blank<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    match value.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed),
        _ => Err(AppError::BadRequest(format!("Missing required field: {}", field))),
    }
}

/// Reports whether the student already took this level.
///
/// Answers `{"status": "exists", ...}` with the recorded result, or `{"status": "ok"}`.
pub async fn check_test(
    State(store): State<AttemptStore>,
    payload: Result<Json<CheckTestRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let existing = store
        .find_existing(
            not_blank(&req.first_name, "firstName")?,
            not_blank(&req.last_name, "lastName")?,
            not_blank(&req.class_name, "className")?,
            not_blank(&req.test_level, "testLevel")?,
        )
        .await?;

    let body = match existing {
        Some(attempt) => json!({
            "status": "exists",
            "score": attempt.score,
            "max_score": attempt.max_score,
            "created_at": attempt.created_at,
        }),
        None => json!({ "status": "ok" }),
    };

    Ok(Json(body))
}

/// Records a finished quiz.
///
/// * 400 when a required field is missing or the answers cannot be decoded.
/// * 409 when the student already has an attempt at this level.
pub async fn submit_test(
    State(store): State<AttemptStore>,
    payload: Result<Json<SubmitTestRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let test_id = store.save(req.into_new_attempt()).await?;

    Ok(Json(json!({
        "status": "success",
        "test_id": test_id,
        "message": "Test submitted successfully"
    })))
}

/// Lists every attempt, newest first.
pub async fn list_tests(State(store): State<AttemptStore>) -> Result<impl IntoResponse, AppError> {
    let attempts = store.list().await?;
    Ok(Json(attempts))
}

/// Retrieves a single attempt by ID.
pub async fn get_test(
    State(store): State<AttemptStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = store
        .get(id)
        .await?
        .ok_or(AppError::NotFound("Test not found".to_string()))?;

    Ok(Json(attempt))
}

pub async fn get_statistics(
    State(store): State<AttemptStore>,
) -> Result<impl IntoResponse, AppError> {
    let statistics = store.statistics().await?;
    Ok(Json(statistics))
}

/// Cities seen so far with their schools, for the teacher's filter dropdowns.
pub async fn get_locations(
    State(store): State<AttemptStore>,
) -> Result<impl IntoResponse, AppError> {
    let locations = store.locations().await?;
    Ok(Json(locations))
}

/// Removes all attempts and restarts test ids at 1.
pub async fn clear_database(
    State(store): State<AttemptStore>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = store.clear().await?;

    Ok(Json(json!({
        "status": "success",
        "deleted": deleted
    })))
}
