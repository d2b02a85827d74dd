// src/handlers/teacher.rs

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    db::AttemptStore,
    error::AppError,
    models::teacher::VerifyKeyRequest,
    utils::teacher_key::{key_matches, load_teacher_key},
};

/// Unlocks the class results for a teacher.
///
/// The submitted key is checked against the key file, which is re-read on
/// every request. On success returns attempts grouped by class, optionally
/// narrowed to one city and/or school.
pub async fn verify_key(
    State(store): State<AttemptStore>,
    State(config): State<Config>,
    payload: Result<Json<VerifyKeyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let expected = load_teacher_key(&config.teacher_key_path).await?;
    let submitted = req.key.as_deref().unwrap_or_default();

    if !key_matches(submitted, &expected) {
        tracing::warn!("Rejected teacher key");
        return Err(AppError::Forbidden("Invalid key".to_string()));
    }

    let classes = store.group_by_class(&req.filter()).await?;

    Ok(Json(json!({
        "status": "success",
        "classes": classes
    })))
}
