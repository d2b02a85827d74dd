// src/utils/teacher_key.rs

use std::path::Path;

use crate::error::AppError;

/// Reads the teacher key from disk.
///
/// The file is read on every call so the key can be rotated without a restart.
/// A missing, unreadable or blank file is a server-side misconfiguration.
pub async fn load_teacher_key(path: &Path) -> Result<String, AppError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        tracing::error!("Failed to read teacher key file {}: {:?}", path.display(), e);
        AppError::InternalServerError(format!("teacher key unavailable: {}", e))
    })?;

    let key = raw.trim();
    if key.is_empty() {
        return Err(AppError::InternalServerError(format!(
            "teacher key file {} is empty",
            path.display()
        )));
    }

    Ok(key.to_string())
}

/// Compares a submitted key with the expected one, ignoring surrounding whitespace.
///
/// Runs over the full length regardless of where the first difference is.
pub fn key_matches(submitted: &str, expected: &str) -> bool {
    let submitted = submitted.trim().as_bytes();
    let expected = expected.as_bytes();

    if submitted.len() != expected.len() {
        return false;
    }

    submitted
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
