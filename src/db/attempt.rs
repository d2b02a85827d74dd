// src/db/attempt.rs

use sqlx::types::Json;

use super::{AttemptStore, StoreError};
use crate::models::attempt::{Attempt, ExistingAttempt, NewAttempt, identity_key};

pub(super) const ATTEMPT_COLUMNS: &str = r#"
    id, first_name, last_name, class_name, city, school,
    answers, score, max_score, level, time_spent, created_at
"#;

fn required(value: &str, field: &'static str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

impl AttemptStore {
    /// Assigns identity keys to rows that predate the identity index.
    ///
    /// Rows are visited oldest first, so when a student already holds several
    /// attempts at a level only the earliest one takes the key. Returns the
    /// number of rows updated.
    pub(super) async fn backfill_identity_keys(&self) -> Result<u64, StoreError> {
        let rows: Vec<(i64, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, class_name, level
            FROM attempts
            WHERE identity_key IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut filled = 0;
        for (id, first_name, last_name, class_name, level) in rows {
            let key = identity_key(&first_name, &last_name, &class_name, &level);

            let updated = sqlx::query("UPDATE attempts SET identity_key = ? WHERE id = ?")
                .bind(key)
                .bind(id)
                .execute(&self.pool)
                .await;

            match updated.map_err(StoreError::from) {
                Ok(_) => filled += 1,
                Err(StoreError::Duplicate) => {
                    tracing::warn!(id, "attempt duplicates an earlier one, left without identity key");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(filled)
    }

    /// Deletes every attempt and restarts id assignment at 1.
    ///
    /// Returns the number of rows removed.
    pub async fn clear(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM attempts")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'attempts'")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::warn!(deleted, "cleared all attempts");
        Ok(deleted)
    }

    /// Looks up the attempt a student already has at a level, if any.
    pub async fn find_existing(
        &self,
        first_name: &str,
        last_name: &str,
        class_name: &str,
        level: &str,
    ) -> Result<Option<ExistingAttempt>, StoreError> {
        let key = identity_key(first_name, last_name, class_name, level);

        let existing = sqlx::query_as::<_, ExistingAttempt>(
            r#"
            SELECT score, max_score, created_at
            FROM attempts
            WHERE identity_key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check existing attempt: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(existing)
    }

    /// Records a finished attempt and returns its id.
    ///
    /// `max_score` is the number of answer records. A second attempt with the
    /// same student and level is rejected by the unique identity index with
    /// [`StoreError::Duplicate`].
    pub async fn save(&self, attempt: NewAttempt) -> Result<i64, StoreError> {
        let first_name = required(&attempt.first_name, "first_name")?;
        let last_name = required(&attempt.last_name, "last_name")?;
        let class_name = required(&attempt.class_name, "class_name")?;
        let level = required(&attempt.level, "level")?;

        let answers = attempt
            .answers
            .into_records()
            .map_err(StoreError::InvalidAnswers)?;
        let max_score = answers.len() as i64;
        let key = identity_key(&first_name, &last_name, &class_name, &level);

        let result = sqlx::query(
            r#"
            INSERT INTO attempts
            (first_name, last_name, class_name, city, school,
             answers, score, max_score, level, time_spent, identity_key)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&first_name)
        .bind(&last_name)
        .bind(&class_name)
        .bind(optional(attempt.city.as_deref()))
        .bind(optional(attempt.school.as_deref()))
        .bind(Json(&answers))
        .bind(attempt.score)
        .bind(max_score)
        .bind(&level)
        .bind(attempt.time_spent.max(0))
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Duplicate => StoreError::Duplicate,
            other => {
                tracing::error!("Failed to save attempt: {}", other);
                other
            }
        })?;

        let id = result.last_insert_rowid();
        tracing::info!(id, %class_name, %level, score = attempt.score, max_score, "attempt saved");
        Ok(id)
    }

    /// Every attempt, newest first.
    pub async fn list(&self) -> Result<Vec<Attempt>, StoreError> {
        let sql = format!(
            "SELECT {} FROM attempts ORDER BY created_at DESC, id DESC",
            ATTEMPT_COLUMNS
        );

        let attempts = sqlx::query_as::<_, Attempt>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list attempts: {:?}", e);
                StoreError::from(e)
            })?;

        Ok(attempts)
    }

    /// A single attempt, or `None` when the id is unknown.
    pub async fn get(&self, id: i64) -> Result<Option<Attempt>, StoreError> {
        let sql = format!("SELECT {} FROM attempts WHERE id = ?", ATTEMPT_COLUMNS);

        let attempt = sqlx::query_as::<_, Attempt>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch attempt {}: {:?}", id, e);
                StoreError::from(e)
            })?;

        Ok(attempt)
    }
}
