// src/db/report.rs

use std::collections::BTreeMap;

use super::{AttemptStore, StoreError, attempt::ATTEMPT_COLUMNS};
use crate::models::attempt::{
    Attempt, ClassFilter, LevelStatistics, Statistics, normalize, round_percent,
};

/// Per-row percentage; attempts without answer records count as 0%.
const PERCENT_EXPR: &str =
    "CASE WHEN max_score > 0 THEN score * 100.0 / max_score ELSE 0.0 END";

impl AttemptStore {
    /// Attempt count and mean percentage score, overall and per level.
    pub async fn statistics(&self) -> Result<Statistics, StoreError> {
        let overall_sql = format!(
            "SELECT COUNT(*), COALESCE(AVG({}), 0.0) FROM attempts",
            PERCENT_EXPR
        );
        let (total_tests, average): (i64, f64) = sqlx::query_as(&overall_sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to compute statistics: {:?}", e);
                StoreError::from(e)
            })?;

        let level_sql = format!(
            "SELECT level, COUNT(*), AVG({}) FROM attempts GROUP BY level ORDER BY level",
            PERCENT_EXPR
        );
        let levels: Vec<(String, i64, f64)> = sqlx::query_as(&level_sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to compute level statistics: {:?}", e);
                StoreError::from(e)
            })?;

        let by_level = levels
            .into_iter()
            .map(|(level, count, average)| {
                (
                    level,
                    LevelStatistics {
                        count,
                        average_score_percent: round_percent(average),
                    },
                )
            })
            .collect();

        Ok(Statistics {
            total_tests,
            average_score_percent: round_percent(average),
            by_level,
        })
    }

    /// Attempts keyed by class, each class ordered by family then given name.
    ///
    /// City and school filters compare trimmed values case-insensitively;
    /// attempts without a city never match a non-blank city filter.
    pub async fn group_by_class(
        &self,
        filter: &ClassFilter,
    ) -> Result<BTreeMap<String, Vec<Attempt>>, StoreError> {
        let sql = format!(
            "SELECT {} FROM attempts ORDER BY class_name, last_name, first_name, id",
            ATTEMPT_COLUMNS
        );

        let attempts = sqlx::query_as::<_, Attempt>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch attempts by class: {:?}", e);
                StoreError::from(e)
            })?;

        let mut classes: BTreeMap<String, Vec<Attempt>> = BTreeMap::new();
        for attempt in attempts.into_iter().filter(|a| filter.matches(a)) {
            classes
                .entry(attempt.class_name.clone())
                .or_default()
                .push(attempt);
        }

        Ok(classes)
    }

    /// Distinct schools seen for each city, both compared case-insensitively.
    /// Blank cities and schools are skipped.
    pub async fn locations(&self) -> Result<BTreeMap<String, Vec<String>>, StoreError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT DISTINCT city, school
            FROM attempts
            WHERE TRIM(city) <> ''
            ORDER BY city, school
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch locations: {:?}", e);
            StoreError::from(e)
        })?;

        // Keyed by normalized city; the first spelling seen is the one reported.
        let mut cities: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();
        for (city, school) in rows {
            let (_, schools) = cities
                .entry(normalize(&city))
                .or_insert_with(|| (city.trim().to_string(), Vec::new()));
            let school = school.trim();
            if school.is_empty() {
                continue;
            }
            if !schools.iter().any(|known| normalize(known) == normalize(school)) {
                schools.push(school.to_string());
            }
        }

        Ok(cities.into_values().collect())
    }
}
