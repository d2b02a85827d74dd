// src/models/attempt.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// One graded question inside an attempt.
///
/// The quiz page grades itself and sends the correct answer along with the
/// student's, so both travel in the submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// 1-based question number on the quiz page.
    #[serde(alias = "questionNumber")]
    pub question: u32,

    /// Answer as sent by the page: a string, a number or a list of choices.
    #[serde(alias = "userAnswer")]
    pub user_answer: serde_json::Value,

    #[serde(alias = "correctAnswer")]
    pub correct_answer: serde_json::Value,

    #[serde(alias = "isCorrect")]
    pub is_correct: bool,
}

/// Answers as accepted on submission.
///
/// Older quiz pages post the answer list already JSON-encoded as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswersPayload {
    Records(Vec<AnswerRecord>),
    Serialized(String),
}

impl AnswersPayload {
    pub fn into_records(self) -> Result<Vec<AnswerRecord>, serde_json::Error> {
        match self {
            AnswersPayload::Records(records) => Ok(records),
            AnswersPayload::Serialized(raw) => serde_json::from_str(&raw),
        }
    }
}

impl From<Vec<AnswerRecord>> for AnswersPayload {
    fn from(records: Vec<AnswerRecord>) -> Self {
        AnswersPayload::Records(records)
    }
}

/// Represents the 'attempts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attempt {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub class_name: String,

    /// Empty when the student did not give one.
    pub city: String,
    pub school: String,

    /// Stored as a JSON array in the database.
    pub answers: Json<Vec<AnswerRecord>>,

    pub score: i64,

    /// Number of answer records at submission time.
    pub max_score: i64,

    pub level: String,

    /// Seconds spent on the quiz.
    pub time_spent: i64,

    pub created_at: chrono::NaiveDateTime,
}

/// Input for saving a new attempt.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub first_name: String,
    pub last_name: String,
    pub class_name: String,
    pub city: Option<String>,
    pub school: Option<String>,
    pub answers: AnswersPayload,
    pub score: i64,
    pub level: String,
    pub time_spent: i64,
}

/// Summary of an attempt already on record for a student and level.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExistingAttempt {
    pub score: i64,
    pub max_score: i64,
    pub created_at: chrono::NaiveDateTime,
}

/// Aggregated results across all attempts.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_tests: i64,
    pub average_score_percent: f64,
    pub by_level: BTreeMap<String, LevelStatistics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelStatistics {
    pub count: i64,
    pub average_score_percent: f64,
}

/// Optional narrowing of the per-class view. Blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassFilter {
    pub city: Option<String>,
    pub school: Option<String>,
}

impl ClassFilter {
    pub fn matches(&self, attempt: &Attempt) -> bool {
        field_matches(self.city.as_deref(), &attempt.city)
            && field_matches(self.school.as_deref(), &attempt.school)
    }
}

fn field_matches(wanted: Option<&str>, actual: &str) -> bool {
    match wanted.map(normalize).filter(|w| !w.is_empty()) {
        Some(wanted) => normalize(actual) == wanted,
        None => true,
    }
}

/// Case and whitespace insensitive form used for all identity comparisons.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Key under which a student may hold at most one attempt per level.
pub fn identity_key(first_name: &str, last_name: &str, class_name: &str, level: &str) -> String {
    [first_name, last_name, class_name, level]
        .iter()
        .map(|part| normalize(part))
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

/// Rounds a percentage to two decimals for reporting.
pub fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// DTO for asking whether a student already took a level.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckTestRequest {
    #[validate(required, length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(required, length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(required, length(min = 1, max = 50))]
    pub class_name: Option<String>,
    #[validate(required, length(min = 1, max = 50))]
    pub test_level: Option<String>,
}

/// DTO for submitting a finished quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTestRequest {
    #[validate(required, length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(required, length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(required, length(min = 1, max = 50))]
    pub class_name: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 200))]
    pub school: Option<String>,
    #[validate(required)]
    pub answers: Option<AnswersPayload>,
    #[validate(required, length(min = 1, max = 50))]
    pub test_level: Option<String>,
    #[validate(required)]
    pub score: Option<i64>,
    /// Seconds spent on the quiz.
    #[validate(range(min = 0))]
    pub time: Option<i64>,
}

impl SubmitTestRequest {
    /// Converts a validated request into storage input.
    pub fn into_new_attempt(self) -> NewAttempt {
        NewAttempt {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            class_name: self.class_name.unwrap_or_default(),
            city: self.city,
            school: self.school,
            answers: self
                .answers
                .unwrap_or(AnswersPayload::Records(Vec::new())),
            score: self.score.unwrap_or_default(),
            level: self.test_level.unwrap_or_default(),
            time_spent: self.time.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_ignores_case_and_padding() {
        assert_eq!(
            identity_key("  Анна ", "Иванова", "9A", "easy"),
            identity_key("анна", "ИВАНОВА ", " 9a", "EASY"),
        );
        assert_ne!(
            identity_key("Anna", "Ivanova", "9A", "easy"),
            identity_key("Anna", "Ivanova", "9A", "hard"),
        );
    }

    #[test]
    fn serialized_answers_are_decoded() {
        let payload: AnswersPayload = serde_json::from_value(serde_json::json!(
            r#"[{"question":1,"userAnswer":"b","correctAnswer":"b","isCorrect":true}]"#
        ))
        .unwrap();

        let records = payload.into_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_answer, serde_json::json!("b"));
        assert!(records[0].is_correct);
    }

    #[test]
    fn percentages_round_to_two_decimals() {
        assert_eq!(round_percent(200.0 / 3.0), 66.67);
        assert_eq!(round_percent(60.0), 60.0);
    }

    #[test]
    fn blank_filter_matches_everything() {
        let filter = ClassFilter {
            city: Some("  ".to_string()),
            school: None,
        };
        assert!(field_matches(filter.city.as_deref(), ""));
        assert!(field_matches(Some("moscow"), " Moscow "));
        assert!(!field_matches(Some("moscow"), ""));
    }
}
