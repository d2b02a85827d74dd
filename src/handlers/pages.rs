// src/handlers/pages.rs

use std::{io::ErrorKind, path::Path as FsPath};

use axum::{
    extract::{Path, State, rejection::PathRejection},
    response::{Html, IntoResponse},
};
use serde::Deserialize;

use crate::{config::Config, error::AppError};

/// Audience a quiz page is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    HighSchoolStudent,
    MiddleSchoolStudent,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::HighSchoolStudent => "high-school-student",
            Tier::MiddleSchoolStudent => "middle-school-student",
        }
    }
}

/// Quiz difficulty. The first/second/third page names are kept as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "first")]
    Easy,
    #[serde(alias = "second")]
    Medium,
    #[serde(alias = "third")]
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

async fn render_page(path: &FsPath) -> Result<Html<String>, AppError> {
    match tokio::fs::read_to_string(path).await {
        Ok(markup) => Ok(Html(markup)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("Missing page file {}", path.display());
            Err(AppError::NotFound("Page not found".to_string()))
        }
        Err(e) => Err(AppError::InternalServerError(format!(
            "failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Dashboard page.
pub async fn index(State(config): State<Config>) -> Result<impl IntoResponse, AppError> {
    render_page(&config.static_dir.join("index.html")).await
}

/// Quiz page for one audience tier and difficulty.
pub async fn quiz_page(
    State(config): State<Config>,
    params: Result<Path<(Tier, Difficulty)>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path((tier, difficulty)) =
        params.map_err(|_| AppError::NotFound("Unknown quiz".to_string()))?;

    let page = config
        .static_dir
        .join(tier.as_str())
        .join(format!("{}.html", difficulty.as_str()));

    render_page(&page).await
}
