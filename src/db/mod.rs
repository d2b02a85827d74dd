// src/db/mod.rs

use std::{fmt, str::FromStr};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

mod attempt;
mod report;

/// Connection settings for the attempt store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
}

/// Storage layer error.
#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),

    /// Schema migrations could not be applied.
    Migration(sqlx::migrate::MigrateError),

    /// A required identity field was empty after trimming.
    MissingField(&'static str),

    /// Answers arrived as a string that is not a JSON answer list.
    InvalidAnswers(serde_json::Error),

    /// The student already has an attempt at this level.
    Duplicate,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "database error: {}", e),
            StoreError::Migration(e) => write!(f, "migration error: {}", e),
            StoreError::MissingField(field) => write!(f, "missing required field: {}", field),
            StoreError::InvalidAnswers(e) => write!(f, "invalid answers: {}", e),
            StoreError::Duplicate => write!(f, "attempt already exists"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            StoreError::Migration(e) => Some(e),
            StoreError::InvalidAnswers(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Database(err),
        }
    }
}

/// Handle over the `attempts` table.
#[derive(Clone)]
pub struct AttemptStore {
    pool: SqlitePool,
}

impl AttemptStore {
    /// Opens the database (creating the file if needed) and brings the schema up to date.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self::from_pool(pool);
        store.initialize().await?;

        tracing::info!(url = %config.database_url, "attempt store ready");
        Ok(store)
    }

    /// Wraps an existing pool. Call [`AttemptStore::initialize`] before use.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensures the schema exists. Safe to call on an initialized database.
    ///
    /// Applies pending migrations, then gives rows written before the
    /// identity index their key.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {:?}", e);
                StoreError::Migration(e)
            })?;

        let filled = self.backfill_identity_keys().await?;
        if filled > 0 {
            tracing::info!(filled, "backfilled identity keys on existing attempts");
        }

        Ok(())
    }
}
