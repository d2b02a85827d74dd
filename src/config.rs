// src/config.rs

use std::{env, path::PathBuf};
use dotenvy::dotenv;

use crate::db::StoreConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    /// Plaintext file holding the teacher access key. Read on every verification.
    pub teacher_key_path: PathBuf,
    /// Root of the dashboard and quiz pages.
    pub static_dir: PathBuf,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://quiz_results.db".to_string());

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let teacher_key_path = env::var("TEACHER_KEY_PATH")
            .unwrap_or_else(|_| "teacher_key.txt".to_string())
            .into();

        let static_dir = env::var("STATIC_DIR")
            .unwrap_or_else(|_| "static".to_string())
            .into();

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            max_connections,
            teacher_key_path,
            static_dir,
            port,
            allowed_origins,
            rust_log,
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url.clone(),
            max_connections: self.max_connections,
        }
    }
}
