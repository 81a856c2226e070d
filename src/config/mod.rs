//! Configuration module for the roster.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::editor::EditorSettings;
use crate::errors::AppError;
use crate::models::DEFAULT_PAGE_SIZE;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Directory identity photos are written to
    pub upload_dir: PathBuf,
    /// Base URL uploaded photos are served under
    pub public_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Quiet period before a search input is applied
    pub search_debounce: Duration,
    /// Members per page
    pub page_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("ROSTER_DB_PATH")
            .unwrap_or_else(|_| "./data/roster.sqlite".to_string())
            .into();

        let upload_dir = env::var("ROSTER_UPLOAD_DIR")
            .unwrap_or_else(|_| "./data/uploads".to_string())
            .into();

        let public_url = env::var("ROSTER_PUBLIC_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let bind_addr = parse_var("ROSTER_BIND_ADDR", "127.0.0.1:8080".parse().ok())?;

        let log_level = env::var("ROSTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let debounce_ms: u64 = parse_var("ROSTER_SEARCH_DEBOUNCE_MS", Some(500))?;

        let page_size: usize = parse_var("ROSTER_PAGE_SIZE", Some(DEFAULT_PAGE_SIZE))?;
        if page_size == 0 {
            return Err(AppError::Validation(
                "ROSTER_PAGE_SIZE must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            db_path,
            upload_dir,
            public_url,
            bind_addr,
            log_level,
            search_debounce: Duration::from_millis(debounce_ms),
            page_size,
        })
    }

    /// Settings for editing sessions driven by this configuration.
    pub fn editor_settings(&self) -> EditorSettings {
        EditorSettings {
            search_debounce: self.search_debounce,
            page_size: self.page_size,
        }
    }
}

/// Parse `name` if set, otherwise fall back to `default`.
fn parse_var<T: FromStr>(name: &str, default: Option<T>) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Validation(format!("Invalid {} value: {}", name, raw))),
        Err(_) => default.ok_or_else(|| AppError::Validation(format!("{} is required", name))),
    }
}
