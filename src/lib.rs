//! Group roster editing.
//!
//! An editing core for group membership (undo/redo history, a pending edit
//! log, paginated views and change reconciliation) plus the SQLite-backed
//! REST server and HTTP client it is usually paired with.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod editor;
pub mod errors;
pub mod models;
pub mod uploads;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;
use uploads::{LocalPhotoStore, MAX_FILE_SIZE};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub uploads: Arc<LocalPhotoStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Repository, config: Config) -> Self {
        let uploads = LocalPhotoStore::new(&config.upload_dir, config.public_url.clone());
        Self {
            repo: Arc::new(repo),
            uploads: Arc::new(uploads),
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Groups
        .route("/groups", post(api::create_group))
        .route("/groups/{id}", get(api::get_group).patch(api::update_group))
        .route("/groups/{id}/members", get(api::list_group_members))
        // Uploads, with room for multipart framing
        .route(
            "/uploads",
            post(api::upload_photo).layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 64 * 1024)),
        );

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
