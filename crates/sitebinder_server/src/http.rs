use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use sitebinder_engine::{PageRenderer, SeedFetcher, SessionStore};
use tower_http::cors::CorsLayer;

use crate::handlers;

/// Upper bound on `/merge` upload bodies.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared handler dependencies. The fetcher and renderer sit behind trait
/// objects so router tests can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub fetcher: Arc<dyn SeedFetcher>,
    pub renderer: Arc<dyn PageRenderer>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/scrape", post(handlers::scrape))
        .route("/download-clean", post(handlers::download_clean))
        .route("/merge", post(handlers::merge_files))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
