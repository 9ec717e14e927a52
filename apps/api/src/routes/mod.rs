pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/skills/extract", post(handlers::handle_extract_skills))
        .route("/api/v1/match", post(handlers::handle_match))
        .route("/api/v1/match/upload", post(handlers::handle_match_upload))
        .route("/api/v1/match/report", get(handlers::handle_get_report))
        .with_state(state)
}
