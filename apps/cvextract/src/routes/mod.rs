pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::extraction::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Extraction API
        .route("/api/v1/extract", post(handlers::handle_extract))
        .route("/api/v1/extract/batch", post(handlers::handle_extract_batch))
        // Component API
        .route("/api/v1/dates/range", post(handlers::handle_date_range))
        .route("/api/v1/skills/match", post(handlers::handle_skill_match))
        .with_state(state)
}
