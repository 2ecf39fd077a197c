use axum::{extract::State, Json};
use serde_json::{json, Map, Value};

use crate::state::AppState;

/// GET /health
/// Returns a status object with service version and loaded dictionary sizes.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let dictionaries: Map<String, Value> = state
        .pipeline
        .enabled_languages()
        .iter()
        .map(|&lang| (lang.to_string(), json!(state.skills.dictionary_size(lang))))
        .collect();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cvextract-api",
        "fuzzy_match_threshold": state.skills.fuzzy_threshold(),
        "dictionaries": dictionaries
    }))
}
