use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus the generator models in use.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "models": {
            "preferences": state.config.preference_generator.model,
            "profiles": state.config.profile_generator.model,
        },
        "reference_dataset_loaded": state.reference.is_some(),
    }))
}
