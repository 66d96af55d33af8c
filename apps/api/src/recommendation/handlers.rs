//! Axum route handlers for the Recommendation API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::recommendation::pipeline::{CollegePick, Recommendations};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub profile: String,
}

/// POST /api/v1/recommendations (also POST /recommend)
///
/// Takes a preference record and returns `{streams, colleges, careers, institutions}`.
/// The body is accepted as raw JSON so an empty or malformed body surfaces as a
/// structured `INVALID_REQUEST` instead of Axum's plain-text rejection.
pub async fn handle_recommend(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Recommendations>, AppError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    let recommendations = state.preferences.recommend(&payload).await?;
    let institutions = recommendations
        .get("institutions")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    info!("Returned preference recommendations ({institutions} institutions)");
    Ok(Json(recommendations))
}

/// POST /api/v1/recommendations/colleges
///
/// Takes `{"profile": "..."}` and returns colleges picked from the reference dataset,
/// each as `{college, location, reason}`.
pub async fn handle_recommend_colleges(
    State(state): State<AppState>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<Vec<CollegePick>>, AppError> {
    let Json(request) = payload.map_err(invalid_body)?;
    if request.profile.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Invalid request data: profile is required".to_string(),
        ));
    }

    let dataset = state.reference.as_deref().ok_or_else(|| {
        AppError::Configuration(
            "reference dataset is not configured; set REFERENCE_DATASET_PATH".to_string(),
        )
    })?;

    let picks = state
        .profiles
        .recommend_colleges(
            &request.profile,
            dataset,
            state.config.reference_sample_limit,
        )
        .await?;
    info!("Returned {} college picks", picks.len());
    Ok(Json(picks))
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    AppError::InvalidRequest(format!("Invalid request data: {}", rejection.body_text()))
}
