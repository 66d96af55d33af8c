use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Upper bound on generator text echoed back to clients. Generator text is cut
/// with `truncate_for_diagnostics` before it is stored in an `AppError`.
pub const DIAGNOSTIC_LIMIT: usize = 500;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Generator timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Generation failed (exit code {exit_code:?}): {diagnostics}")]
    GenerationFailure {
        exit_code: Option<i32>,
        diagnostics: String,
    },

    #[error("Malformed generator output: {detail}")]
    MalformedOutput { detail: String, raw_excerpt: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable label surfaced to clients as `error.code`.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Timeout { .. } => "GENERATION_TIMEOUT",
            AppError::GenerationFailure { .. } => "GENERATION_FAILURE",
            AppError::MalformedOutput { .. } => "MALFORMED_OUTPUT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Configuration(_)
            | AppError::GenerationFailure { .. }
            | AppError::MalformedOutput { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, detail) = match &self {
            AppError::InvalidRequest(msg) => (msg.clone(), None),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    "The recommendation service is not configured correctly".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Timeout { seconds } => {
                tracing::error!("Generator timed out after {seconds}s");
                (
                    format!("The generator did not respond within {seconds} seconds"),
                    None,
                )
            }
            AppError::GenerationFailure {
                exit_code,
                diagnostics,
            } => {
                tracing::error!("Generation failed (exit code {exit_code:?}): {diagnostics}");
                (
                    "Failed to get recommendations from the generator".to_string(),
                    Some(diagnostics.clone()),
                )
            }
            AppError::MalformedOutput { detail, raw_excerpt } => {
                tracing::error!("Malformed generator output: {detail}");
                (
                    format!("Failed to parse recommendations from the generator: {detail}"),
                    Some(raw_excerpt.clone()),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                ("An internal server error occurred".to_string(), None)
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(detail) = detail.filter(|d| !d.is_empty()) {
            error["detail"] = json!(detail);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Cuts `text` to at most `DIAGNOSTIC_LIMIT` characters, marking the cut.
pub fn truncate_for_diagnostics(text: &str) -> String {
    match text.char_indices().nth(DIAGNOSTIC_LIMIT) {
        Some((idx, _)) => format!("{}…[truncated]", &text[..idx]),
        None => text.to_string(),
    }
}
