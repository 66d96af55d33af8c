pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::recommendation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendation API
        .route("/api/v1/recommendations", post(handlers::handle_recommend))
        .route(
            "/api/v1/recommendations/colleges",
            post(handlers::handle_recommend_colleges),
        )
        // Path the existing form front-end posts to
        .route("/recommend", post(handlers::handle_recommend))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::generator::testing::StubGenerator;
    use crate::generator::{GeneratorConfig, GeneratorOutcome, PromptDelivery};
    use crate::recommendation::pipeline::Pipeline;
    use crate::recommendation::reference::{CollegeRecord, ReferenceDataset};

    fn generator_config(model: &str) -> GeneratorConfig {
        GeneratorConfig {
            binary: "ollama".into(),
            base_args: vec!["run".to_string()],
            model: model.to_string(),
            delivery: PromptDelivery::Stdin,
            timeout: Duration::from_secs(120),
            malformed_retries: 0,
        }
    }

    fn test_state(stub: Arc<StubGenerator>, reference: Option<ReferenceDataset>) -> AppState {
        AppState {
            config: Config {
                port: 0,
                rust_log: "info".to_string(),
                preference_generator: generator_config("pref-model"),
                profile_generator: generator_config("profile-model"),
                reference_dataset_path: None,
                reference_sample_limit: 20,
            },
            preferences: Pipeline::new(stub.clone(), Duration::from_secs(120)),
            profiles: Pipeline::new(stub, Duration::from_secs(120)),
            reference: reference.map(Arc::new),
        }
    }

    async fn post_json(router: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_recommend_returns_completed_record() {
        let stub = Arc::new(StubGenerator::replying(
            "Sure! {\"streams\": [\"CS\"], \"careers\": [\"Engineer\"]} Done.",
        ));
        let router = build_router(test_state(stub.clone(), None));

        let (status, body) = post_json(router, "/recommend", r#"{"math": "5", "careerFocus": "Engineering"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "streams": ["CS"],
                "careers": ["Engineer"],
                "colleges": [],
                "institutions": []
            })
        );
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_body_is_structured_400_without_generation() {
        let stub = Arc::new(StubGenerator::replying("{}"));
        for body in ["", "{}", "not json", "[1, 2]"] {
            let router = build_router(test_state(stub.clone(), None));
            let (status, json) = post_json(router, "/api/v1/recommendations", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(json["error"]["code"], "INVALID_REQUEST");
            assert!(json["error"]["message"].as_str().is_some());
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_output_is_500_with_truncated_detail() {
        let prose = "word ".repeat(400);
        let stub = Arc::new(StubGenerator::replying(&prose));
        let router = build_router(test_state(stub, None));

        let (status, body) = post_json(router, "/api/v1/recommendations", r#"{"math": 4}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "MALFORMED_OUTPUT");
        let detail = body["error"]["detail"].as_str().unwrap();
        assert!(detail.len() < prose.len());
        assert!(detail.ends_with("[truncated]"));
    }

    #[tokio::test]
    async fn test_generator_failures_map_to_status_and_code() {
        let cases = [
            (
                GeneratorOutcome::ProcessNotFound,
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
            ),
            (
                GeneratorOutcome::TimedOut,
                StatusCode::GATEWAY_TIMEOUT,
                "GENERATION_TIMEOUT",
            ),
            (
                GeneratorOutcome::ProcessFailed {
                    exit_code: Some(2),
                    stderr: "boom".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "GENERATION_FAILURE",
            ),
        ];

        for (outcome, status, code) in cases {
            let router = build_router(test_state(Arc::new(StubGenerator::new(outcome)), None));
            let (actual_status, body) =
                post_json(router, "/api/v1/recommendations", r#"{"tech": 5}"#).await;
            assert_eq!(actual_status, status);
            assert_eq!(body["error"]["code"], code);
        }
    }

    #[tokio::test]
    async fn test_colleges_without_dataset_is_configuration_error() {
        let stub = Arc::new(StubGenerator::replying("[]"));
        let router = build_router(test_state(stub.clone(), None));

        let (status, body) = post_json(
            router,
            "/api/v1/recommendations/colleges",
            r#"{"profile": "Enjoys biology"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_colleges_returns_picks() {
        let stub = Arc::new(StubGenerator::replying(
            r#"[{"college": "AIIMS", "location": "Delhi", "reason": "Medicine"}]"#,
        ));
        let dataset = ReferenceDataset::new(vec![CollegeRecord {
            institution: Some("AIIMS".to_string()),
            location: Some("Delhi".to_string()),
            ar_score: Some(88.0),
            fsr_score: Some(91.0),
            overall_score: Some(90.0),
        }]);
        let router = build_router(test_state(stub, Some(dataset)));

        let (status, body) = post_json(
            router,
            "/api/v1/recommendations/colleges",
            r#"{"profile": "Wants to become a doctor"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{"college": "AIIMS", "location": "Delhi", "reason": "Medicine"}])
        );
    }

    #[tokio::test]
    async fn test_colleges_blank_profile_is_invalid_request() {
        let stub = Arc::new(StubGenerator::replying("[]"));
        let router = build_router(test_state(stub.clone(), Some(ReferenceDataset::default())));
        let (status, body) =
            post_json(router, "/api/v1/recommendations/colleges", r#"{"profile": ""}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_REQUEST");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_colleges_blank_profile_is_400_even_without_dataset() {
        let stub = Arc::new(StubGenerator::replying("[]"));
        for body in ["{}", r#"{"profile": "   "}"#] {
            let router = build_router(test_state(stub.clone(), None));
            let (status, json) =
                post_json(router, "/api/v1/recommendations/colleges", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(json["error"]["code"], "INVALID_REQUEST");
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_recommend_logs_and_returns_institution_list() {
        let stub = Arc::new(StubGenerator::replying(
            r#"{"institutions": ["IIT Bombay", "BITS Pilani"]}"#,
        ));
        let router = build_router(test_state(stub, None));
        let (status, body) =
            post_json(router, "/api/v1/recommendations", r#"{"tech": 5}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["institutions"], json!(["IIT Bombay", "BITS Pilani"]));
    }

    #[tokio::test]
    async fn test_health_reports_models() {
        let router = build_router(test_state(Arc::new(StubGenerator::replying("{}")), None));
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["models"]["preferences"], "pref-model");
        assert_eq!(body["reference_dataset_loaded"], false);
    }
}
