//! Pipeline Orchestrator — composes the recommendation stages into one call.
//!
//! Each request runs a fresh, single-use state machine:
//!
//! `Idle → Normalizing → Prompting → Invoking → Extracting → Completing → Done`
//!
//! Any stage after `Idle` may end the run as failed; no stage is ever revisited.
//! A re-prompt (opt-in via `malformed_retries`) starts a brand-new run.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{truncate_for_diagnostics, AppError};
use crate::generator::{GeneratorConfig, GeneratorOutcome, SubprocessGenerator, TextGenerator};
use crate::recommendation::extractor::{extract_json, JsonShape};
use crate::recommendation::preferences::normalize_preferences;
use crate::recommendation::prompts::{build_preference_prompt, build_profile_prompt};
use crate::recommendation::reference::ReferenceDataset;
use crate::recommendation::schema::{complete_picks, complete_recommendations, ShapeMismatch};

/// Object-shaped recommendation with every required key present.
pub type Recommendations = Map<String, Value>;

/// One `{college, location, reason}` pick.
pub type CollegePick = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    Normalizing,
    Prompting,
    Invoking,
    Extracting,
    Completing,
    Done,
}

/// A single execution of the state machine. Consumed by `finish`.
struct Run {
    id: Uuid,
    mode: &'static str,
    stage: Stage,
    started: Instant,
}

impl Run {
    fn start(id: Uuid, mode: &'static str) -> Self {
        Self {
            id,
            mode,
            stage: Stage::Idle,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(
            next > self.stage,
            "pipeline stage went backwards: {:?} -> {next:?}",
            self.stage
        );
        debug!(
            run_id = %self.id,
            mode = self.mode,
            "stage {:?} -> {next:?}",
            self.stage
        );
        self.stage = next;
    }

    /// Terminal failure from the current stage.
    fn fail(&self, error: AppError) -> AppError {
        warn!(
            run_id = %self.id,
            mode = self.mode,
            stage = ?self.stage,
            code = error.code(),
            "pipeline run failed after {}ms: {error}",
            self.started.elapsed().as_millis()
        );
        error
    }

    fn finish(mut self) {
        self.advance(Stage::Done);
        info!(
            run_id = %self.id,
            mode = self.mode,
            "pipeline run completed in {}ms",
            self.started.elapsed().as_millis()
        );
    }
}

/// The recommendation pipeline. Holds only immutable configuration, so one
/// instance is shared by all concurrent requests.
#[derive(Clone)]
pub struct Pipeline {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
    malformed_retries: u32,
}

impl Pipeline {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self {
            generator,
            timeout,
            malformed_retries: 0,
        }
    }

    /// Production pipeline backed by a subprocess generator.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(
            Arc::new(SubprocessGenerator::new(config.clone())),
            config.timeout,
        )
        .with_malformed_retries(config.malformed_retries)
    }

    /// Allows up to `retries` fresh runs after a malformed-output failure.
    pub fn with_malformed_retries(mut self, retries: u32) -> Self {
        self.malformed_retries = retries;
        self
    }

    /// Preference mode: untrusted payload → completed recommendation object.
    pub async fn recommend(&self, payload: &Value) -> Result<Recommendations, AppError> {
        self.with_reprompts(|run_id| self.recommend_once(run_id, payload))
            .await
    }

    /// Profile mode: free-text profile + reference dataset → completed picks.
    pub async fn recommend_colleges(
        &self,
        profile: &str,
        dataset: &ReferenceDataset,
        sample_limit: usize,
    ) -> Result<Vec<CollegePick>, AppError> {
        self.with_reprompts(|run_id| {
            self.recommend_colleges_once(run_id, profile, dataset, sample_limit)
        })
        .await
    }

    async fn recommend_once(
        &self,
        run_id: Uuid,
        payload: &Value,
    ) -> Result<Recommendations, AppError> {
        let mut run = Run::start(run_id, "preferences");

        run.advance(Stage::Normalizing);
        let record = normalize_preferences(payload).map_err(|e| run.fail(e))?;

        run.advance(Stage::Prompting);
        let prompt = build_preference_prompt(&record);

        let (raw, value) = self.invoke_and_extract(&mut run, &prompt, JsonShape::Object).await?;

        run.advance(Stage::Completing);
        let recommendations =
            complete_recommendations(value).map_err(|m| run.fail(shape_error(m, &raw)))?;

        run.finish();
        Ok(recommendations)
    }

    async fn recommend_colleges_once(
        &self,
        run_id: Uuid,
        profile: &str,
        dataset: &ReferenceDataset,
        sample_limit: usize,
    ) -> Result<Vec<CollegePick>, AppError> {
        let mut run = Run::start(run_id, "profile");

        run.advance(Stage::Normalizing);
        if profile.trim().is_empty() {
            return Err(run.fail(AppError::InvalidRequest(
                "Invalid request data: profile is required".to_string(),
            )));
        }

        run.advance(Stage::Prompting);
        let prompt = build_profile_prompt(profile, dataset, sample_limit);

        let (raw, value) = self.invoke_and_extract(&mut run, &prompt, JsonShape::Array).await?;

        run.advance(Stage::Completing);
        let picks = complete_picks(value).map_err(|m| run.fail(shape_error(m, &raw)))?;

        run.finish();
        Ok(picks)
    }

    /// `Invoking` and `Extracting`. Returns the raw text alongside the parsed
    /// value so completion failures can still report what the generator said.
    async fn invoke_and_extract(
        &self,
        run: &mut Run,
        prompt: &str,
        shape: JsonShape,
    ) -> Result<(String, Value), AppError> {
        run.advance(Stage::Invoking);
        let outcome = self.generator.generate(prompt, self.timeout).await;
        debug!(run_id = %run.id, outcome = outcome.tag(), "generator returned: {outcome}");
        let raw = classify_outcome(outcome, self.timeout).map_err(|e| run.fail(e))?;

        run.advance(Stage::Extracting);
        let value = extract_json(&raw, shape).map_err(|e| {
            run.fail(AppError::MalformedOutput {
                detail: e.detail,
                raw_excerpt: truncate_for_diagnostics(&e.raw),
            })
        })?;

        Ok((raw, value))
    }

    /// Runs `attempt` with a fresh run id, starting a new run after each
    /// malformed-output failure until the re-prompt budget is spent.
    async fn with_reprompts<T, F, Fut>(&self, mut attempt: F) -> Result<T, AppError>
    where
        F: FnMut(Uuid) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut reprompts = 0;
        let mut run_id = Uuid::new_v4();
        loop {
            match attempt(run_id).await {
                Err(AppError::MalformedOutput { detail, .. }) if reprompts < self.malformed_retries => {
                    reprompts += 1;
                    let next_run_id = Uuid::new_v4();
                    warn!(
                        run_id = %run_id,
                        next_run_id = %next_run_id,
                        "Malformed generator output ({detail}); re-prompting {reprompts}/{}",
                        self.malformed_retries
                    );
                    run_id = next_run_id;
                }
                result => return result,
            }
        }
    }
}

/// Maps a generator outcome onto the error taxonomy; only `Success` continues.
fn classify_outcome(outcome: GeneratorOutcome, timeout: Duration) -> Result<String, AppError> {
    match outcome {
        GeneratorOutcome::Success(text) => Ok(text),
        GeneratorOutcome::TimedOut => Err(AppError::Timeout {
            seconds: timeout.as_secs_f64().ceil() as u64,
        }),
        GeneratorOutcome::ProcessNotFound => Err(AppError::Configuration(
            "generator binary not found; install it or point the generator binary setting at it"
                .to_string(),
        )),
        GeneratorOutcome::ProcessFailed { exit_code, stderr } => {
            Err(AppError::GenerationFailure {
                exit_code,
                diagnostics: truncate_for_diagnostics(&stderr),
            })
        }
        GeneratorOutcome::UnexpectedError(detail) => Err(AppError::Internal(anyhow::anyhow!(
            "generator invocation failed: {detail}"
        ))),
    }
}

fn shape_error(mismatch: ShapeMismatch, raw: &str) -> AppError {
    AppError::MalformedOutput {
        detail: mismatch.0,
        raw_excerpt: truncate_for_diagnostics(raw),
    }
}
