/// Generator — the single point of entry for all text-generation calls.
///
/// The generator is an external process treated as a black box: given a prompt it
/// returns text, possibly slowly, possibly malformed, possibly nothing at all.
/// No other module spawns generator processes directly; everything goes through
/// the `TextGenerator` trait so pipelines can run against deterministic stubs.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

pub mod prompts;
pub mod subprocess;

pub use subprocess::SubprocessGenerator;

/// How the prompt is handed to the generator process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptDelivery {
    /// Appended as the final command-line argument.
    Argument,
    /// Written to the child's stdin, which is then closed.
    Stdin,
}

impl FromStr for PromptDelivery {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argument" | "arg" => Ok(PromptDelivery::Argument),
            "stdin" => Ok(PromptDelivery::Stdin),
            other => Err(anyhow::anyhow!(
                "unknown prompt delivery '{other}' (expected 'argument' or 'stdin')"
            )),
        }
    }
}

/// Process-wide generator settings, fixed at startup and handed to each pipeline.
///
/// The child is launched as `<binary> <base_args...> <model> [prompt]`.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub binary: PathBuf,
    pub base_args: Vec<String>,
    pub model: String,
    pub delivery: PromptDelivery,
    pub timeout: Duration,
    /// Extra runs allowed after a malformed-output failure. Zero disables re-prompting.
    pub malformed_retries: u32,
}

/// Result of a single generator invocation. Never an `Err`: every failure mode
/// is a variant so callers are forced to classify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorOutcome {
    Success(String),
    TimedOut,
    ProcessNotFound,
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },
    UnexpectedError(String),
}

impl GeneratorOutcome {
    /// Short tag used in logs and failure reasons.
    pub fn tag(&self) -> &'static str {
        match self {
            GeneratorOutcome::Success(_) => "success",
            GeneratorOutcome::TimedOut => "timed_out",
            GeneratorOutcome::ProcessNotFound => "process_not_found",
            GeneratorOutcome::ProcessFailed { .. } => "process_failed",
            GeneratorOutcome::UnexpectedError(_) => "unexpected_error",
        }
    }
}

impl fmt::Display for GeneratorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorOutcome::Success(text) => write!(f, "success ({} bytes)", text.len()),
            GeneratorOutcome::TimedOut => write!(f, "timed out"),
            GeneratorOutcome::ProcessNotFound => write!(f, "generator binary not found"),
            GeneratorOutcome::ProcessFailed { exit_code, .. } => match exit_code {
                Some(code) => write!(f, "generator exited with status {code}"),
                None => write!(f, "generator terminated by signal"),
            },
            GeneratorOutcome::UnexpectedError(detail) => write!(f, "unexpected error: {detail}"),
        }
    }
}

/// The text generator capability. Implement this to swap backends without
/// touching the pipeline or handlers.
///
/// Carried by each pipeline as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, timeout: Duration) -> GeneratorOutcome;
}
