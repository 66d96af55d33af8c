//! Subprocess generator — runs a local model runtime (e.g. `ollama run <model>`)
//! as an isolated child process per call.

use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{GeneratorConfig, GeneratorOutcome, PromptDelivery, TextGenerator};

/// Production `TextGenerator`. Each call spawns its own child; nothing is shared
/// between calls except the immutable config.
#[derive(Debug, Clone)]
pub struct SubprocessGenerator {
    config: GeneratorConfig,
}

impl SubprocessGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    fn command(&self, prompt: &str) -> Command {
        let mut command = Command::new(&self.config.binary);
        command.args(&self.config.base_args);
        if !self.config.model.is_empty() {
            command.arg(&self.config.model);
        }

        match self.config.delivery {
            PromptDelivery::Argument => {
                command.arg(prompt).stdin(Stdio::null());
            }
            PromptDelivery::Stdin => {
                command.stdin(Stdio::piped());
            }
        }

        // The child must die with its handle, so a timeout (or a dropped request)
        // never leaves a generator running in the background.
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl TextGenerator for SubprocessGenerator {
    async fn generate(&self, prompt: &str, timeout: Duration) -> GeneratorOutcome {
        let started = Instant::now();
        let binary = self.config.binary.display().to_string();

        let mut child = match self.command(prompt).spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Generator binary '{binary}' not found");
                return GeneratorOutcome::ProcessNotFound;
            }
            Err(e) => {
                warn!("Failed to spawn generator '{binary}': {e}");
                return GeneratorOutcome::UnexpectedError(format!(
                    "failed to spawn '{binary}': {e}"
                ));
            }
        };

        let stdin = child.stdin.take();
        let write_prompt = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(prompt.as_bytes()).await {
                    Ok(()) => {}
                    // The child exited (or closed stdin) without reading everything;
                    // its exit status decides the outcome.
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                        debug!("Generator closed stdin before reading the full prompt");
                    }
                    Err(e) => return Err(e),
                }
                // Dropping stdin sends EOF.
            }
            Ok(())
        };

        // Write and wait concurrently so a chatty child cannot fill its stdout
        // pipe while we are still blocked writing the prompt.
        let run = async { tokio::join!(write_prompt, child.wait_with_output()) };

        let (written, output) = match tokio::time::timeout(timeout, run).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Generator '{binary}' timed out after {}s; process killed",
                    timeout.as_secs_f32()
                );
                return GeneratorOutcome::TimedOut;
            }
        };

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return GeneratorOutcome::UnexpectedError(format!(
                    "failed to collect generator output: {e}"
                ))
            }
        };

        if let Err(e) = written {
            return GeneratorOutcome::UnexpectedError(format!(
                "failed to write prompt to generator stdin: {e}"
            ));
        }

        let elapsed_ms = started.elapsed().as_millis();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                "Generator '{binary}' exited with {:?} after {elapsed_ms}ms",
                output.status.code()
            );
            return GeneratorOutcome::ProcessFailed {
                exit_code: output.status.code(),
                stderr,
            };
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(
            "Generator '{binary}' succeeded in {elapsed_ms}ms: {} bytes of output",
            stdout.len()
        );
        GeneratorOutcome::Success(stdout)
    }
}
