use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::generator::{GeneratorConfig, PromptDelivery};

const DEFAULT_BINARY: &str = "ollama";
const DEFAULT_ARGS: &str = "run";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SAMPLE_LIMIT: usize = 20;

/// Application configuration loaded from environment variables.
/// Fails at startup if a variable is present but cannot be parsed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Generator used for preference-record recommendations.
    pub preference_generator: GeneratorConfig,
    /// Generator used for free-text profile recommendations against the reference dataset.
    pub profile_generator: GeneratorConfig,
    pub reference_dataset_path: Option<PathBuf>,
    pub reference_sample_limit: usize,
}

/// Per-mode fallbacks applied when a generator variable is unset.
struct GeneratorDefaults {
    model: &'static str,
    delivery: PromptDelivery,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source. `from_env` passes the
    /// process environment; tests pass a fixed map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&lookup);

        Ok(Config {
            port: vars
                .get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: vars.get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            preference_generator: generator_from_lookup(
                &vars,
                "GENERATOR_",
                GeneratorDefaults {
                    model: "kimi-k2:1t-cloud",
                    delivery: PromptDelivery::Stdin,
                },
            )?,
            profile_generator: generator_from_lookup(
                &vars,
                "PROFILE_GENERATOR_",
                GeneratorDefaults {
                    model: "gemma3:12b",
                    delivery: PromptDelivery::Argument,
                },
            )?,
            reference_dataset_path: vars.get("REFERENCE_DATASET_PATH").map(PathBuf::from),
            reference_sample_limit: vars.parse("REFERENCE_SAMPLE_LIMIT", DEFAULT_SAMPLE_LIMIT)?,
        })
    }
}

/// Variable source that treats blank values as unset.
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value '{raw}'")),
            None => Ok(default),
        }
    }
}

fn generator_from_lookup(
    vars: &Vars<'_>,
    prefix: &str,
    defaults: GeneratorDefaults,
) -> Result<GeneratorConfig> {
    let key = |name: &str| format!("{prefix}{name}");

    let delivery = match vars.get(&key("PROMPT_DELIVERY")) {
        Some(raw) => raw
            .parse::<PromptDelivery>()
            .with_context(|| format!("{} is invalid", key("PROMPT_DELIVERY")))?,
        None => defaults.delivery,
    };

    let timeout_secs: u64 = vars.parse(&key("TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS)?;
    if timeout_secs == 0 {
        bail!("{} must be greater than zero", key("TIMEOUT_SECS"));
    }

    Ok(GeneratorConfig {
        binary: vars
            .get(&key("BINARY"))
            .unwrap_or_else(|| DEFAULT_BINARY.to_string())
            .into(),
        base_args: vars
            .get(&key("ARGS"))
            .unwrap_or_else(|| DEFAULT_ARGS.to_string())
            .split_whitespace()
            .map(String::from)
            .collect(),
        model: vars
            .get(&key("MODEL"))
            .unwrap_or_else(|| defaults.model.to_string()),
        delivery,
        timeout: Duration::from_secs(timeout_secs),
        malformed_retries: vars.parse(&key("MALFORMED_RETRIES"), 0)?,
    })
}
