//! Configuration loading and management.
//!
//! Loads smarttask configuration from `$SMARTTASK_CONFIG_PATH` or
//! `~/.smarttask/config.toml`. Environment variables override file values;
//! file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::extractors::ExtractorKind;
use crate::providers::openai::OPENAI_API_BASE;

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SMARTTASK_CONFIG_PATH";

/// Directory under the home directory holding config and `.env`.
const CONFIG_DIR_NAME: &str = ".smarttask";
const CONFIG_FILE_NAME: &str = "config.toml";

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction strategy (`[extractor]`).
    pub extractor: ExtractorConfig,
    /// Remote model settings (`[llm]`).
    pub llm: LlmConfig,
    /// Log output settings (`[logging]`).
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// `env` resolves variable names; the binary passes the process
    /// environment layered over the `.env` credentials. A missing config file
    /// yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed, or if no config path can be resolved.
    pub fn load(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = Self::config_path_with(&env)?;
        let mut config = Self::load_from_path(&path)?;
        config.apply_overrides(&env);
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides.
    fn load_from_path(path: &std::path::Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("invalid config file {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve the config file path using a custom env resolver.
    ///
    /// Checks `$SMARTTASK_CONFIG_PATH` first, then `~/.smarttask/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unset and the home directory
    /// cannot be determined.
    pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
        if let Some(p) = env(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            return Ok(PathBuf::from(p));
        }
        Ok(config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Invalid values are ignored with a warning.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Extractor.
        if let Some(v) = env("SMARTTASK_EXTRACTOR") {
            match v.parse::<ExtractorKind>() {
                Ok(kind) => self.extractor.kind = kind,
                Err(_) => tracing::warn!(
                    var = "SMARTTASK_EXTRACTOR",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        // Logging.
        if let Some(v) = env("SMARTTASK_LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
            self.logging.level = v;
        }
        if let Some(v) = env("SMARTTASK_LOGS_DIR").filter(|v| !v.trim().is_empty()) {
            self.logging.logs_dir = Some(PathBuf::from(v));
        }

        // LLM.
        if let Some(v) = env("SMARTTASK_OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.llm.base_url = v;
        }
        if let Some(v) = env("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            self.llm.model = v;
        }
        if let Some(v) = env("OPENAI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.llm.api_key = Some(v);
        }
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has wrong value types.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Check that the selected extractor can run.
    ///
    /// # Errors
    ///
    /// Returns an error if `kind` is remote and no API key is configured.
    pub fn validate_for(&self, kind: ExtractorKind) -> Result<()> {
        if kind == ExtractorKind::Remote && self.llm.api_key().is_none() {
            anyhow::bail!(
                "the remote extractor needs an API key: set OPENAI_API_KEY, \
                 add it to ~/.smarttask/.env, or set [llm].api_key in the config file"
            );
        }
        Ok(())
    }
}

/// Resolve the default config directory (`~/.smarttask/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(CONFIG_DIR_NAME))
}

// ── Extractor config ────────────────────────────────────────────

/// Extraction strategy selection (`[extractor]`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Which extractor the CLI uses unless `--extractor` is given.
    pub kind: ExtractorKind,
}

// ── LLM config ──────────────────────────────────────────────────

/// Remote model settings (`[llm]`).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API origin; `/v1/chat/completions` is appended.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Bearer key. Usually supplied through `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Whole-request timeout in seconds.
    pub timeout_seconds: u64,
}

impl LlmConfig {
    /// The API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: OPENAI_API_BASE.to_owned(),
            model: "gpt-3.5-turbo".to_owned(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 200,
            timeout_seconds: 30,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "__REDACTED__"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

// ── Logging config ──────────────────────────────────────────────

/// Log output settings (`[logging]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// When set, JSON logs are also written here with daily rotation.
    pub logs_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            logs_dir: None,
        }
    }
}
