//! Configuration management for synax.
//!
//! Configuration is loaded from `~/.config/synax/config.toml`. Every field has
//! a default, so the file is optional and may be partial. Command-line flags
//! override file values.

use crate::action::executor::DEFAULT_MAX_OUTPUT_BYTES;
use crate::action::{CommandGate, Executor};
use crate::protocol::SamplingOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Ollama host URL (default: http://localhost:11434).
    #[serde(default = "default_host")]
    pub host: String,
    /// Model name. Detected from the server when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Timeout for one model request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
    /// Sampling options sent with every request.
    #[serde(default)]
    pub options: SamplingOptions,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: None,
            timeout_secs: default_request_timeout_secs(),
            options: SamplingOptions::default(),
            executor: ExecutorConfig::default(),
            gate: GateConfig::default(),
        }
    }
}

fn default_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// How confirmed actions are run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Shell invoked as `<shell> -c <command>`.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Per-stream output limit in bytes.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// Kill actions that run longer than this. Unset means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            max_output_bytes: default_max_output_bytes(),
            timeout_secs: None,
        }
    }
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

/// Extra denylist tokens. The built-in list always applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub extra_blocked: Vec<String>,
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("synax"))
            .context("Could not determine config directory")
    }

    /// Get the default config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from `path` if given, which must exist. Otherwise load the
    /// default file, falling back to defaults when it does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load and parse one config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Request timeout for the model call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the executor described by `[executor]`.
    pub fn executor(&self) -> Executor {
        Executor::new(
            self.executor.shell.clone(),
            self.executor.max_output_bytes,
            self.executor.timeout_secs.map(Duration::from_secs),
        )
    }

    /// Build the command gate with `[gate]` extras applied.
    pub fn gate(&self) -> CommandGate {
        CommandGate::with_extra(&self.gate.extra_blocked)
    }
}
