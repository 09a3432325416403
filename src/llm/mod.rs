//! Client for the local inference server.
//!
//! Every failure is returned as an [`LlmError`] so the session can show it
//! and keep going.

pub mod ollama;

pub use ollama::OllamaClient;

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// Model used when none is configured and none can be detected.
pub const DEFAULT_MODEL: &str = "mistral";

/// Errors talking to the inference server.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Unable to connect to Ollama at {host}. Verify that Ollama is running and that the model is installed.")]
    Connect {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timeout: the model took longer than {0:?} to answer. Try a simpler question.")]
    Timeout(Duration),

    #[error("HTTP error: {status}{}", body_suffix(.body))]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed response from Ollama: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Request to Ollama failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

fn body_suffix(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {}", body)
    }
}

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

/// Remove `<think>...</think>` reasoning blocks some models emit.
pub fn strip_reasoning(text: &str) -> String {
    THINK_BLOCK.replace_all(text, "").trim().to_string()
}
