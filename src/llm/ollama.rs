//! Ollama backend.
//!
//! Uses the non-streaming `/api/generate` endpoint for replies and
//! `/api/tags` for health checks and model detection.

use super::{strip_reasoning, LlmError, DEFAULT_MODEL};
use crate::protocol::{GenerateRequest, GenerateResponse, SamplingOptions, TagsResponse};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Reply text used when the server answers without a `response` field.
pub const EMPTY_REPLY: &str = "No response received";

const TAGS_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client bound to one Ollama host and model.
pub struct OllamaClient {
    host: String,
    model: String,
    options: SamplingOptions,
    timeout: Duration,
    client: Client,
}

impl OllamaClient {
    pub fn new(
        host: impl Into<String>,
        model: impl Into<String>,
        options: SamplingOptions,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::Client)?;

        Ok(Self {
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
            options,
            timeout,
            client,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Send a composed prompt and return the reply with reasoning removed.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.host);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: &self.options,
        };

        debug!("POST {} (model {}, {} prompt bytes)", url, self.model, prompt.len());
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Ollama returned {}", status);
            return Err(LlmError::Status { status, body });
        }

        let reply: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout)
            } else {
                LlmError::Decode(e)
            }
        })?;

        if !reply.done {
            warn!("Ollama reply not marked done; it may be truncated");
        }
        let text = reply.response.unwrap_or_else(|| EMPTY_REPLY.to_string());
        Ok(strip_reasoning(&text))
    }

    /// Names of the locally available models, sorted.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let tags = self.fetch_tags().await?;
        let mut names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        names.sort();
        Ok(names)
    }

    /// First model the server lists, in server order, or the default.
    pub async fn detect_model(&self) -> Result<String, LlmError> {
        Ok(self
            .fetch_tags()
            .await?
            .models
            .into_iter()
            .next()
            .map(|m| m.name)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()))
    }

    async fn fetch_tags(&self) -> Result<TagsResponse, LlmError> {
        let url = format!("{}/api/tags", self.host);
        let response = self
            .client
            .get(&url)
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.transport_error(e, TAGS_TIMEOUT))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        response.json().await.map_err(LlmError::Decode)
    }

    fn transport_error(&self, error: reqwest::Error, timeout: Duration) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(timeout)
        } else if error.is_connect() {
            LlmError::Connect {
                host: self.host.clone(),
                source: error,
            }
        } else {
            LlmError::Request(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> OllamaClient {
        OllamaClient::new(server.uri(), "mistral", SamplingOptions::default(), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_non_streaming_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "mistral",
                "prompt": "USER: hi\nASSISTANT:",
                "stream": false,
                "options": { "top_k": 40 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "<think>greeting</think>Hello!",
                "done": true
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Duration::from_secs(5));
        let reply = client.generate("USER: hi\nASSISTANT:").await.unwrap();
        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn test_generate_missing_response_field() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"done": true}"#))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Duration::from_secs(5));
        assert_eq!(client.generate("x").await.unwrap(), EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_generate_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Duration::from_secs(5));
        let err = client.generate("x").await.unwrap_err();
        match err {
            LlmError::Status { status, body } => {
                assert_eq!(status.as_u16(), 404);
                assert_eq!(body, "model not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_malformed_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Duration::from_secs(5));
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, LlmError::Decode(_)));
    }

    #[tokio::test]
    async fn test_generate_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": "late" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Duration::from_millis(200));
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_generate_connection_refused() {
        // Bind then drop a listener to get a port with nothing behind it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = OllamaClient::new(
            format!("http://127.0.0.1:{}", port),
            "mistral",
            SamplingOptions::default(),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, LlmError::Connect { .. }));
        assert!(err.to_string().starts_with("Unable to connect to Ollama"));
    }

    #[tokio::test]
    async fn test_list_models_sorted() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{ "name": "mistral:latest" }, { "name": "llama3.2:3b" }]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Duration::from_secs(5));
        assert_eq!(
            client.list_models().await.unwrap(),
            vec!["llama3.2:3b".to_string(), "mistral:latest".to_string()]
        );
        // Detection keeps the server's order.
        assert_eq!(client.detect_model().await.unwrap(), "mistral:latest");
    }

    #[tokio::test]
    async fn test_detect_model_falls_back_to_default() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"models": []}"#))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Duration::from_secs(5));
        assert_eq!(client.detect_model().await.unwrap(), DEFAULT_MODEL);
    }

    #[test]
    fn test_host_trailing_slash_is_trimmed() {
        let client = OllamaClient::new(
            "http://localhost:11434/",
            "mistral",
            SamplingOptions::default(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.host(), "http://localhost:11434");
    }
}
