//! HTTP client for the Ollama text-generation API.
//!
//! Uses the non-streaming `POST /api/generate` endpoint for completions and
//! `GET /api/tags` as a health check. Transient failures are retried with
//! back-off when retries are enabled.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use revan_core::AppConfig;

use crate::backend::ModelBackend;
use crate::error::AnalyzerError;
use crate::retry::RetryPolicy;

const DEFAULT_BASE_URL: &str = "http://localhost:11434/";
const DEFAULT_MODEL: &str = "mistral";

#[derive(Debug, Clone, Copy, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// Client for a local Ollama server.
///
/// Use [`OllamaClient::from_config`] in production or
/// [`OllamaClient::with_base_url`] to point at a mock server in tests.
pub struct OllamaClient {
    client: Client,
    model: String,
    options: GenerateOptions,
    generate_url: Url,
    tags_url: Url,
    retry: RetryPolicy,
}

impl OllamaClient {
    /// Creates a client for the default local endpoint and model.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, AnalyzerError> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_MODEL, timeout_secs)
    }

    /// Creates a client from application config: endpoint, model, sampling
    /// options, timeout and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::InvalidUrl`] if `ollama_url` does not parse,
    /// or [`AnalyzerError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnalyzerError> {
        Ok(
            Self::with_base_url(&config.ollama_url, &config.model, config.request_timeout_secs)?
                .with_sampling(config.temperature, config.top_p)
                .with_retries(config.max_retries, config.retry_backoff_base_ms),
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`AnalyzerError::InvalidUrl`] if `base_url`
    /// is not a valid URL.
    pub fn with_base_url(
        base_url: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, AnalyzerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("revan/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // A trailing slash makes `join` append to the base path instead of
        // replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let invalid = |reason: String| AnalyzerError::InvalidUrl {
            url: base_url.to_owned(),
            reason,
        };
        let base = Url::parse(&normalised).map_err(|e| invalid(e.to_string()))?;
        let generate_url = base
            .join("api/generate")
            .map_err(|e| invalid(e.to_string()))?;
        let tags_url = base.join("api/tags").map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client,
            model: model.to_owned(),
            options: GenerateOptions {
                temperature: 0.1,
                top_p: 0.9,
            },
            generate_url,
            tags_url,
            retry: RetryPolicy::new(0, 500),
        })
    }

    /// Override the sampling options sent with every request.
    #[must_use]
    pub fn with_sampling(mut self, temperature: f32, top_p: f32) -> Self {
        self.options = GenerateOptions { temperature, top_p };
        self
    }

    /// Enable retries for transient failures. `max_retries = 0` disables them.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.retry = RetryPolicy::new(max_retries, backoff_base_ms);
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Lists the model names installed on the server.
    ///
    /// # Errors
    ///
    /// - [`AnalyzerError::Http`] on network failure.
    /// - [`AnalyzerError::UnexpectedStatus`] on a non-2xx response.
    /// - [`AnalyzerError::Deserialize`] if the body is not the expected JSON.
    pub async fn list_models(&self) -> Result<Vec<String>, AnalyzerError> {
        let response = self.client.get(self.tags_url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.tags_url.to_string(),
            });
        }
        let body = response.text().await?;
        let tags: TagsResponse =
            serde_json::from_str(&body).map_err(|e| AnalyzerError::Deserialize {
                context: "tags".to_owned(),
                source: e,
            })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, AnalyzerError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.options,
        };

        let response = self
            .client
            .post(self.generate_url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        // Ollama answers 404 on generate only when the model is missing.
        if status == StatusCode::NOT_FOUND {
            return Err(AnalyzerError::ModelNotFound {
                model: self.model.clone(),
            });
        }
        if !status.is_success() {
            return Err(AnalyzerError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.generate_url.to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| AnalyzerError::Deserialize {
                context: format!("generate(model={})", self.model),
                source: e,
            })?;

        Ok(parsed.response.trim().to_owned())
    }
}

#[async_trait]
impl ModelBackend for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, AnalyzerError> {
        self.retry
            .run(AnalyzerError::is_transient, || self.generate_once(prompt))
            .await
    }

    async fn health(&self) -> Result<(), AnalyzerError> {
        let models = self.list_models().await?;
        if models.iter().any(|m| model_matches(m, &self.model)) {
            return Ok(());
        }
        tracing::warn!(
            model = %self.model,
            available = ?models,
            "configured model is not installed on the server"
        );
        Err(AnalyzerError::ModelNotFound {
            model: self.model.clone(),
        })
    }
}

/// Ollama reports tagged names (`mistral:latest`); an untagged configured
/// name matches any tag of that model.
fn model_matches(installed: &str, configured: &str) -> bool {
    installed == configured
        || (!configured.contains(':')
            && installed
                .split_once(':')
                .is_some_and(|(name, _)| name == configured))
}
