//! Local model served by Ollama.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{GenerativeMetadataModel, GenerativeRequest, GenerativeResult};
use crate::error::{Error, Result};

/// Default Ollama endpoint.
pub const DEFAULT_URL: &str = "http://localhost:11434";

/// Default model tag.
pub const DEFAULT_MODEL: &str = "llama3.2";

const USER_AGENT: &str = concat!("scoremeta/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    format: &'a Value,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// [`GenerativeMetadataModel`] backed by an Ollama server.
///
/// Uses structured outputs: the answer schema is sent as `format`, so the
/// server constrains generation to valid JSON of that shape.
pub struct OllamaModel {
    base_url: String,
    model: String,
    http_client: reqwest::blocking::Client,
}

impl OllamaModel {
    /// Connect to `base_url` and use `model`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Generative(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            http_client,
        })
    }

    /// Default endpoint and model.
    pub fn local() -> Result<Self> {
        Self::new(DEFAULT_URL, DEFAULT_MODEL)
    }

    fn installed_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .timeout(Duration::from_secs(3))
            .send()
            .map_err(|e| Error::Generative(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Generative(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .map_err(|e| Error::Generative(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// `llama3.2` matches an installed `llama3.2:latest`.
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || (!wanted.contains(':')
            && installed
                .split_once(':')
                .is_some_and(|(name, _)| name == wanted))
}

impl GenerativeMetadataModel for OllamaModel {
    fn name(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        match self.installed_models() {
            Ok(models) => models.iter().any(|m| model_matches(m, &self.model)),
            Err(e) => {
                log::debug!("ollama not reachable: {}", e);
                false
            }
        }
    }

    fn respond(&self, request: &GenerativeRequest) -> Result<GenerativeResult> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            system: &request.instructions,
            prompt: &request.prompt,
            format: &request.schema,
            stream: false,
            options: GenerateOptions { temperature: 0.0 },
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| Error::Generative(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(Error::Generative(format!("{}: {}", status, error_text)));
        }

        let generated: GenerateResponse = response
            .json()
            .map_err(|e| Error::Generative(e.to_string()))?;
        GenerativeResult::from_json(&generated.response)
    }
}
