use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use review_core::config::GenerationSettings;
use review_core::error::{Error, Result};
use review_core::traits::GenerationGateway;
use review_core::types::{GenerationOptions, GenerationRequest};

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    options: &'a GenerationOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Non-streaming client for Ollama. Every call is bounded by the configured
/// request timeout.
pub struct OllamaGateway {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl OllamaGateway {
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Gateway(format!("failed to build HTTP client: {e}")))?;
        tracing::info!(endpoint = %settings.endpoint, timeout_secs = settings.timeout_secs, "created Ollama gateway");
        Ok(Self { client, endpoint: settings.endpoint.clone(), timeout })
    }

    fn map_transport(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::GenerationTimeout { after: self.timeout }
        } else {
            Error::Gateway(format!("request to {} failed: {e}", self.endpoint))
        }
    }
}

#[async_trait]
impl GenerationGateway for OllamaGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            system: request.system.as_deref(),
            options: &request.options,
        };
        let start = Instant::now();
        let response = self.client.post(&self.endpoint).json(&body).send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let preview: String = text.chars().take(200).collect();
            return Err(Error::Gateway(format!("{} returned HTTP {status}: {preview}", self.endpoint)));
        }
        let text = response.text().await.map_err(|e| self.map_transport(e))?;
        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Gateway(format!("unexpected response body from {}: {e}", self.endpoint)))?;
        tracing::debug!(model = %request.model, elapsed_ms = start.elapsed().as_millis() as u64, chars = parsed.response.len(), "generation finished");
        Ok(parsed.response)
    }
}
