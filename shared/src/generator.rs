use crate::error::GeneratorError;
use crate::types::Roadmap;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Produces a candidate roadmap for a free-text prompt.
#[async_trait]
pub trait RoadmapGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Roadmap, GeneratorError>;
}

/// Shared reqwest client with a bounded timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, GeneratorError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GeneratorError::Unavailable(format!("could not build HTTP client: {}", e)))
}

/// Reads a 2xx JSON body or turns the response into a `GeneratorError`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    url: &str,
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<T, GeneratorError> {
    let response = response.map_err(|source| GeneratorError::Request {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|source| GeneratorError::Request {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(GeneratorError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| GeneratorError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Calls `<base>/get-roadmap?topic=<prompt>` on the LLM-backed service.
pub struct HttpRoadmapGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRoadmapGenerator {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RoadmapGenerator for HttpRoadmapGenerator {
    async fn generate(&self, prompt: &str) -> Result<Roadmap, GeneratorError> {
        let url = format!("{}/get-roadmap", self.base_url);
        tracing::info!("Requesting generated roadmap from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("topic", prompt)])
            .send()
            .await;

        read_json(&url, response).await
    }
}
