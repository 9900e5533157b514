use crate::error::GeneratorError;
use crate::generator::read_json;
use crate::types::{Problem, Rating};
use async_trait::async_trait;

/// Question generation and answer rating backed by the LLM API.
#[async_trait]
pub trait ChallengeModel: Send + Sync {
    async fn get_question(&self, topic: &str) -> Result<Problem, GeneratorError>;

    async fn rate_question(&self, question: &str, answer: &str) -> Result<Rating, GeneratorError>;
}

pub struct HttpChallengeModel {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChallengeModel {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChallengeModel for HttpChallengeModel {
    async fn get_question(&self, topic: &str) -> Result<Problem, GeneratorError> {
        let url = format!("{}/ask_question", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("topic", topic)])
            .send()
            .await;

        read_json(&url, response).await
    }

    async fn rate_question(&self, question: &str, answer: &str) -> Result<Rating, GeneratorError> {
        let url = format!("{}/rate_question", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "question": question, "answer": answer }))
            .send()
            .await;

        read_json(&url, response).await
    }
}
