//! reqwest-backed gateway for the JSON REST backend.
//!
//! Requires the `http` feature.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use votefeed::{AppState, FeedConfig, HttpGateway};
//!
//! let config = FeedConfig::from_env()?;
//! let gateway = Arc::new(HttpGateway::new(&config)?);
//! let app = AppState::new(config, gateway);
//! app.init().await?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    AllAnswersEnvelope, AnswersEnvelope, DeleteVoteRequest, ListGateway, QuestionFilter,
    QuestionsEnvelope, VoteGateway, VoteOutcome, VoteRequest,
};
use crate::config::FeedConfig;
use crate::error::{ErrorBody, FeedError};
use crate::model::{Answer, Id, Question};

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: FeedConfig,
}

impl HttpGateway {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &FeedConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Send `request` and return the raw body of a 2xx response.
    ///
    /// Non-2xx responses become `FeedError::Http` with the parsed `{ error }`
    /// body; a body that is not JSON is a network-class failure.
    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, FeedError> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !status.is_success() {
            let body: ErrorBody = serde_json::from_slice(&bytes).map_err(|e| {
                FeedError::Network(format!("unparsable error body (status {}): {}", status, e))
            })?;
            debug!(status = status.as_u16(), error = %body.error, "request rejected");
            return Err(FeedError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(bytes.to_vec())
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, FeedError> {
        let bytes = self.execute(request).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| FeedError::Network(format!("unparsable response body: {}", e)))
    }
}

#[async_trait]
impl VoteGateway for HttpGateway {
    async fn create_vote(&self, request: VoteRequest) -> Result<VoteOutcome, FeedError> {
        let url = self
            .config
            .url(&format!("/api/questions/{}/votes", request.subject_id));
        self.json(self.client.post(url).json(&request)).await
    }

    async fn update_vote(
        &self,
        vote_id: Id,
        request: VoteRequest,
    ) -> Result<VoteOutcome, FeedError> {
        let url = self.config.url(&format!("/api/question-votes/{}", vote_id));
        self.json(self.client.put(url).json(&request)).await
    }

    async fn delete_vote(&self, request: DeleteVoteRequest) -> Result<VoteOutcome, FeedError> {
        let url = self
            .config
            .url(&format!("/api/question-votes/{}", request.vote_id));
        self.json(self.client.delete(url).json(&request)).await
    }
}

#[async_trait]
impl ListGateway for HttpGateway {
    async fn fetch_questions(&self) -> Result<Vec<Question>, FeedError> {
        let url = self.config.url("/api/questions/");
        let envelope: QuestionsEnvelope = self.json(self.client.get(url)).await?;
        Ok(envelope.questions)
    }

    async fn filter_questions(
        &self,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, FeedError> {
        let url = self.config.url("/api/questions");
        let (key, value) = filter.query_pair();
        let envelope: QuestionsEnvelope = self
            .json(self.client.get(url).query(&[(key, value)]))
            .await?;
        Ok(envelope.questions)
    }

    async fn delete_question(&self, id: Id) -> Result<(), FeedError> {
        let url = self.config.url(&format!("/api/questions/{}", id));
        self.execute(self.client.delete(url)).await?;
        Ok(())
    }

    async fn fetch_answers(&self) -> Result<Vec<Answer>, FeedError> {
        let url = self.config.url("/api/answers/");
        let envelope: AllAnswersEnvelope = self.json(self.client.get(url)).await?;
        Ok(envelope.answers)
    }

    async fn fetch_answers_for(&self, question_id: Id) -> Result<Vec<Answer>, FeedError> {
        let url = self
            .config
            .url(&format!("/api/questions/{}/answers", question_id));
        let envelope: AnswersEnvelope = self.json(self.client.get(url)).await?;
        Ok(envelope.answers)
    }

    async fn delete_answer(&self, id: Id) -> Result<(), FeedError> {
        let url = self.config.url(&format!("/api/answers/{}", id));
        self.execute(self.client.delete(url)).await?;
        Ok(())
    }
}
