//! Remote collaborators: the vote service and the list service.
//!
//! The core only depends on these traits. `HttpGateway` (feature `http`)
//! implements both against the JSON REST backend.
//!
//! ## Vote endpoints
//!
//! - `POST /api/questions/{id}/votes` body `{ subjectId, direction }` → `{ vote, question }`
//! - `PUT /api/question-votes/{voteId}` body `{ subjectId, direction }` → `{ vote, question }`
//! - `DELETE /api/question-votes/{voteId}` body `{ voteId }` → `{ question }`

#[cfg(feature = "http")]
mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::model::{Answer, Direction, Id, Question, VoteRecord};

#[cfg(feature = "http")]
pub use http::HttpGateway;

/// Body of a create or update vote request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub subject_id: Id,
    pub direction: Direction,
}

/// Body of a delete vote request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVoteRequest {
    pub vote_id: Id,
}

/// Successful vote response. `vote` is absent after a delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<VoteRecord>,
    pub question: Question,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsEnvelope {
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswersEnvelope {
    pub answers: Vec<Answer>,
}

/// `GET /api/answers/` capitalizes its key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllAnswersEnvelope {
    #[serde(rename = "Answers")]
    pub answers: Vec<Answer>,
}

/// Server-side filters for `GET /api/questions`. One filter per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionFilter {
    Username(String),
    /// Questions with `votes_score >= n`.
    MinScore(i64),
    Keyword(String),
}

impl QuestionFilter {
    pub fn query_pair(&self) -> (&'static str, String) {
        match self {
            QuestionFilter::Username(name) => ("username", name.clone()),
            QuestionFilter::MinScore(score) => ("score", score.to_string()),
            QuestionFilter::Keyword(keyword) => ("keyword", keyword.clone()),
        }
    }
}

#[async_trait]
pub trait VoteGateway: Send + Sync {
    async fn create_vote(&self, request: VoteRequest) -> Result<VoteOutcome, FeedError>;

    async fn update_vote(
        &self,
        vote_id: Id,
        request: VoteRequest,
    ) -> Result<VoteOutcome, FeedError>;

    async fn delete_vote(&self, request: DeleteVoteRequest) -> Result<VoteOutcome, FeedError>;
}

#[async_trait]
pub trait ListGateway: Send + Sync {
    async fn fetch_questions(&self) -> Result<Vec<Question>, FeedError>;

    async fn filter_questions(&self, filter: &QuestionFilter)
        -> Result<Vec<Question>, FeedError>;

    async fn delete_question(&self, id: Id) -> Result<(), FeedError>;

    async fn fetch_answers(&self) -> Result<Vec<Answer>, FeedError>;

    async fn fetch_answers_for(&self, question_id: Id) -> Result<Vec<Answer>, FeedError>;

    async fn delete_answer(&self, id: Id) -> Result<(), FeedError>;
}

/// Both remote services.
pub trait FeedGateway: VoteGateway + ListGateway {}

// Blanket implementation: anything implementing both services is a FeedGateway
impl<T> FeedGateway for T where T: VoteGateway + ListGateway {}
