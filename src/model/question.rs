use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Id, ViewerId};
use crate::Record;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Record)]
#[record(collection = "questions")]
pub struct Question {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub details: String,
    pub votes_score: i64,
    #[serde(default)]
    pub answers_count: u32,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        with = "super::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ViewerId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    pub fn new(id: Id, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: String::new(),
            details: String::new(),
            votes_score: 0,
            answers_count: 0,
            created_at,
            updated_at: None,
            user_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_score(mut self, votes_score: i64) -> Self {
        self.votes_score = votes_score;
        self
    }

    pub fn with_answers(mut self, answers_count: u32) -> Self {
        self.answers_count = answers_count;
        self
    }

    pub fn is_unanswered(&self) -> bool {
        self.answers_count == 0
    }
}
