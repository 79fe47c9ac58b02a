use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Id, ViewerId};
use crate::Record;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Record)]
#[record(collection = "answers")]
pub struct Answer {
    pub id: Id,
    pub question_id: Id,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ViewerId>,
    #[serde(default)]
    pub votes_score: i64,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Answer {
    pub fn new(id: Id, question_id: Id, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            question_id,
            details: String::new(),
            user_id: None,
            votes_score: 0,
            created_at,
            extra: Map::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}
