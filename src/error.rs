use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lock::LockError;
use crate::model::{Id, ViewerId};

/// JSON error payload returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            extra: Map::new(),
        }
    }
}

/// Invariant violations inside the local stores.
///
/// These signal a programming defect and are never recovered from silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    NotFound {
        collection: &'static str,
        id: Id,
    },
    DuplicateVote {
        subject_id: Id,
        owner_id: ViewerId,
    },
    MissingVote {
        subject_id: Id,
    },
    Poisoned(&'static str),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::NotFound { collection, id } => {
                write!(f, "{} record {} not found", collection, id)
            }
            StateError::DuplicateVote {
                subject_id,
                owner_id,
            } => write!(
                f,
                "viewer {} already holds a vote on subject {}",
                owner_id, subject_id
            ),
            StateError::MissingVote { subject_id } => {
                write!(f, "no vote record for subject {}", subject_id)
            }
            StateError::Poisoned(operation) => {
                write!(f, "state lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for StateError {}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Transport failure, timeout, or a body that is not valid JSON.
    Network(String),
    /// The backend answered with a status outside 2xx.
    Http { status: u16, body: ErrorBody },
    State(StateError),
    /// A vote mutation for this subject has not resolved yet.
    InFlight { subject_id: Id },
    Lock(LockError),
}

impl FeedError {
    pub fn is_state(&self) -> bool {
        matches!(self, FeedError::State(_))
    }

    /// The message a presentation layer would show for this error.
    pub fn display_message(&self) -> String {
        match self {
            FeedError::Http { body, .. } if !body.error.is_empty() => body.error.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Network(message) => write!(f, "network error: {}", message),
            FeedError::Http { status, body } => {
                write!(f, "http error {}: {}", status, body.error)
            }
            FeedError::State(err) => write!(f, "state error: {}", err),
            FeedError::InFlight { subject_id } => {
                write!(f, "a vote on subject {} is already in flight", subject_id)
            }
            FeedError::Lock(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::State(err) => Some(err),
            FeedError::Lock(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StateError> for FeedError {
    fn from(err: StateError) -> Self {
        FeedError::State(err)
    }
}

impl From<LockError> for FeedError {
    fn from(err: LockError) -> Self {
        FeedError::Lock(err)
    }
}
