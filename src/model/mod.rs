//! Feed entities as they travel over the wire and live in the stores.
//!
//! Field names follow the backend's JSON (`votes_score`, `answers_count`,
//! `created_at`). Payload fields this crate does not interpret are kept in
//! `extra`, so replacing a record with the server's copy never drops data.

mod answer;
mod question;
mod timestamp;
mod vote;

/// Server-assigned primary key for questions, answers and vote records.
pub type Id = u64;

/// Identifier of the viewer whose votes are tracked.
pub type ViewerId = u64;

pub use answer::Answer;
pub use question::Question;
pub use vote::{view_of, Direction, VoteRecord, VoteState, VoteView};
