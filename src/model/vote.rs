use serde::{Deserialize, Serialize};

use super::{Id, ViewerId};

/// Which arrow the viewer clicked, and the canonical `direction` wire field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Contribution of one vote in this direction to a subject's score.
    pub fn weight(self) -> i64 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

/// A viewer's vote on one subject. At most one exists per (subject, owner).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: Id,
    pub subject_id: Id,
    pub direction: Direction,
    pub owner_id: ViewerId,
}

impl VoteRecord {
    pub fn new(id: Id, subject_id: Id, direction: Direction, owner_id: ViewerId) -> Self {
        Self {
            id,
            subject_id,
            direction,
            owner_id,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoteState {
    #[default]
    NoVote,
    Upvoted,
    Downvoted,
}

impl VoteState {
    pub fn from_record(record: Option<&VoteRecord>) -> Self {
        match record.map(|r| r.direction) {
            None => VoteState::NoVote,
            Some(Direction::Up) => VoteState::Upvoted,
            Some(Direction::Down) => VoteState::Downvoted,
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            VoteState::NoVote => None,
            VoteState::Upvoted => Some(Direction::Up),
            VoteState::Downvoted => Some(Direction::Down),
        }
    }
}

/// Arrow highlighting for the presentation layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VoteView {
    pub up_selected: bool,
    pub down_selected: bool,
}

pub fn view_of(state: VoteState) -> VoteView {
    VoteView {
        up_selected: state == VoteState::Upvoted,
        down_selected: state == VoteState::Downvoted,
    }
}
