//! Pure vote transition function.

use crate::model::{Direction, VoteState};

/// Remote mutation required by a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteOp {
    Create(Direction),
    Update(Direction),
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub next: VoteState,
    pub op: RemoteOp,
    /// Optimistic change to the subject's score.
    pub delta: i64,
}

/// Decide what clicking `clicked` does from `current`.
///
/// Clicking the arrow that is already selected withdraws the vote; clicking
/// the other arrow flips it, moving the score by two.
pub fn transition(current: VoteState, clicked: Direction) -> Transition {
    match (current.direction(), clicked) {
        (None, dir) => Transition {
            next: state_for(dir),
            op: RemoteOp::Create(dir),
            delta: dir.weight(),
        },
        (Some(held), dir) if held == dir => Transition {
            next: VoteState::NoVote,
            op: RemoteOp::Delete,
            delta: -held.weight(),
        },
        (Some(held), dir) => Transition {
            next: state_for(dir),
            op: RemoteOp::Update(dir),
            delta: dir.weight() - held.weight(),
        },
    }
}

fn state_for(direction: Direction) -> VoteState {
    match direction {
        Direction::Up => VoteState::Upvoted,
        Direction::Down => VoteState::Downvoted,
    }
}
