use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use super::machine::{self, RemoteOp, Transition};
use crate::error::{FeedError, StateError};
use crate::gateway::{DeleteVoteRequest, VoteGateway, VoteOutcome, VoteRequest};
use crate::lock::{InMemoryLockManager, LockManager};
use crate::model::{Direction, Id, Question, ViewerId, VoteRecord, VoteState};
use crate::reconcile::CrossEntityReconciler;
use crate::store::VoteRecordStore;

/// A remote op with the vote id it targets resolved.
#[derive(Debug, Clone, Copy)]
enum Dispatch {
    Create { direction: Direction },
    Update { vote_id: Id, direction: Direction },
    Delete { vote_id: Id },
}

/// Runs vote clicks end to end: lock the subject, apply the optimistic
/// score, call the gateway, then confirm or roll back.
///
/// The vote store is written only after the backend confirms, so a failed
/// call leaves it untouched; the optimistic state lives in `pending` until
/// the call resolves.
pub struct VoteSyncCoordinator<G, L = InMemoryLockManager> {
    gateway: Arc<G>,
    viewer_id: ViewerId,
    votes: VoteRecordStore,
    reconciler: CrossEntityReconciler,
    locks: L,
    pending: Mutex<HashMap<Id, VoteState>>,
}

impl<G: VoteGateway> VoteSyncCoordinator<G> {
    pub fn new(
        gateway: Arc<G>,
        viewer_id: ViewerId,
        votes: VoteRecordStore,
        reconciler: CrossEntityReconciler,
    ) -> Self {
        Self::with_locks(
            gateway,
            viewer_id,
            votes,
            reconciler,
            InMemoryLockManager::new(),
        )
    }
}

impl<G: VoteGateway, L: LockManager> VoteSyncCoordinator<G, L> {
    pub fn with_locks(
        gateway: Arc<G>,
        viewer_id: ViewerId,
        votes: VoteRecordStore,
        reconciler: CrossEntityReconciler,
        locks: L,
    ) -> Self {
        Self {
            gateway,
            viewer_id,
            votes,
            reconciler,
            locks,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn viewer_id(&self) -> ViewerId {
        self.viewer_id
    }

    /// Current vote state for `subject_id`, including an unconfirmed click.
    pub fn vote_state(&self, subject_id: Id) -> Result<VoteState, FeedError> {
        if let Some(state) = self.pending()?.get(&subject_id) {
            return Ok(*state);
        }
        Ok(self.votes.state_of(subject_id, self.viewer_id)?)
    }

    pub fn is_in_flight(&self, subject_id: Id) -> Result<bool, FeedError> {
        Ok(self.locks.is_locked(subject_id)?)
    }

    /// Apply a click on `direction` for `subject_id`.
    ///
    /// While a previous click on the same subject is unresolved this fails
    /// with `FeedError::InFlight` and makes no remote call. On a network or
    /// HTTP failure, or when the returned future is dropped before it
    /// resolves, the pending state is cleared and the optimistic score is
    /// reversed, unless the question was replaced by a server copy meanwhile.
    pub async fn apply_vote(
        &self,
        subject_id: Id,
        direction: Direction,
    ) -> Result<Question, FeedError> {
        let guard = match self.locks.try_acquire(subject_id)? {
            Some(guard) => guard,
            None => {
                warn!(subject_id, "vote rejected, previous vote still in flight");
                return Err(FeedError::InFlight { subject_id });
            }
        };

        let result = self.run_vote(subject_id, direction).await;
        drop(guard);
        self.prune_locks();
        result
    }

    async fn run_vote(&self, subject_id: Id, direction: Direction) -> Result<Question, FeedError> {
        let current = self.votes.get(subject_id, self.viewer_id)?;
        let prior = VoteState::from_record(current.as_ref());
        let transition = machine::transition(prior, direction);
        let dispatch = Self::resolve(subject_id, &transition, current.as_ref())
            .map_err(|err| self.loud(err))?;

        debug!(
            subject_id,
            ?prior,
            next = ?transition.next,
            delta = transition.delta,
            "vote transition"
        );

        let change = self
            .reconciler
            .apply_score_delta(subject_id, transition.delta)
            .map_err(|err| self.loud(err))?;
        let mut optimistic = Optimistic {
            subject_id,
            delta: transition.delta,
            revision: change.revision,
            reconciler: &self.reconciler,
            pending: &self.pending,
            settled: false,
        };
        self.pending()?.insert(subject_id, transition.next);

        match self.send(subject_id, dispatch).await {
            Ok(outcome) => {
                let question = self.confirm(subject_id, dispatch, &transition, outcome)?;
                optimistic.settle();
                Ok(question)
            }
            Err(err) => {
                warn!(subject_id, error = %err, "vote failed, rolling back");
                Err(err)
            }
        }
    }

    fn resolve(
        subject_id: Id,
        transition: &Transition,
        current: Option<&VoteRecord>,
    ) -> Result<Dispatch, StateError> {
        let vote_id = || {
            current
                .map(|record| record.id)
                .ok_or(StateError::MissingVote { subject_id })
        };
        Ok(match transition.op {
            RemoteOp::Create(direction) => Dispatch::Create { direction },
            RemoteOp::Update(direction) => Dispatch::Update {
                vote_id: vote_id()?,
                direction,
            },
            RemoteOp::Delete => Dispatch::Delete {
                vote_id: vote_id()?,
            },
        })
    }

    async fn send(&self, subject_id: Id, dispatch: Dispatch) -> Result<VoteOutcome, FeedError> {
        match dispatch {
            Dispatch::Create { direction } => {
                self.gateway
                    .create_vote(VoteRequest {
                        subject_id,
                        direction,
                    })
                    .await
            }
            Dispatch::Update { vote_id, direction } => {
                self.gateway
                    .update_vote(
                        vote_id,
                        VoteRequest {
                            subject_id,
                            direction,
                        },
                    )
                    .await
            }
            Dispatch::Delete { vote_id } => {
                self.gateway
                    .delete_vote(DeleteVoteRequest { vote_id })
                    .await
            }
        }
    }

    fn confirm(
        &self,
        subject_id: Id,
        dispatch: Dispatch,
        transition: &Transition,
        outcome: VoteOutcome,
    ) -> Result<Question, FeedError> {
        self.record_vote(subject_id, dispatch, outcome.vote)
            .map_err(|err| self.loud(err))?;

        let question = outcome.question;
        self.reconciler
            .on_vote_resolved(question.clone())
            .map_err(|err| self.loud(err))?;

        info!(
            subject_id,
            state = ?transition.next,
            votes_score = question.votes_score,
            "vote confirmed"
        );
        Ok(question)
    }

    fn record_vote(
        &self,
        subject_id: Id,
        dispatch: Dispatch,
        vote: Option<VoteRecord>,
    ) -> Result<(), StateError> {
        match dispatch {
            Dispatch::Create { .. } => {
                let vote = vote.ok_or(StateError::MissingVote { subject_id })?;
                self.votes.insert(self.owned(vote, subject_id))
            }
            Dispatch::Update { .. } => {
                let vote = vote.ok_or(StateError::MissingVote { subject_id })?;
                self.votes.replace(self.owned(vote, subject_id))
            }
            Dispatch::Delete { .. } => {
                self.votes.remove(subject_id, self.viewer_id)?;
                Ok(())
            }
        }
    }

    /// Key the confirmed record to this viewer and subject regardless of how
    /// the backend echoes them.
    fn owned(&self, vote: VoteRecord, subject_id: Id) -> VoteRecord {
        VoteRecord {
            subject_id,
            owner_id: self.viewer_id,
            ..vote
        }
    }

    fn loud(&self, err: StateError) -> FeedError {
        error!(error = %err, viewer_id = self.viewer_id, "vote state invariant violated");
        FeedError::State(err)
    }

    fn pending(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Id, VoteState>>, StateError> {
        self.pending
            .lock()
            .map_err(|_| StateError::Poisoned("pending votes"))
    }

    fn prune_locks(&self) {
        if let Err(err) = self.locks.prune() {
            warn!(error = %err, "failed to prune subject locks");
        }
    }

    /// Forget all pending state and idle locks. Used on teardown.
    pub fn reset(&self) -> Result<(), StateError> {
        self.pending()?.clear();
        self.prune_locks();
        Ok(())
    }
}

/// The optimistic effects of one click: the pending state and the score
/// delta.
///
/// Dropping it clears the pending state. Unless `settle`d, it also reverts
/// the delta, which covers both a failed call and a vote future dropped
/// before the backend answered.
struct Optimistic<'a> {
    subject_id: Id,
    delta: i64,
    revision: u64,
    reconciler: &'a CrossEntityReconciler,
    pending: &'a Mutex<HashMap<Id, VoteState>>,
    settled: bool,
}

impl Optimistic<'_> {
    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for Optimistic<'_> {
    fn drop(&mut self) {
        let subject_id = self.subject_id;
        match self.pending.lock() {
            Ok(mut pending) => {
                pending.remove(&subject_id);
            }
            Err(_) => error!(subject_id, "failed to clear pending vote, lock poisoned"),
        }
        if self.settled {
            return;
        }
        if let Err(err) = self
            .reconciler
            .revert_score_delta(subject_id, self.delta, self.revision)
        {
            error!(subject_id, error = %err, "failed to roll back optimistic score");
        }
    }
}
