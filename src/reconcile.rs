//! The single writer of the question store once the list is loaded.
//!
//! Every mutation here is followed by a projection recompute, whether or not
//! the touched question is currently displayed.

use tracing::{debug, info};

use crate::error::StateError;
use crate::model::{Id, Question};
use crate::projection::ProjectionEngine;
use crate::store::EntityStore;

/// Outcome of an optimistic score change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChange {
    pub votes_score: i64,
    /// Revision of the question the delta was applied to.
    pub revision: u64,
}

#[derive(Clone)]
pub struct CrossEntityReconciler {
    questions: EntityStore<Question>,
    projection: ProjectionEngine,
}

impl CrossEntityReconciler {
    pub fn new(questions: EntityStore<Question>, projection: ProjectionEngine) -> Self {
        Self {
            questions,
            projection,
        }
    }

    /// Replace the stored question with the server's authoritative copy.
    pub fn on_vote_resolved(&self, question: Question) -> Result<(), StateError> {
        let id = question.id;
        let score = question.votes_score;
        self.questions.replace(question)?;
        self.projection.recompute()?;
        info!(question_id = id, votes_score = score, "vote resolved");
        Ok(())
    }

    /// Shift a question's local score by `delta`.
    ///
    /// Used for the optimistic step of a vote. The returned revision is what
    /// `revert_score_delta` needs to undo it.
    pub fn apply_score_delta(&self, id: Id, delta: i64) -> Result<ScoreChange, StateError> {
        let (patched, revision) = self
            .questions
            .patch_tracked(id, |q| q.votes_score += delta)?;
        self.projection.recompute()?;
        debug!(question_id = id, delta, votes_score = patched.votes_score, "score adjusted");
        Ok(ScoreChange {
            votes_score: patched.votes_score,
            revision,
        })
    }

    /// Undo an optimistic `delta`, but only if the question has not been
    /// replaced by a server copy since `revision`.
    ///
    /// A reloaded or reconciled copy already reflects the server's score and
    /// is left as is. Returns the restored score when the delta was undone.
    pub fn revert_score_delta(
        &self,
        id: Id,
        delta: i64,
        revision: u64,
    ) -> Result<Option<i64>, StateError> {
        match self.questions.patch_at(id, revision, |q| q.votes_score -= delta)? {
            Some(patched) => {
                self.projection.recompute()?;
                debug!(
                    question_id = id,
                    delta,
                    votes_score = patched.votes_score,
                    "score reverted"
                );
                Ok(Some(patched.votes_score))
            }
            None => {
                debug!(question_id = id, "question replaced since the optimistic update");
                Ok(None)
            }
        }
    }

    pub fn on_list_loaded(&self, questions: Vec<Question>) -> Result<(), StateError> {
        let count = questions.len();
        self.questions.load(questions)?;
        self.projection.recompute()?;
        info!(count, "question list loaded");
        Ok(())
    }

    /// Remove a deleted question. Returns whether it was present.
    pub fn on_question_deleted(&self, id: Id) -> Result<bool, StateError> {
        let removed = self.questions.remove(id)?;
        self.projection.recompute()?;
        Ok(removed)
    }

    /// Keep `answers_count` in step after an answer is deleted.
    ///
    /// A question that is no longer loaded is skipped.
    pub fn on_answer_deleted(&self, question_id: Id) -> Result<(), StateError> {
        if !self.questions.contains(question_id)? {
            return Ok(());
        }
        self.questions.patch(question_id, |q| {
            q.answers_count = q.answers_count.saturating_sub(1)
        })?;
        self.projection.recompute()?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StateError> {
        self.questions.clear()?;
        self.projection.reset()
    }
}
