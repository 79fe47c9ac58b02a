//! Explicitly constructed application state handed to the presentation layer.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use votefeed::{AppState, Direction, FeedConfig, ProjectionRule};
//!
//! let app = AppState::new(FeedConfig::new(viewer_id), Arc::new(gateway));
//! app.init().await?;
//!
//! app.vote(question_id, Direction::Up).await?;
//! app.set_rule(ProjectionRule::ByScore)?;
//! for id in app.displayed()?.items { /* render */ }
//!
//! app.teardown()?;
//! ```

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::error::{FeedError, StateError};
use crate::gateway::{FeedGateway, QuestionFilter};
use crate::model::{view_of, Answer, Direction, Id, Question, VoteRecord, VoteState, VoteView};
use crate::projection::{Projection, ProjectionEngine, ProjectionRule};
use crate::reconcile::CrossEntityReconciler;
use crate::store::{EntityStore, VoteRecordStore};
use crate::vote::VoteSyncCoordinator;

pub struct AppState<G> {
    config: FeedConfig,
    gateway: Arc<G>,
    questions: EntityStore<Question>,
    answers: EntityStore<Answer>,
    votes: VoteRecordStore,
    projection: ProjectionEngine,
    reconciler: CrossEntityReconciler,
    coordinator: VoteSyncCoordinator<G>,
    last_error: Mutex<Option<FeedError>>,
}

impl<G: FeedGateway> AppState<G> {
    pub fn new(config: FeedConfig, gateway: Arc<G>) -> Self {
        let questions = EntityStore::new();
        let answers = EntityStore::new();
        let votes = VoteRecordStore::new();
        let projection = ProjectionEngine::with_rule(questions.clone(), config.initial_rule);
        let reconciler = CrossEntityReconciler::new(questions.clone(), projection.clone());
        let coordinator = VoteSyncCoordinator::new(
            Arc::clone(&gateway),
            config.viewer_id,
            votes.clone(),
            reconciler.clone(),
        );

        Self {
            config,
            gateway,
            questions,
            answers,
            votes,
            projection,
            reconciler,
            coordinator,
            last_error: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Fetch the question list and compute the initial projection.
    pub async fn init(&self) -> Result<Projection, FeedError> {
        self.refresh_questions().await?;
        info!(
            viewer_id = self.config.viewer_id,
            rule = %self.config.initial_rule,
            "feed initialised"
        );
        Ok(self.projection.displayed()?)
    }

    /// Drop all local state. The instance can be `init`ed again afterwards.
    pub fn teardown(&self) -> Result<(), FeedError> {
        self.reconciler.clear()?;
        self.answers.clear()?;
        self.votes.clear()?;
        self.coordinator.reset()?;
        *self.error_slot()? = None;
        info!(viewer_id = self.config.viewer_id, "feed torn down");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Questions
    // ------------------------------------------------------------------

    /// Replace the canonical list with the backend's. On failure the current
    /// list is kept and the error is recorded for display.
    pub async fn refresh_questions(&self) -> Result<(), FeedError> {
        let result = self.gateway.fetch_questions().await;
        let questions = self.record(result)?;
        self.reconciler.on_list_loaded(questions)?;
        self.clear_error()
    }

    /// Replace the canonical list with a server-filtered one.
    pub async fn filter_questions(&self, filter: QuestionFilter) -> Result<(), FeedError> {
        let result = self.gateway.filter_questions(&filter).await;
        let questions = self.record(result)?;
        info!(?filter, count = questions.len(), "questions filtered");
        self.reconciler.on_list_loaded(questions)?;
        self.clear_error()
    }

    pub async fn delete_question(&self, id: Id) -> Result<(), FeedError> {
        let result = self.gateway.delete_question(id).await;
        self.record(result)?;
        self.reconciler.on_question_deleted(id)?;
        self.answers.retain(|a| a.question_id != id)?;
        self.clear_error()
    }

    pub fn question(&self, id: Id) -> Result<Option<Question>, FeedError> {
        Ok(self.questions.get(id)?)
    }

    pub fn questions(&self) -> Result<Vec<Question>, FeedError> {
        Ok(self.questions.all()?)
    }

    // ------------------------------------------------------------------
    // Answers
    // ------------------------------------------------------------------

    pub async fn refresh_answers(&self) -> Result<(), FeedError> {
        let result = self.gateway.fetch_answers().await;
        let answers = self.record(result)?;
        self.answers.load(answers)?;
        self.clear_error()
    }

    /// Fetch one question's answers, replacing whatever was held for it.
    pub async fn load_answers_for(&self, question_id: Id) -> Result<Vec<Answer>, FeedError> {
        let result = self.gateway.fetch_answers_for(question_id).await;
        let answers = self.record(result)?;
        self.answers.retain(|a| a.question_id != question_id)?;
        self.answers.merge(answers)?;
        self.clear_error()?;
        self.answers_for(question_id)
    }

    pub async fn delete_answer(&self, id: Id) -> Result<(), FeedError> {
        let result = self.gateway.delete_answer(id).await;
        self.record(result)?;
        let question_id = self.answers.get(id)?.map(|a| a.question_id);
        if self.answers.remove(id)? {
            if let Some(question_id) = question_id {
                self.reconciler.on_answer_deleted(question_id)?;
            }
        }
        self.clear_error()
    }

    pub fn answers_for(&self, question_id: Id) -> Result<Vec<Answer>, FeedError> {
        Ok(self.answers.find(|a| a.question_id == question_id)?)
    }

    pub fn answers(&self) -> Result<Vec<Answer>, FeedError> {
        Ok(self.answers.all()?)
    }

    // ------------------------------------------------------------------
    // Votes
    // ------------------------------------------------------------------

    /// Load the viewer's existing votes so initial states are correct.
    ///
    /// Records owned by other viewers are ignored.
    pub fn seed_votes(&self, records: Vec<VoteRecord>) -> Result<(), FeedError> {
        let viewer_id = self.config.viewer_id;
        let (own, foreign): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.owner_id == viewer_id);
        if !foreign.is_empty() {
            warn!(count = foreign.len(), "ignoring vote records of other viewers");
        }
        self.votes.load(own).map_err(|err| self.state_error(err))
    }

    pub async fn vote(&self, subject_id: Id, direction: Direction) -> Result<Question, FeedError> {
        let result = self.coordinator.apply_vote(subject_id, direction).await;
        if let Err(err) = &result {
            self.set_error(err.clone());
        }
        result
    }

    pub fn vote_state(&self, subject_id: Id) -> Result<VoteState, FeedError> {
        self.coordinator.vote_state(subject_id)
    }

    pub fn vote_view(&self, subject_id: Id) -> Result<VoteView, FeedError> {
        Ok(view_of(self.vote_state(subject_id)?))
    }

    pub fn is_vote_in_flight(&self, subject_id: Id) -> Result<bool, FeedError> {
        self.coordinator.is_in_flight(subject_id)
    }

    pub fn vote_records(&self) -> Result<Vec<VoteRecord>, FeedError> {
        Ok(self.votes.records_for(self.config.viewer_id)?)
    }

    // ------------------------------------------------------------------
    // Projection
    // ------------------------------------------------------------------

    pub fn set_rule(&self, rule: ProjectionRule) -> Result<Projection, FeedError> {
        Ok(self.projection.set_rule(rule)?)
    }

    pub fn rule(&self) -> Result<ProjectionRule, FeedError> {
        Ok(self.projection.rule()?)
    }

    /// The displayed question ids, never older than the canonical list.
    pub fn displayed(&self) -> Result<Projection, FeedError> {
        Ok(self.projection.displayed()?)
    }

    /// Displayed questions in projection order.
    pub fn displayed_questions(&self) -> Result<Vec<Question>, FeedError> {
        let projection = self.projection.displayed()?;
        let mut questions = Vec::with_capacity(projection.items.len());
        for id in projection.items {
            if let Some(question) = self.questions.get(id)? {
                questions.push(question);
            }
        }
        Ok(questions)
    }

    #[cfg(feature = "emitter")]
    pub fn on_refresh<F>(&self, listener: F) -> Result<(), FeedError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        Ok(self.projection.on_refresh(listener)?)
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    /// Last failure worth showing to the user, if any.
    pub fn last_error(&self) -> Option<FeedError> {
        self.last_error.lock().ok().and_then(|slot| slot.clone())
    }

    fn error_slot(&self) -> Result<std::sync::MutexGuard<'_, Option<FeedError>>, StateError> {
        self.last_error
            .lock()
            .map_err(|_| StateError::Poisoned("last error"))
    }

    fn set_error(&self, err: FeedError) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(err);
        }
    }

    fn clear_error(&self) -> Result<(), FeedError> {
        *self.error_slot()? = None;
        Ok(())
    }

    fn record<T>(&self, result: Result<T, FeedError>) -> Result<T, FeedError> {
        result.map_err(|err| {
            warn!(error = %err, "remote request failed");
            self.set_error(err.clone());
            err
        })
    }

    fn state_error(&self, err: StateError) -> FeedError {
        tracing::error!(error = %err, "vote state invariant violated");
        let err = FeedError::State(err);
        self.set_error(err.clone());
        err
    }
}
