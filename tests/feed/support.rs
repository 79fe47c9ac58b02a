//! Shared fixtures: an in-memory backend that scores votes the way the real
//! service does, with hooks to fail or park requests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;
use votefeed::gateway::{DeleteVoteRequest, VoteRequest};
use votefeed::{
    Answer, AppState, ErrorBody, FeedConfig, FeedError, Id, ListGateway, Question,
    QuestionFilter, ViewerId, VoteGateway, VoteOutcome, VoteRecord,
};

pub const VIEWER: ViewerId = 7;

pub fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
}

pub fn question(id: Id, score: i64, minute: i64) -> Question {
    Question::new(id, at(minute))
        .with_title(format!("question {}", id))
        .with_score(score)
}

pub fn answer(id: Id, question_id: Id) -> Answer {
    Answer::new(id, question_id, at(id as i64)).with_details(format!("answer {}", id))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build an initialised app over a backend holding `questions`.
pub async fn feed(questions: Vec<Question>) -> (Arc<FakeBackend>, AppState<FakeBackend>) {
    init_tracing();
    let backend = Arc::new(FakeBackend::new(questions));
    let app = AppState::new(FeedConfig::new(VIEWER), Arc::clone(&backend));
    app.init().await.unwrap();
    (backend, app)
}

#[derive(Default)]
struct Tables {
    questions: Vec<Question>,
    answers: Vec<Answer>,
    votes: HashMap<Id, VoteRecord>,
    next_vote_id: Id,
}

#[derive(Default)]
pub struct FakeBackend {
    tables: Mutex<Tables>,
    failures: Mutex<VecDeque<FeedError>>,
    gate: Mutex<Option<Arc<Notify>>>,
    entered: Notify,
    vote_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(questions: Vec<Question>) -> Self {
        let backend = Self::default();
        {
            let mut tables = backend.tables.lock().unwrap();
            tables.questions = questions;
            tables.next_vote_id = 100;
        }
        backend
    }

    pub fn with_answers(self, answers: Vec<Answer>) -> Self {
        {
            let mut tables = self.tables.lock().unwrap();
            for answer in &answers {
                if let Some(q) = tables.questions.iter_mut().find(|q| q.id == answer.question_id) {
                    q.answers_count += 1;
                }
            }
            tables.answers = answers;
        }
        self
    }

    /// Register a vote the viewer cast in an earlier session. The stored
    /// score is assumed to already include it.
    pub fn seed_vote(&self, record: VoteRecord) {
        self.tables
            .lock()
            .unwrap()
            .votes
            .insert(record.subject_id, record);
    }

    /// Make the next request of any kind fail with `err`.
    pub fn fail_next(&self, err: FeedError) {
        self.failures.lock().unwrap().push_back(err);
    }

    /// Park vote requests until `release` is called.
    pub fn hold_votes(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_one();
        }
    }

    /// Resolves once a vote request has reached the backend.
    pub async fn vote_received(&self) {
        self.entered.notified().await;
    }

    pub fn vote_calls(&self) -> usize {
        self.vote_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn score_of(&self, id: Id) -> Option<i64> {
        self.tables
            .lock()
            .unwrap()
            .questions
            .iter()
            .find(|q| q.id == id)
            .map(|q| q.votes_score)
    }

    pub fn votes(&self) -> Vec<VoteRecord> {
        let mut votes: Vec<_> = self.tables.lock().unwrap().votes.values().cloned().collect();
        votes.sort_by_key(|v| v.subject_id);
        votes
    }

    pub fn set_score(&self, id: Id, score: i64) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(q) = tables.questions.iter_mut().find(|q| q.id == id) {
            q.votes_score = score;
        }
    }

    fn take_failure(&self) -> Result<(), FeedError> {
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn enter_vote(&self) -> Result<(), FeedError> {
        self.vote_calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.take_failure()
    }

    fn enter_list(&self) -> Result<(), FeedError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()
    }

    /// Apply the score change between the held and the new direction.
    fn rescore(tables: &mut Tables, subject_id: Id, delta: i64) -> Result<Question, FeedError> {
        let question = tables
            .questions
            .iter_mut()
            .find(|q| q.id == subject_id)
            .ok_or_else(|| not_found("Question couldn't be found."))?;
        question.votes_score += delta;
        Ok(question.clone())
    }
}

pub fn not_found(message: &str) -> FeedError {
    FeedError::Http {
        status: 404,
        body: ErrorBody::new(message),
    }
}

pub fn forbidden() -> FeedError {
    FeedError::Http {
        status: 403,
        body: ErrorBody::new("Forbidden"),
    }
}

#[async_trait]
impl VoteGateway for FakeBackend {
    async fn create_vote(&self, request: VoteRequest) -> Result<VoteOutcome, FeedError> {
        self.enter_vote().await?;
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_vote_id;
        tables.next_vote_id += 1;
        let vote = VoteRecord::new(id, request.subject_id, request.direction, VIEWER);
        let question = Self::rescore(&mut tables, request.subject_id, request.direction.weight())?;
        tables.votes.insert(request.subject_id, vote.clone());
        Ok(VoteOutcome {
            vote: Some(vote),
            question,
        })
    }

    async fn update_vote(
        &self,
        vote_id: Id,
        request: VoteRequest,
    ) -> Result<VoteOutcome, FeedError> {
        self.enter_vote().await?;
        let mut tables = self.tables.lock().unwrap();
        let held = tables
            .votes
            .get(&request.subject_id)
            .filter(|v| v.id == vote_id)
            .cloned()
            .ok_or_else(|| not_found("Vote couldn't be found."))?;
        let delta = request.direction.weight() - held.direction.weight();
        let question = Self::rescore(&mut tables, request.subject_id, delta)?;
        let vote = VoteRecord {
            direction: request.direction,
            ..held
        };
        tables.votes.insert(request.subject_id, vote.clone());
        Ok(VoteOutcome {
            vote: Some(vote),
            question,
        })
    }

    async fn delete_vote(&self, request: DeleteVoteRequest) -> Result<VoteOutcome, FeedError> {
        self.enter_vote().await?;
        let mut tables = self.tables.lock().unwrap();
        let held = tables
            .votes
            .values()
            .find(|v| v.id == request.vote_id)
            .cloned()
            .ok_or_else(|| not_found("Vote couldn't be found."))?;
        tables.votes.remove(&held.subject_id);
        let question = Self::rescore(&mut tables, held.subject_id, -held.direction.weight())?;
        Ok(VoteOutcome {
            vote: None,
            question,
        })
    }
}

#[async_trait]
impl ListGateway for FakeBackend {
    async fn fetch_questions(&self) -> Result<Vec<Question>, FeedError> {
        self.enter_list()?;
        Ok(self.tables.lock().unwrap().questions.clone())
    }

    async fn filter_questions(
        &self,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, FeedError> {
        self.enter_list()?;
        let tables = self.tables.lock().unwrap();
        let matches = |q: &Question| match filter {
            QuestionFilter::MinScore(min) => q.votes_score >= *min,
            QuestionFilter::Keyword(word) => {
                let word = word.to_lowercase();
                q.title.to_lowercase().contains(&word) || q.details.to_lowercase().contains(&word)
            }
            QuestionFilter::Username(name) => q
                .extra
                .get("username")
                .and_then(|v| v.as_str())
                .map_or(false, |u| u == name),
        };
        Ok(tables.questions.iter().filter(|q| matches(q)).cloned().collect())
    }

    async fn delete_question(&self, id: Id) -> Result<(), FeedError> {
        self.enter_list()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.questions.len();
        tables.questions.retain(|q| q.id != id);
        if tables.questions.len() == before {
            return Err(not_found("Question couldn't be found."));
        }
        tables.answers.retain(|a| a.question_id != id);
        Ok(())
    }

    async fn fetch_answers(&self) -> Result<Vec<Answer>, FeedError> {
        self.enter_list()?;
        Ok(self.tables.lock().unwrap().answers.clone())
    }

    async fn fetch_answers_for(&self, question_id: Id) -> Result<Vec<Answer>, FeedError> {
        self.enter_list()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn delete_answer(&self, id: Id) -> Result<(), FeedError> {
        self.enter_list()?;
        let mut tables = self.tables.lock().unwrap();
        let question_id = tables
            .answers
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.question_id)
            .ok_or_else(|| not_found("Answer couldn't be found."))?;
        tables.answers.retain(|a| a.id != id);
        if let Some(q) = tables.questions.iter_mut().find(|q| q.id == question_id) {
            q.answers_count = q.answers_count.saturating_sub(1);
        }
        Ok(())
    }
}
