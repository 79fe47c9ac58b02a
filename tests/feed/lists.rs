//! List loading, filtering and deletes.

use std::sync::Arc;

use serde_json::json;
use votefeed::{
    AppState, Direction, FeedConfig, FeedError, ProjectionRule, QuestionFilter, VoteState,
};

use crate::support::{answer, feed, forbidden, init_tracing, question, FakeBackend, VIEWER};

#[tokio::test]
async fn init_loads_questions_under_the_configured_rule() {
    init_tracing();
    let backend = Arc::new(FakeBackend::new(vec![question(1, 5, 0), question(2, 9, 1)]));
    let config = FeedConfig::new(VIEWER).with_initial_rule(ProjectionRule::ByScore);
    let app = AppState::new(config, Arc::clone(&backend));

    let projection = app.init().await.unwrap();

    assert_eq!(projection.rule, ProjectionRule::ByScore);
    assert_eq!(projection.items, vec![2, 1]);
    assert_eq!(app.questions().unwrap().len(), 2);
    assert_eq!(backend.list_calls(), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_the_current_list() {
    let (backend, app) = feed(vec![question(1, 5, 0), question(2, 9, 1)]).await;
    backend.fail_next(FeedError::Network("timed out".into()));

    let err = app.refresh_questions().await.unwrap_err();

    assert_eq!(err, FeedError::Network("timed out".into()));
    assert_eq!(app.questions().unwrap().len(), 2);
    assert_eq!(app.displayed().unwrap().items, vec![2, 1]);
    assert_eq!(app.last_error(), Some(err));

    // A successful refresh clears the error.
    app.refresh_questions().await.unwrap();
    assert_eq!(app.last_error(), None);
}

#[tokio::test]
async fn refresh_picks_up_server_side_changes() {
    let (backend, app) = feed(vec![question(1, 5, 0), question(2, 5, 1)]).await;
    app.set_rule(ProjectionRule::ByScore).unwrap();
    backend.set_score(2, 20);

    app.refresh_questions().await.unwrap();

    assert_eq!(app.question(2).unwrap().unwrap().votes_score, 20);
    assert_eq!(app.displayed().unwrap().items, vec![2, 1]);
}

#[tokio::test]
async fn delete_question_removes_only_that_question() {
    let backend = FakeBackend::new(vec![question(1, 0, 0), question(2, 0, 1), question(3, 0, 2)])
        .with_answers(vec![answer(10, 2), answer(11, 3)]);
    let backend = Arc::new(backend);
    let app = AppState::new(FeedConfig::new(VIEWER), Arc::clone(&backend));
    app.init().await.unwrap();
    app.refresh_answers().await.unwrap();

    app.delete_question(2).await.unwrap();

    let ids: Vec<_> = app.questions().unwrap().iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(app.displayed().unwrap().items, vec![3, 1]);
    assert!(app.answers_for(2).unwrap().is_empty());
    assert_eq!(app.answers_for(3).unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_delete_keeps_the_question() {
    let (backend, app) = feed(vec![question(1, 0, 0)]).await;
    backend.fail_next(forbidden());

    let err = app.delete_question(1).await.unwrap_err();

    assert!(matches!(err, FeedError::Http { status: 403, .. }));
    assert!(app.question(1).unwrap().is_some());
    assert_eq!(app.last_error().unwrap().display_message(), "Forbidden");
}

#[tokio::test]
async fn deleting_a_missing_question_reports_not_found() {
    let (_backend, app) = feed(vec![question(1, 0, 0)]).await;

    let err = app.delete_question(99).await.unwrap_err();

    assert_eq!(err.display_message(), "Question couldn't be found.");
    assert_eq!(app.questions().unwrap().len(), 1);
}

#[tokio::test]
async fn filter_replaces_the_canonical_list() {
    let mut tagged = question(3, 1, 2).with_title("Borrow checker help");
    tagged.extra.insert("username".into(), json!("ferris"));
    let (_backend, app) = feed(vec![
        question(1, 8, 0).with_title("Async traits"),
        question(2, 2, 1).with_title("Lifetimes in async code"),
        tagged,
    ])
    .await;

    app.filter_questions(QuestionFilter::MinScore(2)).await.unwrap();
    assert_eq!(app.displayed().unwrap().items, vec![2, 1]);

    app.filter_questions(QuestionFilter::Keyword("ASYNC".into()))
        .await
        .unwrap();
    let ids: Vec<_> = app.questions().unwrap().iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![1, 2]);

    app.filter_questions(QuestionFilter::Username("ferris".into()))
        .await
        .unwrap();
    assert_eq!(app.displayed().unwrap().items, vec![3]);

    app.refresh_questions().await.unwrap();
    assert_eq!(app.questions().unwrap().len(), 3);
}

#[tokio::test]
async fn answers_load_per_question() {
    let backend = FakeBackend::new(vec![question(1, 0, 0), question(2, 0, 1)])
        .with_answers(vec![answer(10, 1), answer(11, 1), answer(12, 2)]);
    let backend = Arc::new(backend);
    let app = AppState::new(FeedConfig::new(VIEWER), Arc::clone(&backend));
    app.init().await.unwrap();

    let answers = app.load_answers_for(1).await.unwrap();
    let ids: Vec<_> = answers.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert!(app.answers_for(2).unwrap().is_empty());

    app.refresh_answers().await.unwrap();
    assert_eq!(app.answers().unwrap().len(), 3);
}

#[tokio::test]
async fn deleting_the_last_answer_makes_a_question_unanswered() {
    let backend = FakeBackend::new(vec![question(1, 0, 0), question(2, 0, 1)])
        .with_answers(vec![answer(10, 1), answer(11, 2), answer(12, 2)]);
    let backend = Arc::new(backend);
    let app = AppState::new(FeedConfig::new(VIEWER), Arc::clone(&backend));
    app.init().await.unwrap();
    app.refresh_answers().await.unwrap();
    app.set_rule(ProjectionRule::UnansweredOnly).unwrap();
    assert!(app.displayed().unwrap().items.is_empty());

    app.delete_answer(10).await.unwrap();

    let remaining: Vec<_> = app.answers().unwrap().iter().map(|a| a.id).collect();
    assert_eq!(remaining, vec![11, 12]);
    assert_eq!(app.question(1).unwrap().unwrap().answers_count, 0);
    assert_eq!(app.displayed().unwrap().items, vec![1]);
}

#[tokio::test]
async fn teardown_clears_state_and_allows_reinit() {
    let (backend, app) = feed(vec![question(1, 10, 0)]).await;
    app.vote(1, Direction::Up).await.unwrap();
    backend.fail_next(FeedError::Network("offline".into()));
    let _ = app.refresh_questions().await;

    app.teardown().unwrap();

    assert!(app.questions().unwrap().is_empty());
    assert!(app.displayed().unwrap().items.is_empty());
    assert!(app.vote_records().unwrap().is_empty());
    assert_eq!(app.last_error(), None);

    app.init().await.unwrap();
    assert_eq!(app.question(1).unwrap().unwrap().votes_score, 11);
    assert_eq!(app.vote_state(1).unwrap(), VoteState::NoVote);
}
