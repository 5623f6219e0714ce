//! Conversation flows driven through the retrieval client.

use askdocs_rs_core::{
    AccessGate, Conversation, ExchangeOutcome, ExchangeState, RetrievalClient, RetryPolicy,
    SecretsProvider,
};
use askdocs_rs_protocol::{Notice, Role, TurnKind};
use askdocs_rs_test_utils::{RecordingNoticeSink, ScriptedKnowledgeBase, StaticSecretsProvider};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn client(backend: ScriptedKnowledgeBase, notices: Arc<RecordingNoticeSink>) -> RetrievalClient {
    RetrievalClient::new(
        Arc::new(backend),
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(10),
        },
    )
    .with_notice_sink(notices)
}

#[tokio::test(start_paused = true)]
async fn gated_session_answers_and_clears() {
    let secrets = StaticSecretsProvider::new("letmein", "KB42")
        .fetch("bedrock_api", "us-east-1")
        .expect("secrets");
    let mut gate = AccessGate::new(secrets.access_password.clone());
    gate.login("letmein").expect("login");

    let notices = Arc::new(RecordingNoticeSink::default());
    let client = client(
        ScriptedKnowledgeBase::answering(
            "Expenses go through the finance portal.",
            &[
                "https://wiki.example.com/finance",
                "https://wiki.example.com/portal",
            ],
        ),
        notices.clone(),
    );
    let mut conversation = Conversation::new(secrets.knowledge_base_id);
    conversation.begin().expect("begin");

    let outcome = conversation
        .ask(&client, "How do I file expenses?")
        .await
        .expect("ask");

    assert_eq!(outcome, ExchangeOutcome::Answered);
    let turns: Vec<(Role, TurnKind, &str)> = conversation
        .turns()
        .iter()
        .map(|turn| (turn.role, turn.kind, turn.text.as_str()))
        .collect();
    assert_eq!(
        turns,
        vec![
            (Role::User, TurnKind::Question, "How do I file expenses?"),
            (
                Role::Assistant,
                TurnKind::Answer,
                "Expenses go through the finance portal."
            ),
            (
                Role::Assistant,
                TurnKind::Citation,
                "Source Document: https://wiki.example.com/finance"
            ),
            (
                Role::Assistant,
                TurnKind::Citation,
                "Source Document: https://wiki.example.com/portal"
            ),
        ]
    );

    conversation.clear().expect("clear");
    assert!(conversation.turns().is_empty());
    assert_eq!(conversation.state(), ExchangeState::AwaitingQuestion);
    assert!(notices.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn throttled_exchange_adds_no_answer_turn() {
    let notices = Arc::new(RecordingNoticeSink::default());
    let client = client(ScriptedKnowledgeBase::throttling(3), notices.clone());
    let mut conversation = Conversation::new("KB42");
    conversation.begin().expect("begin");

    let outcome = conversation.ask(&client, "q").await.expect("ask");

    assert_eq!(outcome, ExchangeOutcome::Failed);
    assert_eq!(conversation.turns().len(), 1);
    assert_eq!(notices.notices(), vec![Notice::TooManyRequests]);
    assert_eq!(conversation.state(), ExchangeState::AwaitingQuestion);
}

#[tokio::test(start_paused = true)]
async fn answer_without_citations_gets_no_context_marker() {
    let notices = Arc::new(RecordingNoticeSink::default());
    let client = client(ScriptedKnowledgeBase::answering("I am not sure.", &[]), notices);
    let mut conversation = Conversation::new("KB42");
    conversation.begin().expect("begin");

    conversation.ask(&client, "q").await.expect("ask");

    let kinds: Vec<TurnKind> = conversation.turns().iter().map(|turn| turn.kind).collect();
    assert_eq!(
        kinds,
        vec![TurnKind::Question, TurnKind::Answer, TurnKind::NoContext]
    );
}
