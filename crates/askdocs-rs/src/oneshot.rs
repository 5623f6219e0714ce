//! One-shot question flow behind the password gate.

use askdocs_rs_core::{AccessGate, Conversation, ExchangeOutcome, RetrievalClient};
use askdocs_rs_protocol::{ConversationTurn, Notice, NoticeSink};
use log::info;
use parking_lot::Mutex;
use std::sync::Arc;

/// Result of a single `ask` exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct AskReport {
    pub outcome: ExchangeOutcome,
    /// Assistant turns appended for the question.
    pub turns: Vec<ConversationTurn>,
    /// Notices raised while answering.
    pub notices: Vec<Notice>,
}

impl AskReport {
    /// Assistant turns as printable text, one per line.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| turn.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Default)]
struct CollectedNotices(Mutex<Vec<Notice>>);

impl NoticeSink for CollectedNotices {
    fn notify(&self, notice: Notice) {
        self.0.lock().push(notice);
    }
}

/// Pass the gate, ask one question, and report what was appended.
pub async fn ask_once(
    retrieval: RetrievalClient,
    mut gate: AccessGate,
    knowledge_base_id: &str,
    password: &str,
    question: &str,
) -> anyhow::Result<AskReport> {
    gate.login(password)?;
    let notices = Arc::new(CollectedNotices::default());
    let retrieval = retrieval.with_notice_sink(notices.clone());

    let mut conversation = Conversation::new(knowledge_base_id);
    conversation.begin()?;
    let outcome = conversation.ask(&retrieval, question).await?;
    info!("one-shot exchange finished (outcome={outcome:?})");

    let turns = conversation.turns().iter().skip(1).cloned().collect();
    conversation.end();
    gate.logout();
    Ok(AskReport {
        outcome,
        turns,
        notices: notices.0.lock().clone(),
    })
}
