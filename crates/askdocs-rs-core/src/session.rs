//! Append-only conversation transcript.

use askdocs_rs_protocol::{ConversationTurn, SessionId};
use chrono::{DateTime, Utc};
use log::debug;
use uuid::Uuid;

/// Transcript owned by one chat session.
///
/// Turns are immutable once appended and are replayed in insertion order on
/// every render.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    turns: Vec<ConversationTurn>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn append_user_turn(&mut self, text: impl Into<String>) {
        self.push(ConversationTurn::question(text));
    }

    pub fn append_assistant_answer(&mut self, text: impl Into<String>) {
        self.push(ConversationTurn::answer(text));
    }

    /// Append a "Source Document" note for one citation.
    pub fn append_citation(&mut self, url: &str) {
        self.push(ConversationTurn::citation(url));
    }

    pub fn append_no_context_marker(&mut self) {
        self.push(ConversationTurn::no_context());
    }

    /// Drop every turn. Calling this on an empty transcript is a no-op.
    pub fn clear(&mut self) {
        debug!(
            "clearing transcript (session_id={}, turns={})",
            self.id,
            self.turns.len()
        );
        self.turns.clear();
    }

    /// All turns in display order.
    pub fn all_turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn push(&mut self, turn: ConversationTurn) {
        debug!(
            "appending turn (session_id={}, role={}, text_len={})",
            self.id,
            turn.role.as_str(),
            turn.text.len()
        );
        self.turns.push(turn);
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use askdocs_rs_protocol::{Role, TurnKind};
    use pretty_assertions::assert_eq;

    fn kinds(session: &Session) -> Vec<(Role, TurnKind)> {
        session
            .all_turns()
            .iter()
            .map(|turn| (turn.role, turn.kind))
            .collect()
    }

    #[test]
    fn answer_without_citations_yields_three_turns() {
        let mut session = Session::new();
        session.append_user_turn("What is the VPN address?");
        session.append_assistant_answer("vpn.example.com");
        session.append_no_context_marker();

        assert_eq!(
            kinds(&session),
            vec![
                (Role::User, TurnKind::Question),
                (Role::Assistant, TurnKind::Answer),
                (Role::Assistant, TurnKind::NoContext),
            ]
        );
        assert_eq!(session.all_turns()[2].text, "No Context");
    }

    #[test]
    fn answer_with_two_citations_yields_four_turns() {
        let mut session = Session::new();
        session.append_user_turn("Where is the style guide?");
        session.append_assistant_answer("In the handbook.");
        session.append_citation("https://wiki.example.com/a");
        session.append_citation("https://wiki.example.com/b");

        let texts: Vec<&str> = session
            .all_turns()
            .iter()
            .map(|turn| turn.text.as_str())
            .collect();
        assert_eq!(
            texts,
            vec![
                "Where is the style guide?",
                "In the handbook.",
                "Source Document: https://wiki.example.com/a",
                "Source Document: https://wiki.example.com/b",
            ]
        );
    }

    #[test]
    fn clear_empties_transcript_and_is_idempotent() {
        let mut session = Session::new();
        for idx in 0..5 {
            session.append_user_turn(format!("question {idx}"));
        }
        let id = session.id();
        session.clear();
        assert!(session.is_empty());
        session.clear();
        assert_eq!(session.len(), 0);
        assert_eq!(session.id(), id);
    }
}
