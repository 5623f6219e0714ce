//! Shared data types for askdocs: transcript turns, retrieval requests and
//! results, user notices, and the sink interfaces used by the retrieval client.

mod error;

pub use error::KnowledgeBaseError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a conversation session.
pub type SessionId = Uuid;

/// Label prefixed to citation turns.
pub const CITATION_LABEL: &str = "Source Document: ";
/// Text of the marker turn appended when an answer has no citations.
pub const NO_CONTEXT_MARKER: &str = "No Context";

/// Speaker role for a transcript turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User-authored question.
    User,
    /// Assistant answer or citation note.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// What a turn represents, so renderers can style it without parsing text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// A question typed by the user.
    Question,
    /// The generated answer.
    Answer,
    /// One source document backing the answer.
    Citation,
    /// Marker shown when the answer carried no citations.
    NoContext,
}

/// Single immutable entry in a transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    /// Role that produced the turn.
    pub role: Role,
    /// Kind of turn.
    pub kind: TurnKind,
    /// Display text, including the citation label for citation turns.
    pub text: String,
    /// Timestamp when the turn was appended.
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    fn new(role: Role, kind: TurnKind, text: String) -> Self {
        Self {
            role,
            kind,
            text,
            created_at: Utc::now(),
        }
    }

    /// Build a user question turn.
    pub fn question(text: impl Into<String>) -> Self {
        Self::new(Role::User, TurnKind::Question, text.into())
    }

    /// Build an assistant answer turn.
    pub fn answer(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, TurnKind::Answer, text.into())
    }

    /// Build an assistant citation turn for a source URL.
    pub fn citation(url: &str) -> Self {
        Self::new(
            Role::Assistant,
            TurnKind::Citation,
            format!("{CITATION_LABEL}{url}"),
        )
    }

    /// Build the assistant "no context" marker turn.
    pub fn no_context() -> Self {
        Self::new(
            Role::Assistant,
            TurnKind::NoContext,
            NO_CONTEXT_MARKER.to_string(),
        )
    }
}

/// Question addressed to a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrievalRequest {
    /// Question text as typed by the user.
    pub question_text: String,
    /// Opaque knowledge-base identifier.
    pub knowledge_base_id: String,
}

/// Reference to a source document supporting an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitationRef {
    /// Location of the source document.
    pub source_url: String,
}

impl CitationRef {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
        }
    }
}

/// Answer payload returned by a successful remote call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    /// Generated answer text.
    pub answer_text: String,
    /// Ordered citations; empty when the service returned none.
    pub citations: Vec<CitationRef>,
}

/// Outcome of a retrieval: a full answer or the empty failure marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum RetrievalResult {
    /// The service produced an answer.
    Answered(Answer),
    /// The call failed or was throttled past the retry bound.
    Failed,
}

impl RetrievalResult {
    /// Return the answer when present.
    pub fn answer(&self) -> Option<&Answer> {
        match self {
            RetrievalResult::Answered(answer) => Some(answer),
            RetrievalResult::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RetrievalResult::Failed)
    }
}

impl From<Answer> for RetrievalResult {
    fn from(answer: Answer) -> Self {
        RetrievalResult::Answered(answer)
    }
}

/// User-visible notice raised by the retrieval client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum Notice {
    /// Every attempt was throttled.
    TooManyRequests,
    /// A non-throttling failure, with its description.
    Error(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TooManyRequests => {
                write!(f, "We’re receiving too many requests. Please try again later.")
            }
            Notice::Error(description) => write!(f, "Error retrieving answer: {description}"),
        }
    }
}

/// Result of a single remote attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The call returned an answer.
    Success,
    /// The call was rate limited.
    Throttled,
    /// The call failed for another reason.
    Failed,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Throttled => "throttled",
            AttemptOutcome::Failed => "failed",
        }
    }
}

/// Structured record emitted once per remote attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 1-based attempt index.
    pub attempt: u32,
    /// Configured attempt bound.
    pub max_attempts: u32,
    /// Outcome of this attempt.
    pub outcome: AttemptOutcome,
}

/// Sink for user-visible notices.
pub trait NoticeSink: Send + Sync {
    /// Surface a notice to the user.
    fn notify(&self, notice: Notice);
}

/// Sink for per-attempt log records.
pub trait AttemptSink: Send + Sync {
    /// Record one attempt.
    fn record(&self, record: AttemptRecord);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn citation_turn_carries_label_and_url() {
        let turn = ConversationTurn::citation("https://wiki.example.com/page/42");
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.kind, TurnKind::Citation);
        assert_eq!(turn.text, "Source Document: https://wiki.example.com/page/42");
    }

    #[test]
    fn notices_render_user_facing_text() {
        assert_eq!(
            Notice::TooManyRequests.to_string(),
            "We’re receiving too many requests. Please try again later."
        );
        assert_eq!(
            Notice::Error("access denied".to_string()).to_string(),
            "Error retrieving answer: access denied"
        );
    }

    #[test]
    fn retrieval_result_serializes_with_tag() {
        let result = RetrievalResult::Answered(Answer {
            answer_text: "42".to_string(),
            citations: vec![CitationRef::new("https://docs.example.com/a")],
        });
        let encoded = serde_json::to_value(&result).expect("serialize");
        assert_eq!(encoded["type"], "answered");
        assert_eq!(
            encoded["payload"]["citations"][0]["source_url"],
            "https://docs.example.com/a"
        );
        let failed = serde_json::to_value(RetrievalResult::Failed).expect("serialize");
        assert_eq!(failed["type"], "failed");
    }

    #[test]
    fn throttled_errors_are_flagged() {
        assert!(KnowledgeBaseError::Throttled("slow down".to_string()).is_throttled());
        assert!(!KnowledgeBaseError::Other("boom".to_string()).is_throttled());
    }
}
