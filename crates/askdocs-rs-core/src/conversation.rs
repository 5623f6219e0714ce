//! Per-exchange state machine layered over a `Session`.

use crate::error::ConversationError;
use crate::retrieval::RetrievalClient;
use crate::session::Session;
use askdocs_rs_protocol::{ConversationTurn, RetrievalRequest, RetrievalResult, SessionId};
use log::{debug, info};

/// Where the current exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Not logged in, or the session was ended.
    Idle,
    /// Ready for the next question.
    AwaitingQuestion,
    /// A question is in flight.
    Retrieving,
}

impl ExchangeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeState::Idle => "idle",
            ExchangeState::AwaitingQuestion => "awaiting question",
            ExchangeState::Retrieving => "retrieving",
        }
    }
}

/// How a completed exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Answered,
    Failed,
}

/// Conversation controller: the only writer of its transcript.
#[derive(Debug, Clone)]
pub struct Conversation {
    session: Session,
    knowledge_base_id: String,
    state: ExchangeState,
}

impl Conversation {
    pub fn new(knowledge_base_id: impl Into<String>) -> Self {
        Self {
            session: Session::new(),
            knowledge_base_id: knowledge_base_id.into(),
            state: ExchangeState::Idle,
        }
    }

    pub fn knowledge_base_id(&self) -> &str {
        &self.knowledge_base_id
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        self.session.all_turns()
    }

    /// Open the conversation once the access gate has been passed.
    pub fn begin(&mut self) -> Result<(), ConversationError> {
        match self.state {
            ExchangeState::Idle => {
                info!("conversation started (session_id={})", self.session.id());
                self.state = ExchangeState::AwaitingQuestion;
                Ok(())
            }
            ExchangeState::AwaitingQuestion => Ok(()),
            ExchangeState::Retrieving => Err(self.invalid("begin")),
        }
    }

    /// Record the question and hand back the request to send.
    pub fn submit(&mut self, question: &str) -> Result<RetrievalRequest, ConversationError> {
        match self.state {
            ExchangeState::AwaitingQuestion => {}
            ExchangeState::Retrieving => return Err(ConversationError::InFlight),
            ExchangeState::Idle => return Err(self.invalid("submit a question")),
        }
        if question.trim().is_empty() {
            return Err(ConversationError::EmptyQuestion);
        }
        self.session.append_user_turn(question);
        self.state = ExchangeState::Retrieving;
        Ok(RetrievalRequest {
            question_text: question.to_string(),
            knowledge_base_id: self.knowledge_base_id.clone(),
        })
    }

    /// Fold a retrieval result into the transcript.
    ///
    /// A failed result adds no turns; the notice already told the user.
    pub fn complete(
        &mut self,
        result: RetrievalResult,
    ) -> Result<ExchangeOutcome, ConversationError> {
        if self.state != ExchangeState::Retrieving {
            return Err(self.invalid("complete an exchange"));
        }
        self.state = ExchangeState::AwaitingQuestion;
        match result {
            RetrievalResult::Answered(answer) => {
                self.session.append_assistant_answer(answer.answer_text);
                if answer.citations.is_empty() {
                    self.session.append_no_context_marker();
                } else {
                    for citation in &answer.citations {
                        self.session.append_citation(&citation.source_url);
                    }
                }
                Ok(ExchangeOutcome::Answered)
            }
            RetrievalResult::Failed => {
                debug!("exchange failed; transcript unchanged");
                Ok(ExchangeOutcome::Failed)
            }
        }
    }

    /// Like [`Conversation::complete`], but only for a result raised by the
    /// current session. Results from a session ended by logout are refused
    /// and leave the transcript and state untouched.
    pub fn complete_for(
        &mut self,
        session_id: SessionId,
        result: RetrievalResult,
    ) -> Result<ExchangeOutcome, ConversationError> {
        if session_id != self.session.id() {
            return Err(ConversationError::StaleResult { session_id });
        }
        self.complete(result)
    }

    /// Submit, retrieve, and complete in one call.
    pub async fn ask(
        &mut self,
        client: &RetrievalClient,
        question: &str,
    ) -> Result<ExchangeOutcome, ConversationError> {
        let request = self.submit(question)?;
        let result = client
            .retrieve(&request.question_text, &request.knowledge_base_id)
            .await;
        self.complete(result)
    }

    /// Clear the transcript ("Clear Session").
    pub fn clear(&mut self) -> Result<(), ConversationError> {
        if self.state == ExchangeState::Retrieving {
            return Err(self.invalid("clear the session"));
        }
        self.session.clear();
        Ok(())
    }

    /// End the session on logout; the transcript is discarded.
    pub fn end(&mut self) {
        info!(
            "conversation ended (session_id={}, turns={})",
            self.session.id(),
            self.session.len()
        );
        self.session = Session::new();
        self.state = ExchangeState::Idle;
    }

    fn invalid(&self, operation: &'static str) -> ConversationError {
        ConversationError::InvalidState {
            operation,
            state: self.state.as_str(),
        }
    }
}
