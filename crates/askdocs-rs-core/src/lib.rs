//! Core primitives for askdocs.
//!
//! This crate owns the retrieval client and its retry policy, the
//! conversation transcript and exchange state machine, the access gate,
//! secrets providers, and the HTTP knowledge-base backend.

pub mod conversation;
pub mod error;
pub mod gate;
pub mod http;
pub mod retrieval;
pub mod secrets;
pub mod session;

pub use conversation::{Conversation, ExchangeOutcome, ExchangeState};
pub use error::{ConversationError, GateError, SecretsError};
pub use gate::{AccessGate, AuthState};
pub use http::HttpKnowledgeBase;
/// Retrieval client facade and default sinks.
pub use retrieval::{KnowledgeBase, LogAttemptSink, LogNoticeSink, RetrievalClient, RetryPolicy};
pub use secrets::{
    AppSecrets, EnvSecretsProvider, FileSecretsProvider, SecretsProvider, SecretsSource,
    provider_from_config,
};
pub use session::Session;
