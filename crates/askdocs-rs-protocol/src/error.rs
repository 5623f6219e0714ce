/// Errors returned by a knowledge-base backend for a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KnowledgeBaseError {
    /// The remote service asked the caller to back off.
    #[error("throttled: {0}")]
    Throttled(String),
    /// Any other failure (transport, auth, validation, decoding).
    #[error("{0}")]
    Other(String),
}

impl KnowledgeBaseError {
    /// Whether this failure is a rate-limiting signal worth retrying.
    pub fn is_throttled(&self) -> bool {
        matches!(self, KnowledgeBaseError::Throttled(_))
    }
}
