//! Answer retrieval with bounded retry on throttling.
//!
//! `RetrievalClient` wraps a single `KnowledgeBase` call. Throttled attempts
//! are retried after a fixed delay up to the configured bound; any other
//! failure ends the exchange immediately. Failures never escape as errors:
//! callers get `RetrievalResult::Failed` and the user gets a `Notice`.

use askdocs_rs_config::RetryConfig;
use askdocs_rs_protocol::{
    Answer, AttemptOutcome, AttemptRecord, AttemptSink, KnowledgeBaseError, Notice, NoticeSink,
    RetrievalRequest, RetrievalResult,
};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Remote "ask a knowledge base a question" call.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Perform exactly one remote call.
    async fn retrieve_and_generate(
        &self,
        request: &RetrievalRequest,
    ) -> Result<Answer, KnowledgeBaseError>;
}

/// Attempt bound and fixed inter-attempt delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call. Values below 1 act as 1.
    pub max_attempts: u32,
    /// Wait between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.delay(),
        }
    }
}

/// Attempt sink that writes one log record per attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAttemptSink;

impl AttemptSink for LogAttemptSink {
    fn record(&self, record: AttemptRecord) {
        match record.outcome {
            AttemptOutcome::Success => info!(
                "retrieval attempt (attempt={}/{}, outcome={})",
                record.attempt,
                record.max_attempts,
                record.outcome.as_str()
            ),
            AttemptOutcome::Throttled | AttemptOutcome::Failed => warn!(
                "retrieval attempt (attempt={}/{}, outcome={})",
                record.attempt,
                record.max_attempts,
                record.outcome.as_str()
            ),
        }
    }
}

/// Notice sink used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNoticeSink;

impl NoticeSink for LogNoticeSink {
    fn notify(&self, notice: Notice) {
        warn!("{notice}");
    }
}

/// Retrieval client shared by the UI and CLI.
#[derive(Clone)]
pub struct RetrievalClient {
    backend: Arc<dyn KnowledgeBase>,
    policy: RetryPolicy,
    notices: Arc<dyn NoticeSink>,
    attempts: Arc<dyn AttemptSink>,
}

impl RetrievalClient {
    /// Create a client that logs notices and attempts.
    pub fn new(backend: Arc<dyn KnowledgeBase>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            notices: Arc::new(LogNoticeSink),
            attempts: Arc::new(LogAttemptSink),
        }
    }

    /// Route user-visible notices to a different sink.
    pub fn with_notice_sink(mut self, notices: Arc<dyn NoticeSink>) -> Self {
        self.notices = notices;
        self
    }

    /// Route attempt records to a different sink.
    pub fn with_attempt_sink(mut self, attempts: Arc<dyn AttemptSink>) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Ask the knowledge base a question.
    pub async fn retrieve(&self, question_text: &str, knowledge_base_id: &str) -> RetrievalResult {
        if question_text.trim().is_empty() {
            return self.reject("question must not be empty");
        }
        if knowledge_base_id.trim().is_empty() {
            return self.reject("knowledge base id must not be empty");
        }

        let request = RetrievalRequest {
            question_text: question_text.to_string(),
            knowledge_base_id: knowledge_base_id.to_string(),
        };
        let max_attempts = self.policy.max_attempts.max(1);
        debug!(
            "retrieving answer (knowledge_base_id={}, question_len={}, max_attempts={})",
            request.knowledge_base_id,
            request.question_text.len(),
            max_attempts
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.backend.retrieve_and_generate(&request).await {
                Ok(answer) => {
                    self.record(attempt, max_attempts, AttemptOutcome::Success);
                    debug!(
                        "answer received (attempt={}, citations={})",
                        attempt,
                        answer.citations.len()
                    );
                    return RetrievalResult::Answered(answer);
                }
                Err(err) if err.is_throttled() => {
                    self.record(attempt, max_attempts, AttemptOutcome::Throttled);
                    if attempt >= max_attempts {
                        warn!("retrieval throttled on every attempt (attempts={attempt})");
                        self.notices.notify(Notice::TooManyRequests);
                        return RetrievalResult::Failed;
                    }
                }
                Err(err) => {
                    self.record(attempt, max_attempts, AttemptOutcome::Failed);
                    error!("retrieval failed (attempt={attempt}): {err}");
                    self.notices.notify(Notice::Error(err.to_string()));
                    return RetrievalResult::Failed;
                }
            }
            tokio::time::sleep(self.policy.delay).await;
        }
    }

    fn record(&self, attempt: u32, max_attempts: u32, outcome: AttemptOutcome) {
        self.attempts.record(AttemptRecord {
            attempt,
            max_attempts,
            outcome,
        });
    }

    fn reject(&self, description: &str) -> RetrievalResult {
        warn!("retrieval rejected before any remote call: {description}");
        self.notices.notify(Notice::Error(description.to_string()));
        RetrievalResult::Failed
    }
}
