use askdocs_rs_core::KnowledgeBase;
use askdocs_rs_protocol::{Answer, CitationRef, KnowledgeBaseError, RetrievalRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Knowledge base that replays a fixed script of outcomes.
///
/// Once the script runs out every call returns `Other("script exhausted")`.
#[derive(Default)]
pub struct ScriptedKnowledgeBase {
    script: Mutex<VecDeque<Result<Answer, KnowledgeBaseError>>>,
    requests: Mutex<Vec<RetrievalRequest>>,
}

impl ScriptedKnowledgeBase {
    pub fn new(script: Vec<Result<Answer, KnowledgeBaseError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer once with the given text and citation URLs.
    pub fn answering(text: &str, urls: &[&str]) -> Self {
        Self::new(vec![Ok(answer(text, urls))])
    }

    /// Throttle on every call for `times` calls.
    pub fn throttling(times: usize) -> Self {
        Self::new((0..times).map(|_| Err(throttled())).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<RetrievalRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl KnowledgeBase for ScriptedKnowledgeBase {
    async fn retrieve_and_generate(
        &self,
        request: &RetrievalRequest,
    ) -> Result<Answer, KnowledgeBaseError> {
        self.requests.lock().push(request.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(KnowledgeBaseError::Other("script exhausted".to_string())))
    }
}

/// Build an answer with citation URLs.
pub fn answer(text: &str, urls: &[&str]) -> Answer {
    Answer {
        answer_text: text.to_string(),
        citations: urls.iter().map(|url| CitationRef::new(*url)).collect(),
    }
}

/// A throttling error.
pub fn throttled() -> KnowledgeBaseError {
    KnowledgeBaseError::Throttled("Rate exceeded".to_string())
}
