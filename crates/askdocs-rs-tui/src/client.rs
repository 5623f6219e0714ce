//! Retrieval client wrapper used by the TUI event loop.

use crate::event::AppEvent;
use crate::notice_bus::NoticeBus;
use askdocs_rs_core::RetrievalClient;
use askdocs_rs_protocol::{RetrievalRequest, RetrievalResult, SessionId};
use log::{debug, info, warn};
use tokio::sync::{broadcast, mpsc};

/// Pairs the retrieval client with the bus its notices land on.
#[derive(Clone)]
pub struct AskClient {
    retrieval: RetrievalClient,
    notices: NoticeBus,
}

impl AskClient {
    pub fn new(retrieval: RetrievalClient, notices: NoticeBus) -> Self {
        Self { retrieval, notices }
    }

    /// Run one retrieval to completion, tagging its notices with `session_id`.
    pub async fn answer(&self, session_id: SessionId, request: RetrievalRequest) -> RetrievalResult {
        info!(
            "asking knowledge base (session_id={}, knowledge_base_id={}, question_len={})",
            session_id,
            request.knowledge_base_id,
            request.question_text.len()
        );
        self.retrieval
            .clone()
            .with_notice_sink(self.notices.sink_for(session_id))
            .retrieve(&request.question_text, &request.knowledge_base_id)
            .await
    }

    /// Forward notices into the UI channel until either side closes.
    pub async fn stream_notices(&self, sender: mpsc::Sender<AppEvent>) {
        let mut receiver = self.notices.subscribe();
        loop {
            match receiver.recv().await {
                Ok(stamped) => {
                    let event = AppEvent::Notice {
                        session_id: stamped.session_id,
                        notice: stamped.notice,
                    };
                    if sender.send(event).await.is_err() {
                        debug!("ui channel closed; stopping notice stream");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("notice stream lagged (skipped={skipped})");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
