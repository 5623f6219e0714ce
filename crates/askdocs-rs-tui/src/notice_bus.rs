//! Broadcast bus carrying retrieval notices into the TUI.

use askdocs_rs_protocol::{Notice, NoticeSink, SessionId};
use log::debug;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A notice stamped with the session whose question raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionNotice {
    pub session_id: SessionId,
    pub notice: Notice,
}

/// Broadcast channel of session-stamped notices.
#[derive(Clone, Debug)]
pub struct NoticeBus {
    sender: broadcast::Sender<SessionNotice>,
}

impl NoticeBus {
    /// Create a new bus with the given channel buffer size.
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer);
        debug!("tui notice bus initialized (buffer={})", buffer);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.sender.subscribe()
    }

    /// Notice sink for retrievals issued by `session_id`.
    pub fn sink_for(&self, session_id: SessionId) -> Arc<dyn NoticeSink> {
        Arc::new(SessionNoticeSink {
            session_id,
            sender: self.sender.clone(),
        })
    }
}

struct SessionNoticeSink {
    session_id: SessionId,
    sender: broadcast::Sender<SessionNotice>,
}

impl NoticeSink for SessionNoticeSink {
    fn notify(&self, notice: Notice) {
        // No subscriber means no UI is attached yet.
        let _ = self.sender.send(SessionNotice {
            session_id: self.session_id,
            notice,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use askdocs_rs_core::Session;

    #[tokio::test]
    async fn notices_carry_the_raising_session() {
        let bus = NoticeBus::new(8);
        let mut rx = bus.subscribe();
        let session_id = Session::new().id();
        bus.sink_for(session_id).notify(Notice::TooManyRequests);
        assert_eq!(
            rx.recv().await.expect("notice"),
            SessionNotice {
                session_id,
                notice: Notice::TooManyRequests,
            }
        );
    }
}
