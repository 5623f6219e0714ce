//! TUI event types for input, retrieval results, and notices.

use askdocs_rs_protocol::{Notice, RetrievalResult, SessionId};
use crossterm::event::KeyEvent;

/// Application event emitted by input handlers or background tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// Periodic tick event.
    Tick,
    /// A spawned retrieval finished.
    Retrieved {
        session_id: SessionId,
        result: RetrievalResult,
    },
    /// Notice raised by the retrieval client.
    Notice {
        session_id: SessionId,
        notice: Notice,
    },
    /// Scroll event in the chat view.
    Scroll(i16),
}
