//! Application state for the askdocs TUI.

use askdocs_rs_core::{AccessGate, Conversation, ExchangeOutcome, ExchangeState, SecretsSource};
use askdocs_rs_protocol::{Notice, RetrievalRequest, RetrievalResult, Role, SessionId, TurnKind};
use log::{debug, info, warn};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::cmp::min;

/// Ticks a notice banner stays visible (250ms per tick).
const NOTICE_TICKS: u16 = 20;

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chat,
}

/// Notice currently shown in the banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNotice {
    pub notice: Notice,
    pub ticks_left: u16,
}

/// A submitted question and the session that asked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub session_id: SessionId,
    pub request: RetrievalRequest,
}

/// Top-level application state for the TUI.
pub struct App {
    /// Window title shown in the header.
    pub title: String,
    /// Placeholder shown in an empty question box.
    pub input_placeholder: String,
    pub screen: Screen,
    pub gate: AccessGate,
    pub conversation: Conversation,
    /// Masked password buffer on the login screen.
    pub password: String,
    /// Gate rejection message, if the last login failed.
    pub login_error: Option<String>,
    /// Question being typed.
    pub input: String,
    /// Status line text.
    pub status: String,
    pub notice: Option<ActiveNotice>,
    /// Current scroll offset.
    pub scroll: u16,
    /// Whether to auto-scroll to the bottom.
    pub auto_scroll: bool,
    /// Maximum scroll offset for the chat view.
    pub chat_max_scroll: u16,
    /// Fetched again on logout so rotated secrets apply at the next login.
    secrets: Option<SecretsSource>,
}

impl App {
    pub fn new(
        gate: AccessGate,
        conversation: Conversation,
        title: impl Into<String>,
        input_placeholder: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            input_placeholder: input_placeholder.into(),
            screen: Screen::Login,
            gate,
            conversation,
            password: String::new(),
            login_error: None,
            input: String::new(),
            status: "locked".to_string(),
            notice: None,
            scroll: 0,
            auto_scroll: true,
            chat_max_scroll: 0,
            secrets: None,
        }
    }

    pub fn with_secrets_source(mut self, secrets: SecretsSource) -> Self {
        self.secrets = Some(secrets);
        self
    }

    pub fn push_status(&mut self, status: impl Into<String>) {
        let status = status.into();
        debug!("status updated: {status}");
        self.status = status;
    }

    /// Check the typed password and open the chat on success.
    pub fn try_login(&mut self) -> bool {
        let password = std::mem::take(&mut self.password);
        match self.gate.login(&password) {
            Ok(()) => {
                self.login_error = None;
                if let Err(err) = self.conversation.begin() {
                    self.push_status(err.to_string());
                    return false;
                }
                self.screen = Screen::Chat;
                self.push_status("idle");
                true
            }
            Err(err) => {
                self.login_error = Some(err.to_string());
                false
            }
        }
    }

    /// Log out and discard the transcript.
    pub fn logout(&mut self) {
        info!("logout requested");
        self.gate.logout();
        self.conversation.end();
        self.refresh_secrets();
        self.screen = Screen::Login;
        self.password.clear();
        self.input.clear();
        self.notice = None;
        self.login_error = None;
        self.reset_scroll();
        self.push_status("locked");
    }

    /// Re-read the password and knowledge-base id; keeps the old ones on error.
    fn refresh_secrets(&mut self) {
        let Some(source) = &self.secrets else {
            return;
        };
        match source.fetch() {
            Ok(secrets) => {
                debug!("secrets refreshed (secret_id={})", source.secret_id());
                self.gate = AccessGate::new(secrets.access_password);
                self.conversation = Conversation::new(secrets.knowledge_base_id);
            }
            Err(err) => warn!("keeping previous secrets; refresh failed: {err}"),
        }
    }

    /// Clear the transcript, keeping the user logged in.
    pub fn clear_session(&mut self) {
        match self.conversation.clear() {
            Ok(()) => {
                self.reset_scroll();
                self.push_status("session cleared");
            }
            Err(err) => self.push_status(err.to_string()),
        }
    }

    pub fn is_retrieving(&self) -> bool {
        self.conversation.state() == ExchangeState::Retrieving
    }

    /// Turn the input line into a request, or explain why not.
    pub fn submit_input(&mut self) -> Option<Exchange> {
        if self.input.trim().is_empty() {
            return None;
        }
        match self.conversation.submit(&self.input) {
            Ok(request) => {
                self.input.clear();
                self.notice = None;
                self.enable_auto_scroll();
                self.push_status("retrieving");
                Some(Exchange {
                    session_id: self.conversation.session().id(),
                    request,
                })
            }
            Err(err) => {
                self.push_status(err.to_string());
                None
            }
        }
    }

    /// Fold a finished retrieval into the transcript.
    pub fn apply_result(&mut self, session_id: SessionId, result: RetrievalResult) {
        match self.conversation.complete_for(session_id, result) {
            Ok(ExchangeOutcome::Answered) => {
                self.enable_auto_scroll();
                self.push_status("idle");
            }
            Ok(ExchangeOutcome::Failed) => self.push_status("idle"),
            // Arrives after logout ended the session that asked.
            Err(err) => debug!("dropping retrieval result: {err}"),
        }
    }

    pub fn show_notice(&mut self, session_id: SessionId, notice: Notice) {
        if self.screen != Screen::Chat || session_id != self.conversation.session().id() {
            debug!("dropping notice from another session: {notice}");
            return;
        }
        self.notice = Some(ActiveNotice {
            notice,
            ticks_left: NOTICE_TICKS,
        });
    }

    /// Age the notice banner by one tick.
    pub fn tick(&mut self) {
        if let Some(active) = self.notice.as_mut() {
            active.ticks_left = active.ticks_left.saturating_sub(1);
            if active.ticks_left == 0 {
                self.notice = None;
            }
        }
    }

    /// Scroll the chat view upward by a number of lines.
    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Scroll the chat view downward by a number of lines.
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = min(self.scroll.saturating_add(lines), self.chat_max_scroll);
        if self.scroll >= self.chat_max_scroll {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll = 0;
    }

    pub fn enable_auto_scroll(&mut self) {
        self.auto_scroll = true;
        self.scroll = self.chat_max_scroll;
    }

    /// Update scroll bounds after layout changes.
    ///
    /// Snaps to the new bottom only when auto-scroll is on or the view was
    /// already pinned to the bottom.
    pub fn update_scroll_bounds(&mut self, max_scroll: u16) {
        let was_at_bottom = self.scroll >= self.chat_max_scroll;
        self.chat_max_scroll = max_scroll;
        if self.auto_scroll || was_at_bottom {
            self.scroll = max_scroll;
            self.auto_scroll = true;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }
    }

    fn reset_scroll(&mut self) {
        self.scroll = 0;
        self.chat_max_scroll = 0;
        self.auto_scroll = true;
    }

    /// Render the whole transcript into styled lines.
    pub fn render_lines(&self) -> Vec<Line<'static>> {
        let turns = self.conversation.turns();
        let mut lines = Vec::new();

        if turns.is_empty() {
            lines.push(Line::from(Span::styled(
                " No questions yet. Type one below to start.",
                Style::default().fg(Color::Rgb(128, 128, 128)),
            )));
            return lines;
        }

        for (idx, turn) in turns.iter().enumerate() {
            // Citation notes hang under the answer without their own badge.
            let continues_answer = matches!(turn.kind, TurnKind::Citation | TurnKind::NoContext)
                && idx > 0
                && turns[idx - 1].role == Role::Assistant;
            if !continues_answer {
                if idx > 0 {
                    lines.push(Line::from(Span::raw("")));
                }
                let (badge, style) = match turn.role {
                    Role::User => (" you ", badge_style(Color::Rgb(107, 161, 230))),
                    Role::Assistant => (" assistant ", badge_style(Color::Rgb(238, 121, 72))),
                };
                lines.push(Line::from(vec![Span::styled(badge, style)]));
            }

            let content_style = match turn.kind {
                TurnKind::Question | TurnKind::Answer => {
                    Style::default().fg(Color::Rgb(238, 238, 238))
                }
                TurnKind::Citation => Style::default().fg(citation_color()),
                TurnKind::NoContext => Style::default().fg(no_context_color()),
            };
            for line in turn.text.lines() {
                lines.push(Line::from(Span::styled(format!(" {line}"), content_style)));
            }
        }

        // Trailing padding so the last turn scrolls fully into view.
        lines.push(Line::from(Span::raw("")));

        lines
    }
}

fn badge_style(bg: Color) -> Style {
    Style::default()
        .fg(Color::Rgb(10, 10, 10))
        .bg(bg)
        .add_modifier(Modifier::BOLD)
}

fn citation_color() -> Color {
    Color::Rgb(255, 218, 51)
}

fn no_context_color() -> Color {
    Color::Rgb(255, 110, 110)
}
