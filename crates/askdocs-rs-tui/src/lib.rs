//! Library entry point for the askdocs TUI.
//!
//! Provides a reusable [`run`] function that launches the Ratatui terminal UI
//! against a pre-configured [`RetrievalClient`].

mod app;
mod client;
mod event;
mod notice_bus;
mod ui;

pub use notice_bus::{NoticeBus, SessionNotice};

use anyhow::{Context, anyhow};
use app::{App, Exchange, Screen};
use askdocs_rs_config::UiConfig;
use askdocs_rs_core::{AccessGate, Conversation, RetrievalClient, SecretsSource};
use client::AskClient;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEvent,
    KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use event::AppEvent;
use log::{debug, info};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

/// Configuration for a TUI session.
#[derive(Debug, Clone)]
pub struct TuiConfig {
    /// Title shown in the header and login dialog.
    pub title: String,
    /// Placeholder for the empty question box.
    pub input_placeholder: String,
}

impl TuiConfig {
    pub fn new(ui: &UiConfig) -> Self {
        Self {
            title: ui.title.clone(),
            input_placeholder: ui.input_placeholder.clone(),
        }
    }
}

/// Launch the askdocs TUI.
///
/// Secrets are fetched before the terminal is touched, and again after every
/// logout. The caller initializes logging (e.g. `env_logger`) before calling
/// `run`.
///
/// # Errors
/// Returns an error if the initial secrets fetch, terminal setup, or the
/// event loop fails.
pub async fn run(
    retrieval: RetrievalClient,
    notices: NoticeBus,
    secrets: SecretsSource,
    config: TuiConfig,
) -> anyhow::Result<()> {
    let initial = secrets
        .fetch()
        .with_context(|| format!("failed to fetch secret {}", secrets.secret_id()))?;
    let client = AskClient::new(retrieval, notices);
    let mut app = App::new(
        AccessGate::new(initial.access_password),
        Conversation::new(initial.knowledge_base_id),
        config.title,
        config.input_placeholder,
    )
    .with_secrets_source(secrets);

    let mut terminal = setup_terminal()?;
    let (tx, mut rx) = mpsc::channel(256);
    spawn_input_handler(tx.clone());
    spawn_tick(tx.clone());
    spawn_notice_stream(client.clone(), tx.clone());

    let result = async {
        loop {
            terminal.draw(|frame| ui::draw(frame, &mut app))?;
            let event = rx
                .recv()
                .await
                .ok_or_else(|| anyhow!("event channel closed unexpectedly"))?;
            if handle_app_event(event, &client, &mut app, tx.clone()) {
                break;
            }
        }
        anyhow::Ok(())
    }
    .await;

    restore_terminal(&mut terminal)?;
    result
}

/// Dispatch a UI event and return true when the app should exit.
fn handle_app_event(
    event: AppEvent,
    client: &AskClient,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> bool {
    match event {
        AppEvent::Input(key) => handle_input(key, client, app, sender),
        AppEvent::Retrieved { session_id, result } => {
            app.apply_result(session_id, result);
            false
        }
        AppEvent::Notice { session_id, notice } => {
            app.show_notice(session_id, notice);
            false
        }
        AppEvent::Scroll(delta) => {
            if delta < 0 {
                app.scroll_up(delta.unsigned_abs());
            } else if delta > 0 {
                app.scroll_down(delta as u16);
            }
            false
        }
        AppEvent::Tick => {
            app.tick();
            false
        }
    }
}

/// Handle keyboard input and dispatch actions.
fn handle_input(
    key: KeyEvent,
    client: &AskClient,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }
    if key.code == KeyCode::Esc {
        return true;
    }
    match app.screen {
        Screen::Login => handle_login_input(key, app),
        Screen::Chat => handle_chat_input(key, client, app, sender),
    }
    false
}

/// Handle keyboard input on the password screen.
fn handle_login_input(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Enter => {
            app.try_login();
        }
        KeyCode::Backspace => {
            app.password.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.password.push(ch);
        }
        _ => {}
    }
}

/// Handle keyboard input on the chat screen.
fn handle_chat_input(
    key: KeyEvent,
    client: &AskClient,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('l') if ctrl => app.logout(),
        KeyCode::Char('k') if ctrl => app.clear_session(),
        KeyCode::PageUp => app.scroll_up(5),
        KeyCode::PageDown => app.scroll_down(5),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.enable_auto_scroll(),
        KeyCode::Enter => {
            if let Some(exchange) = app.submit_input() {
                spawn_retrieval(client.clone(), exchange, sender);
            }
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(ch) if !ctrl => app.input.push(ch),
        _ => {}
    }
}

/// Spawn a task that runs one retrieval and reports the result.
fn spawn_retrieval(client: AskClient, exchange: Exchange, sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let Exchange {
            session_id,
            request,
        } = exchange;
        let result = client.answer(session_id, request).await;
        debug!("retrieval finished (failed={})", result.is_failed());
        let _ = sender
            .send(AppEvent::Retrieved { session_id, result })
            .await;
    });
}

/// Spawn a task forwarding notices from the bus into the event loop.
fn spawn_notice_stream(client: AskClient, sender: mpsc::Sender<AppEvent>) {
    info!("starting notice stream");
    tokio::spawn(async move {
        client.stream_notices(sender).await;
    });
}

/// Spawn a task to poll for input events.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        const MOUSE_SCROLL_LINES: i16 = 3;
        loop {
            if matches!(crossterm::event::poll(Duration::from_millis(30)), Ok(true)) {
                while matches!(crossterm::event::poll(Duration::from_millis(0)), Ok(true)) {
                    let event = match crossterm::event::read() {
                        Ok(event) => event,
                        Err(_) => break,
                    };
                    match event {
                        CrosstermEvent::Key(key) => {
                            let _ = sender.send(AppEvent::Input(key)).await;
                        }
                        CrosstermEvent::Mouse(mouse) => match mouse.kind {
                            MouseEventKind::ScrollUp => {
                                let _ = sender.send(AppEvent::Scroll(-MOUSE_SCROLL_LINES)).await;
                            }
                            MouseEventKind::ScrollDown => {
                                let _ = sender.send(AppEvent::Scroll(MOUSE_SCROLL_LINES)).await;
                            }
                            _ => {}
                        },
                        _ => {}
                    }
                }
            }
            if sender.is_closed() {
                break;
            }
        }
    });
}

/// Spawn a periodic tick event generator.
fn spawn_tick(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            if sender.send(AppEvent::Tick).await.is_err() {
                break;
            }
        }
    });
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
