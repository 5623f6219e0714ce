//! Rendering routines for the askdocs TUI.

use crate::app::{App, Screen};
use askdocs_rs_protocol::Notice;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};

// ── Theme colors (dark mode) ──────────────────────────────────────────

const PRIMARY: Color = Color::Rgb(236, 91, 43); // #EC5B2B
const SECONDARY: Color = Color::Rgb(238, 121, 72); // #EE7948
const TEXT: Color = Color::Rgb(238, 238, 238); // #eeeeee
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128); // #808080
const BORDER: Color = Color::Rgb(60, 60, 60); // #3c3c3c
const BORDER_ACTIVE: Color = Color::Rgb(238, 121, 72); // #EE7948
const YELLOW: Color = Color::Rgb(229, 192, 123); // #e5c07b
const ERROR: Color = Color::Rgb(255, 110, 110);

const HEADER_HEIGHT: u16 = 4;
const NOTICE_HEIGHT: u16 = 3;
const LOGIN_WIDTH: u16 = 52;
const LOGIN_HEIGHT: u16 = 8;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    match app.screen {
        Screen::Login => draw_login(frame, app),
        Screen::Chat => draw_chat_screen(frame, app),
    }
}

fn draw_login(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let [column] = Layout::horizontal([Constraint::Length(LOGIN_WIDTH)])
        .flex(Flex::Center)
        .areas(root[0]);
    let [dialog] = Layout::vertical([Constraint::Length(LOGIN_HEIGHT)])
        .flex(Flex::Center)
        .areas(column);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_ACTIVE))
        .title(Span::styled(
            format!(" {} ", app.title),
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(dialog);

    let masked = "*".repeat(app.password.chars().count());
    let mut lines = vec![
        Line::from(Span::styled(
            " Enter the access password to continue.",
            Style::default().fg(TEXT_MUTED),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Password ", Style::default().fg(TEXT_MUTED)),
            Span::styled(masked.clone(), Style::default().fg(TEXT)),
        ]),
        Line::from(""),
    ];
    if let Some(error) = &app.login_error {
        lines.push(Line::from(Span::styled(
            format!(" {error}"),
            Style::default().fg(ERROR),
        )));
    }

    frame.render_widget(block, dialog);
    frame.render_widget(Paragraph::new(lines), inner);
    frame.set_cursor_position((inner.x + 10 + masked.len() as u16, inner.y + 2));

    let shortcuts = vec![
        Span::styled(" Enter", Style::default().fg(TEXT_MUTED)),
        Span::styled(" login", Style::default().fg(BORDER)),
        Span::styled("  Ctrl+C/Esc", Style::default().fg(TEXT_MUTED)),
        Span::styled(" quit", Style::default().fg(BORDER)),
    ];
    frame.render_widget(Paragraph::new(Line::from(shortcuts)), root[1]);
}

fn draw_chat_screen(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();
    let notice_height = if app.notice.is_some() { NOTICE_HEIGHT } else { 0 };
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // header bar
            Constraint::Min(0),                // chat
            Constraint::Length(notice_height), // notice banner
            Constraint::Length(3),             // input
            Constraint::Length(1),             // status bar
        ])
        .split(area);

    draw_header(frame, app, root[0]);
    draw_chat(frame, app, root[1]);
    if let Some(active) = &app.notice {
        draw_notice(frame, &active.notice, root[2]);
    }
    draw_input(frame, app, root[3]);
    draw_status_bar(frame, app, root[4]);
}

fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let session = app.conversation.session().id().to_string();
    let session = &session[..8.min(session.len())];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER));
    let inner = block.inner(area);

    let label_style = Style::default().fg(TEXT_MUTED);
    let value_style = Style::default().fg(TEXT);
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {}", app.title),
                Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  v{VERSION}"), label_style),
        ]),
        Line::from(vec![
            Span::styled(" knowledge base ", label_style),
            Span::styled(app.conversation.knowledge_base_id(), value_style),
            Span::styled("  session ", label_style),
            Span::styled(session.to_string(), value_style),
        ]),
    ];

    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_chat(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let lines = app.render_lines();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" Chat ", Style::default().fg(TEXT_MUTED)));

    let inner = block.inner(area);
    let content_width = inner.width.saturating_sub(1); // -1 for scrollbar
    let content_height = inner.height as usize;

    // Wrapped line total as ratatui computes it.
    let total_lines = Paragraph::new(lines.clone())
        .wrap(Wrap { trim: false })
        .line_count(content_width)
        .max(1);

    let max_scroll = total_lines.saturating_sub(content_height) as u16;
    app.update_scroll_bounds(max_scroll);
    let scroll = app.scroll;

    let chat_inner = Rect {
        width: content_width,
        ..inner
    };
    let chat = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(block, area);
    frame.render_widget(chat, chat_inner);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(total_lines)
            .position(scroll as usize)
            .viewport_content_length(content_height);
        let scrollbar_area = Rect {
            x: inner.x + inner.width.saturating_sub(1),
            y: inner.y,
            width: 1,
            height: inner.height,
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(Style::default().fg(BORDER))
                .thumb_style(Style::default().fg(TEXT_MUTED)),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

fn draw_notice(frame: &mut Frame<'_>, notice: &Notice, area: Rect) {
    let color = match notice {
        Notice::TooManyRequests => YELLOW,
        Notice::Error(_) => ERROR,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));
    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!(" {notice}"),
        Style::default().fg(color),
    )))
    .block(block);
    frame.render_widget(paragraph, area);
}

fn draw_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let is_active = !app.is_retrieving();
    let border_color = if is_active { BORDER_ACTIVE } else { BORDER };
    let title = if is_active {
        " Question "
    } else {
        " Retrieving answer... "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            title,
            Style::default().fg(if is_active { SECONDARY } else { PRIMARY }),
        ));

    let inner = block.inner(area);

    let prompt_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);
    let input_text = if app.input.is_empty() && is_active {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(
                app.input_placeholder.as_str(),
                Style::default().fg(TEXT_MUTED),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(app.input.as_str(), Style::default().fg(TEXT)),
        ])
    };

    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(input_text), inner);

    if is_active {
        frame.set_cursor_position((inner.x + 1 + app.input.chars().count() as u16, inner.y));
    }
}

fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let status_color = match app.status.as_str() {
        "retrieving" => PRIMARY,
        "idle" => TEXT_MUTED,
        _ => YELLOW,
    };

    let shortcuts = vec![
        Span::styled(" Ctrl+C", Style::default().fg(TEXT_MUTED)),
        Span::styled(" quit", Style::default().fg(BORDER)),
        Span::styled("  Ctrl+L", Style::default().fg(TEXT_MUTED)),
        Span::styled(" logout", Style::default().fg(BORDER)),
        Span::styled("  Ctrl+K", Style::default().fg(TEXT_MUTED)),
        Span::styled(" clear session", Style::default().fg(BORDER)),
        Span::styled("  PgUp/PgDn", Style::default().fg(TEXT_MUTED)),
        Span::styled(" scroll", Style::default().fg(BORDER)),
    ];

    let right_text = format!(" {} ", app.status);
    let right_len = right_text.len() as u16;
    let left_area = Rect {
        width: area.width.saturating_sub(right_len),
        ..area
    };
    let right_area = Rect {
        x: area.x + area.width.saturating_sub(right_len),
        width: right_len.min(area.width),
        ..area
    };

    let left = Paragraph::new(Line::from(shortcuts));
    let right = Paragraph::new(Line::from(Span::styled(
        right_text,
        Style::default().fg(status_color),
    )));

    frame.render_widget(left, left_area);
    frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use askdocs_rs_core::{AccessGate, Conversation};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        App::new(
            AccessGate::new("hunter2"),
            Conversation::new("KB-UI"),
            "Knowledge Base Chat",
            "What can I try to answer?",
        )
    }

    #[test]
    fn login_screen_masks_password() {
        let mut app = app();
        app.password = "hunter".to_string();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).expect("terminal");
        terminal.draw(|frame| draw(frame, &mut app)).expect("draw");

        let text = screen_text(&terminal);
        assert!(text.contains("******"));
        assert!(!text.contains("hunter"));
    }

    #[test]
    fn chat_screen_shows_notice_banner() {
        let mut app = app();
        app.password = "hunter2".to_string();
        assert!(app.try_login());
        let session_id = app.conversation.session().id();
        app.show_notice(session_id, Notice::TooManyRequests);
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).expect("terminal");
        terminal.draw(|frame| draw(frame, &mut app)).expect("draw");

        let text = screen_text(&terminal);
        assert!(text.contains("KB-UI"));
        assert!(text.contains("Please try again later."));
    }
}
