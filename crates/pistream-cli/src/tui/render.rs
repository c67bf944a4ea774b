//! Main view rendering
//!
//! Pure mapping from client state to widgets. Nothing here mutates state,
//! so the whole screen can be rendered against a `TestBackend`.

use std::time::Duration;

use pistream_core::display::{format_circumference, progress_label, split_pi};
use pistream_core::{StreamMachine, StreamState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::tui::themes::Theme;

/// Spinner frames shown while connecting
const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Radius note shown under the circumference card title
const RADIUS_NOTE: &str = "Using the calculated π and the Sun's radius (695,700 km).";

/// Everything one frame needs
pub struct ViewModel<'a> {
    pub machine: &'a StreamMachine,
    pub theme: &'a Theme,
    pub endpoint: &'a str,
    /// Time until an automatic reconnect, if one is scheduled
    pub reconnect_in: Option<Duration>,
    /// Automatic reconnect ran out of attempts
    pub reconnect_exhausted: bool,
    /// A subscription is currently held
    pub connected: bool,
    /// Animation frame counter
    pub tick: usize,
}

/// Render the whole screen
pub fn draw(f: &mut Frame, view: &ViewModel) {
    let theme = view.theme;
    let bg = Block::default().style(Style::default().bg(theme.bg_color));
    f.render_widget(bg, f.area());

    let show_error = view.machine.state() == StreamState::Error;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                                // Header
            Constraint::Length(if show_error { 4 } else { 0 }),  // Error banner
            Constraint::Length(4),                                // Progress
            Constraint::Min(5),                                   // Pi card
            Constraint::Length(6),                                // Circumference card
            Constraint::Length(1),                                // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], view);
    if show_error {
        render_error_banner(f, chunks[1], view);
    }
    render_progress(f, chunks[2], view);
    render_pi_card(f, chunks[3], view);
    render_circumference_card(f, chunks[4], view);
    render_footer(f, chunks[5], view);
}

fn card(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border_color))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(theme.title_color)
                .add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(theme.card_bg_color))
}

/// Status badge text, including the spinner while connecting
pub fn status_badge(state: StreamState, tick: usize) -> String {
    let icon = match state {
        StreamState::Connecting => SPINNER[tick % SPINNER.len()],
        StreamState::Active => "▶",
        StreamState::Error => "✗",
        StreamState::Complete => "✓",
        StreamState::Idle => "●",
    };
    format!(" {} {} ", icon, state.label())
}

fn render_header(f: &mut Frame, area: Rect, view: &ViewModel) {
    let theme = view.theme;
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(theme.border_color));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let state = view.machine.state();
    let badge = status_badge(state, view.tick);
    let hint = " [r] Reconnect ";
    let right_width = (badge.width() + hint.width()) as u16;

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(right_width)])
        .split(inner);

    let title = Line::from(vec![
        Span::styled(
            " π ",
            Style::default()
                .fg(theme.logo_secondary_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Pi Streamer",
            Style::default()
                .fg(theme.logo_primary_color)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(title), cols[0]);

    let status = Line::from(vec![
        Span::styled(
            badge,
            Style::default()
                .fg(theme.bg_color)
                .bg(theme.status_color(state))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(hint, Style::default().fg(theme.accent_color)),
    ]);
    f.render_widget(Paragraph::new(status).alignment(Alignment::Right), cols[1]);
}

fn render_error_banner(f: &mut Frame, area: Rect, view: &ViewModel) {
    let theme = view.theme;
    let message = view
        .machine
        .error()
        .map(|e| e.message.as_str())
        .unwrap_or_default();

    let mut lines = vec![
        Line::from(Span::styled(
            "Connection Error:",
            Style::default()
                .fg(theme.text_color)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(message, Style::default().fg(theme.text_color))),
    ];

    if let Some(remaining) = view.reconnect_in {
        lines[1].spans.push(Span::styled(
            format!("  Retrying in {:.1}s", remaining.as_secs_f32()),
            Style::default().fg(theme.dim_color),
        ));
    } else if view.reconnect_exhausted {
        lines[1].spans.push(Span::styled(
            "  Automatic retries exhausted; press r to reconnect",
            Style::default().fg(theme.dim_color),
        ));
    }

    let block = Block::default()
        .borders(Borders::LEFT)
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(theme.error_color))
        .style(Style::default().bg(theme.error_bg_color));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_progress(f: &mut Frame, area: Rect, view: &ViewModel) {
    let theme = view.theme;
    let machine = view.machine;
    let block = card("Calculation Progress", theme);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let gauge = Gauge::default()
        .gauge_style(
            Style::default()
                .fg(theme.progress_color)
                .bg(theme.progress_track_color),
        )
        .ratio(machine.progress())
        .label(Span::styled(
            progress_label(machine.precision(), machine.target_precision()),
            Style::default()
                .fg(theme.text_color)
                .add_modifier(Modifier::BOLD),
        ));
    f.render_widget(gauge, inner);
}

/// Styled spans for π: integer part, computed digits, then padding
pub fn pi_spans(pi: &str, target_precision: usize, theme: &Theme) -> Vec<Span<'static>> {
    let parts = split_pi(pi, target_precision);
    vec![
        Span::styled(
            parts.integer,
            Style::default()
                .fg(theme.pi_integer_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(parts.computed, Style::default().fg(theme.pi_computed_color)),
        Span::styled(parts.padding, Style::default().fg(theme.pi_padding_color)),
    ]
}

fn render_pi_card(f: &mut Frame, area: Rect, view: &ViewModel) {
    let theme = view.theme;
    let block = card("π Pi Value", theme);
    let spans = pi_spans(
        view.machine.pi(),
        view.machine.target_precision(),
        theme,
    );
    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .style(Style::default().bg(theme.code_bg_color))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_circumference_card(f: &mut Frame, area: Rect, view: &ViewModel) {
    let theme = view.theme;
    let block = card("Circumference of the Sun", theme);
    let lines = vec![
        Line::from(Span::styled(RADIUS_NOTE, Style::default().fg(theme.dim_color))),
        Line::default(),
        Line::from(Span::styled(
            format!("{} km", format_circumference(view.machine.circumference())),
            Style::default()
                .fg(theme.circumference_color)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

/// Footer note for a stream the server dropped before completion
fn paused_note(view: &ViewModel) -> Option<String> {
    let state = view.machine.state();
    if view.connected || !matches!(state, StreamState::Active | StreamState::Connecting) {
        return None;
    }
    Some(match view.reconnect_in {
        Some(remaining) => format!(" Stream dropped, reconnecting in {:.1}s ", remaining.as_secs_f32()),
        None => " Stream dropped, press r to resume ".to_string(),
    })
}

fn render_footer(f: &mut Frame, area: Rect, view: &ViewModel) {
    let theme = view.theme;
    let mut spans = Vec::new();
    if let Some(note) = paused_note(view) {
        spans.push(Span::styled(
            note,
            Style::default()
                .fg(theme.bg_color)
                .bg(theme.connecting_color),
        ));
    }
    spans.extend([
        Span::styled(" r", Style::default().fg(theme.accent_color)),
        Span::styled(" reconnect  ", Style::default().fg(theme.dim_color)),
        Span::styled("q", Style::default().fg(theme.accent_color)),
        Span::styled(" quit  ", Style::default().fg(theme.dim_color)),
        Span::styled(view.endpoint.to_string(), Style::default().fg(theme.dim_color)),
    ]);
    let line = Line::from(spans);
    let footer = Paragraph::new(line).style(Style::default().bg(theme.status_bar_bg_color));
    f.render_widget(footer, area);
}
