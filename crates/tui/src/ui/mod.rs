pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::AppState,
    pages::{form::DetailState, list::LoadState},
};
use components::hints::{self, KeyHint};
use theme::Theme;

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let theme = Theme::default();
    let area = frame.area();

    // Info bar, body, bottom bar
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(components::sidebar::WIDTH),
            Constraint::Min(0),
        ])
        .split(rows[1]);

    render_info_bar(frame, rows[0], state, &theme);
    components::sidebar::render(frame, columns[0], state.active_nav(), &theme);
    match &state.form {
        Some(form) => screens::form::render(frame, columns[1], form, &theme),
        None => screens::transactions::render(frame, columns[1], &state.list, &theme),
    }
    render_bottom_bar(frame, rows[2], state, &theme);
    components::toast::render(frame, area, state.toast.as_ref(), &theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let line = Line::from(vec![
        Span::styled("Backend", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}", state.base_url)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut parts = hints::hints_to_spans(
        &[KeyHint::new("F1", "list"), KeyHint::new("F2", "new")],
        theme,
    );
    parts.push(hints::hint_separator(theme));
    parts.extend(hints::hints_to_spans(context_hints(state), theme));
    parts.push(hints::hint_separator(theme));
    parts.extend(hints::hints_to_spans(hints::GLOBAL, theme));
    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

fn context_hints(state: &AppState) -> &'static [KeyHint] {
    match &state.form {
        Some(form) if matches!(form.detail(), DetailState::Failed(_)) => hints::FORM_FAILED,
        Some(_) => hints::FORM,
        None if state.list.confirming().is_some() => hints::CONFIRM_DELETE,
        None if matches!(state.list.load_state(), LoadState::Failed(_)) => hints::LIST_FAILED,
        None => hints::LIST,
    }
}

/// Fixed-size rect centred in `area`.
pub fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1])[1]
}
