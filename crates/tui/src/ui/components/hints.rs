use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// A key and what it does on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHint {
    pub key: &'static str,
    pub action: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(theme.accent)));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }
    spans
}

pub fn hint_separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}

pub const LIST: &[KeyHint] = &[
    KeyHint::new("↑↓", "select"),
    KeyHint::new("←→", "page"),
    KeyHint::new("s", "page size"),
    KeyHint::new("Enter", "edit"),
    KeyHint::new("d", "delete"),
    KeyHint::new("a", "new"),
    KeyHint::new("r", "refresh"),
];

pub const LIST_FAILED: &[KeyHint] = &[KeyHint::new("r", "retry"), KeyHint::new("a", "new")];

pub const CONFIRM_DELETE: &[KeyHint] = &[KeyHint::new("y", "delete"), KeyHint::new("n", "keep")];

pub const FORM: &[KeyHint] = &[
    KeyHint::new("Tab", "next"),
    KeyHint::new("Space", "type"),
    KeyHint::new("Enter", "save"),
    KeyHint::new("Esc", "cancel"),
];

pub const FORM_FAILED: &[KeyHint] = &[KeyHint::new("Esc", "back to list")];

pub const GLOBAL: &[KeyHint] = &[KeyHint::new("Ctrl+C", "quit")];
