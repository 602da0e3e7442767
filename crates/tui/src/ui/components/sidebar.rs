use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::{app::NavItem, ui::theme::Theme};

pub const WIDTH: u16 = 24;

/// Navigation sidebar. Edit mode highlights "New Transaction".
pub fn render(frame: &mut Frame<'_>, area: Rect, active: NavItem, theme: &Theme) {
    let lines = NavItem::ALL
        .iter()
        .map(|item| {
            let shortcut = Span::styled(
                format!(" {:<3}", item.shortcut()),
                Style::default().fg(theme.text_muted),
            );
            let label = if *item == active {
                Span::styled(
                    format!("▌{}", item.label()),
                    Style::default()
                        .fg(theme.accent)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!(" {}", item.label()), Style::default().fg(theme.text))
            };
            Line::from(vec![shortcut, label])
        })
        .collect::<Vec<_>>();

    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(" txdesk ", Style::default().fg(theme.accent)));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
