use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
};

use crate::{
    pages::list::{ListPage, LoadState},
    ui::{centered_box, theme::Theme},
};

const COLUMNS: [(&str, Constraint); 7] = [
    ("ID", Constraint::Length(6)),
    ("Transaction ID", Constraint::Length(18)),
    ("Account Number", Constraint::Length(21)),
    ("Amount", Constraint::Length(12)),
    ("Type", Constraint::Length(9)),
    ("Description", Constraint::Min(12)),
    ("Created At", Constraint::Length(19)),
];

pub fn render(frame: &mut Frame<'_>, area: Rect, list: &ListPage, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    render_header(frame, layout[0], list, theme);
    match list.load_state() {
        LoadState::Failed(message) => render_failure(frame, layout[1], message, theme),
        LoadState::Loading if list.page().is_none() => {
            frame.render_widget(
                Paragraph::new("Loading transactions…")
                    .style(Style::default().fg(theme.text_muted))
                    .alignment(Alignment::Center),
                layout[1],
            );
        }
        _ => render_table(frame, layout[1], list, theme),
    }

    if let Some(transaction_id) = list.confirming() {
        render_confirm(frame, area, transaction_id, theme);
    }
}

fn render_header(frame: &mut Frame<'_>, area: Rect, list: &ListPage, theme: &Theme) {
    let query = list.query();
    let pages = list.page().map_or(0, |page| page.total_pages);
    let mut spans = vec![
        Span::styled(
            "Transactions",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(list.summary(), Style::default().fg(theme.text)),
        Span::styled(
            format!("  page {}/{}  size {}", query.page + 1, pages.max(1), query.size),
            Style::default().fg(theme.text_muted),
        ),
    ];
    if list.load_state() == &LoadState::Loading {
        spans.push(Span::styled("  loading…", Style::default().fg(theme.text_muted)));
    }
    if let Some(transaction_id) = list.deleting() {
        spans.push(Span::styled(
            format!("  deleting {transaction_id}…"),
            Style::default().fg(theme.error),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(frame: &mut Frame<'_>, area: Rect, list: &ListPage, theme: &Theme) {
    let rows = list
        .rows()
        .into_iter()
        .map(|row| {
            let pending = list.deleting() == Some(row.transaction_id.as_str());
            let style = if pending {
                Style::default().fg(theme.text_muted)
            } else {
                Style::default().fg(theme.text)
            };
            Row::new(vec![
                Cell::from(row.id),
                Cell::from(row.transaction_id),
                Cell::from(row.account),
                Cell::from(Line::from(row.amount).alignment(Alignment::Right)),
                Cell::from(Span::styled(
                    row.transaction_type.name(),
                    Style::default().fg(theme.type_tag(row.transaction_type)),
                )),
                Cell::from(row.description),
                Cell::from(row.created_at),
            ])
            .style(style)
        })
        .collect::<Vec<_>>();

    let header = Row::new(COLUMNS.iter().map(|(title, _)| *title))
        .style(Style::default().fg(theme.text_muted));
    let empty = rows.is_empty();
    let table = Table::new(rows, COLUMNS.iter().map(|(_, width)| *width))
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        )
        .row_highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    let mut state = TableState::default();
    if !empty {
        state.select(Some(list.selected()));
    }
    frame.render_stateful_widget(table, area, &mut state);

    if empty {
        let inner = Rect {
            y: area.y + area.height / 2,
            height: 1,
            ..area
        };
        frame.render_widget(
            Paragraph::new("No transactions")
                .style(Style::default().fg(theme.text_muted))
                .alignment(Alignment::Center),
            inner,
        );
    }
}

fn render_failure(frame: &mut Frame<'_>, area: Rect, message: &str, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled(
            "Error Loading Transactions",
            Style::default()
                .fg(theme.error)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(message.to_string(), Style::default().fg(theme.text))),
        Line::from(""),
        Line::from(vec![
            Span::styled("r", Style::default().fg(theme.accent)),
            Span::raw(" retry"),
        ]),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.error));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_confirm(frame: &mut Frame<'_>, area: Rect, transaction_id: &str, theme: &Theme) {
    let popup = centered_box(52, 5, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(" delete ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.error));
    let lines = vec![
        Line::from(format!("Delete transaction {transaction_id}?")),
        Line::from(vec![
            Span::styled("y", Style::default().fg(theme.accent)),
            Span::raw(" delete  "),
            Span::styled("n", Style::default().fg(theme.accent)),
            Span::raw(" keep"),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        popup,
    );
}
