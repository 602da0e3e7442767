use api_types::transaction::TransactionType;
use ratatui::{
    Frame,
    layout::{Alignment, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};

use crate::{
    pages::form::{DetailState, Field, FormMode, FormPage},
    ui::theme::Theme,
};

pub fn render(frame: &mut Frame<'_>, area: Rect, form: &FormPage, theme: &Theme) {
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", form.title()),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match form.detail() {
        DetailState::Loading => frame.render_widget(
            Paragraph::new("Loading transaction…")
                .style(Style::default().fg(theme.text_muted))
                .alignment(Alignment::Center),
            inner,
        ),
        DetailState::Failed(message) => render_failure(frame, inner, message, theme),
        DetailState::Ready => render_fields(frame, inner, form, theme),
    }
}

fn render_failure(frame: &mut Frame<'_>, area: Rect, message: &str, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled(
            "Error Loading Transaction",
            Style::default()
                .fg(theme.error)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(message.to_string(), Style::default().fg(theme.text))),
        Line::from(""),
        Line::from(vec![
            Span::styled("Esc", Style::default().fg(theme.accent)),
            Span::raw(" back to list"),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_fields(frame: &mut Frame<'_>, area: Rect, form: &FormPage, theme: &Theme) {
    let mut lines = Vec::new();

    if let FormMode::Edit { transaction_id } = form.mode() {
        lines.push(label_line("Transaction ID", false, theme));
        lines.push(Line::from(Span::styled(
            transaction_id.clone(),
            Style::default().fg(theme.text_muted),
        )));
        lines.push(Line::from(""));
    }

    for field in Field::ALL {
        let focused = field == form.focus() && !form.is_submitting();
        lines.push(label_line(field.label(), focused, theme));
        lines.push(value_line(form, field, focused, theme));
        match form.errors().get(&field) {
            Some(error) => lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(theme.error),
            ))),
            None => lines.push(Line::from("")),
        }
    }

    let action = match form.mode() {
        FormMode::Create => "Create Transaction",
        FormMode::Edit { .. } => "Update Transaction",
    };
    lines.push(if form.is_submitting() {
        Line::from(Span::styled("Saving…", Style::default().fg(theme.text_muted)))
    } else {
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(theme.accent)),
            Span::raw(format!(" {action}")),
        ])
    });

    let padded = area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), padded);
}

fn label_line(label: &'static str, focused: bool, theme: &Theme) -> Line<'static> {
    let style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.text_muted)
    };
    Line::from(Span::styled(label, style))
}

fn value_line(form: &FormPage, field: Field, focused: bool, theme: &Theme) -> Line<'static> {
    let fields = form.fields();
    if field == Field::TransactionType {
        let options = TransactionType::selectable()
            .into_iter()
            .map(|option| {
                let chosen = option == fields.transaction_type;
                let text = if chosen {
                    format!("[{}]", option.name().to_uppercase())
                } else {
                    format!(" {} ", option.name().to_uppercase())
                };
                let style = if chosen {
                    Style::default().fg(theme.type_tag(option))
                } else {
                    Style::default().fg(theme.text_muted)
                };
                Span::styled(text, style)
            })
            .collect::<Vec<_>>();
        return Line::from(options);
    }

    let value = match field {
        Field::AccountNumber => &fields.account_number,
        Field::CounterpartyAccount => &fields.counterparty_account,
        Field::Amount => &fields.amount,
        Field::Description | Field::TransactionType => &fields.description,
    };
    let cursor = if focused { "│" } else { "" };
    let text = match field {
        Field::Amount if !value.is_empty() => format!("$ {value}{cursor}"),
        _ => format!("{value}{cursor}"),
    };
    Line::from(Span::styled(text, Style::default().fg(theme.text)))
}
