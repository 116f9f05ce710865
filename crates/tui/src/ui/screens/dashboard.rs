use chrono_tz::Tz;
use engine::{FilterState, TotalsSummary, normalize::parse_timestamp, token};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table},
};

use crate::{
    app::{AppState, FilterField, FilterForm, Mode, csv_style_label, wallet_balance},
    ui::{
        components::{hints, money},
        theme::Theme,
    },
};

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Length(3), // Filters
            Constraint::Min(0),    // Rows
            Constraint::Length(1), // Totals
            Constraint::Length(1), // Pagination
            Constraint::Length(1), // Hints
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, theme);
    render_filters(frame, layout[1], state, theme);
    render_table(frame, layout[2], state, theme);
    render_totals(frame, layout[3], &state.statement.totals, theme);

    let page = &state.statement.page;
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("Pág. {} de {}", page.page, page.total_pages),
            Style::default().fg(theme.text_muted),
        )),
        layout[4],
    );
    render_hints(frame, layout[5], state, theme);

    if let Mode::EditFilters(form) = &state.mode {
        render_filter_form(frame, area, form, theme);
    }
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let (status, status_color) = match state.healthy {
        Some(true) => ("OK", theme.positive),
        Some(false) => ("ERR", theme.error),
        None => ("?", theme.text_muted),
    };
    let ledger = state.ledger_id.as_deref().unwrap_or("-");

    let mut spans = vec![
        Span::styled("API", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", state.base_url)),
        Span::styled(status, Style::default().fg(status_color)),
        Span::raw("  "),
        Span::styled("Ledger", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {ledger}  ")),
    ];

    if let Some(wallet) = state.selected_wallet() {
        if let Some(owner) = &wallet.user_id {
            spans.push(Span::styled("User", Style::default().fg(theme.text_muted)));
            spans.push(Span::raw(format!(": {owner}  ")));
        }
        if let Some(balance) = wallet.saldo.as_ref().and_then(wallet_balance) {
            spans.push(Span::styled("Saldo", Style::default().fg(theme.text_muted)));
            spans.push(Span::raw(": "));
            spans.push(money::styled_total(balance, theme));
            spans.push(Span::raw("  "));
        }
    }

    let now = token::now_ms();
    if let Some(minutes) = state.session.ttl_minutes(now) {
        let color = if state.session.is_expiring(now) {
            theme.error
        } else {
            theme.text
        };
        spans.push(Span::styled("Token", Style::default().fg(theme.text_muted)));
        spans.push(Span::styled(
            format!(": expira em {minutes} min"),
            Style::default().fg(color),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_filters(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut spans = vec![
        Span::raw(filter_summary(&state.filters)),
        Span::styled("   CSV", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}", csv_style_label(state.csv_style))),
    ];
    if state.loading {
        spans.push(Span::styled(
            "   carregando...",
            Style::default().fg(theme.warning),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(" Extrato ");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_table(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let show_id = state.ui_flags.show_id;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    if state.statement.is_empty() {
        let message = if state.loading {
            "Carregando..."
        } else {
            "Nenhum lançamento para os filtros atuais."
        };
        frame.render_widget(
            Paragraph::new(Span::styled(message, Style::default().fg(theme.text_muted)))
                .block(block),
            area,
        );
        return;
    }

    let mut header = Vec::new();
    let mut widths = Vec::new();
    if show_id {
        header.push("ID");
        widths.push(Constraint::Length(8));
    }
    header.extend(["Data", "Tipo", "Valor", "Descrição"]);
    widths.extend([
        Constraint::Length(17),
        Constraint::Length(8),
        Constraint::Length(16),
        Constraint::Min(10),
    ]);

    let rows = state.statement.rows.iter().map(|row| {
        let mut cells = Vec::with_capacity(5);
        if show_id {
            cells.push(Cell::from(row.id.clone()));
        }
        cells.push(Cell::from(format_timestamp(&row.timestamp, state.timezone)));
        cells.push(Cell::from(row.kind_label().to_string()));
        cells.push(Cell::from(money::row_amount(row, theme)));
        cells.push(Cell::from(row.description.clone()));
        Row::new(cells)
    });

    let table = Table::new(rows, widths)
        .header(
            Row::new(header)
                .style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        )
        .column_spacing(2)
        .block(block);
    frame.render_widget(table, area);
}

fn render_totals(frame: &mut Frame<'_>, area: Rect, totals: &TotalsSummary, theme: &Theme) {
    let label = |text: &'static str| Span::styled(text, Style::default().fg(theme.text_muted));
    let mut spans = vec![
        label("Créditos: "),
        money::styled_total(totals.credit, theme),
        label("   Débitos: "),
        money::styled_total(-totals.debit, theme),
        label("   Saldo: "),
        money::styled_total(totals.balance, theme),
        label("   Lançamentos: "),
        Span::raw(totals.count.to_string()),
    ];
    if totals.is_partial() {
        spans.push(label(" (página)"));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_hints(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let spans = match state.mode {
        Mode::EditFilters(_) => hints::hints_to_spans(hints::FORM, theme),
        Mode::Browse => {
            let mut spans = hints::hints_to_spans(hints::BROWSE, theme);
            for group in [hints::EXPORT, hints::SESSION] {
                spans.push(hints::hint_separator(theme));
                spans.extend(hints::hints_to_spans(group, theme));
            }
            spans
        }
    };
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_filter_form(frame: &mut Frame<'_>, area: Rect, form: &FilterForm, theme: &Theme) {
    let width = 48.min(area.width);
    let height = 8.min(area.height);
    let rect = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, rect);

    let mut lines: Vec<Line<'_>> = [
        FilterField::Start,
        FilterField::End,
        FilterField::Kind,
        FilterField::PageSize,
    ]
    .into_iter()
    .map(|field| {
        let focused = form.focus == field;
        let style = if focused {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.text)
        };
        let cursor = if focused { "│" } else { "" };
        Line::from(vec![
            Span::styled(
                format!("{:<12}", field.label()),
                Style::default().fg(theme.text_muted),
            ),
            Span::styled(format!("{}{cursor}", form.field(field)), style),
        ])
    })
    .collect();

    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(theme.error),
        )));
    }

    let block = Block::default()
        .title(" Filtros ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent));
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

/// Date column text: local time when the value parses, the raw text otherwise.
fn format_timestamp(raw: &str, tz: Tz) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.with_timezone(&tz).format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn filter_summary(filters: &FilterState) -> String {
    let bound = |value: &str| {
        if value.is_empty() {
            "…".to_string()
        } else {
            value.to_string()
        }
    };
    let kind = if filters.kind.is_empty() {
        "TODOS"
    } else {
        filters.kind.as_str()
    };
    format!(
        "Período: {} a {}   Tipo: {kind}   Ordem: {} {}   Por página: {}",
        bound(&filters.start),
        bound(&filters.end),
        filters.sort_field,
        filters.sort_dir.as_str(),
        filters.page_size,
    )
}
