use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    app::{AppState, LoginField},
    ui::{components::hints, theme::Theme},
};

const LABEL_WIDTH: u16 = 9;

fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
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

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let card_area = centered_box(56.min(area.width), 9.min(area.height), area);
    frame.render_widget(Clear, card_area);

    let block = Block::default()
        .title(" extrato ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(card_area);
    frame.render_widget(block, card_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .margin(1)
        .split(inner);

    let login = &state.login;
    let fields = [
        (rows[0], "URL", login.base_url.as_str(), LoginField::BaseUrl),
        (rows[2], "Usuário", login.username.as_str(), LoginField::Username),
        (rows[4], "Senha", login.password.as_str(), LoginField::Password),
    ];
    for (row, label, value, field) in fields {
        let focused = login.focus == field;
        render_input(frame, row, label, value, field == LoginField::Password, focused, theme);
    }

    let below = |offset: u16| Rect {
        x: area.x,
        y: (card_area.y + card_area.height + offset).min(area.bottom().saturating_sub(1)),
        width: area.width,
        height: 1,
    };

    if let Some(message) = &login.message {
        frame.render_widget(
            Paragraph::new(Span::styled(message.as_str(), Style::default().fg(theme.error)))
                .alignment(Alignment::Center),
            below(1),
        );
    }
    frame.render_widget(
        Paragraph::new(Line::from(hints::hints_to_spans(hints::LOGIN, theme)))
            .alignment(Alignment::Center),
        below(3),
    );
}

fn render_input(
    frame: &mut Frame<'_>,
    area: Rect,
    label: &str,
    value: &str,
    is_password: bool,
    focused: bool,
    theme: &Theme,
) {
    let cursor = if focused { "│" } else { "" };
    let shown = if is_password {
        mask_password(value)
    } else {
        value.to_string()
    };
    let style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.text_muted)
    };

    let line = Line::from(vec![
        Span::styled(
            format!("{label:<width$}", width = LABEL_WIDTH as usize),
            Style::default().fg(theme.text_muted),
        ),
        Span::styled(format!("{shown}{cursor}"), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// One bullet per character.
fn mask_password(password: &str) -> String {
    "•".repeat(password.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_mask_counts_chars() {
        assert_eq!(mask_password(""), "");
        assert_eq!(mask_password("sé"), "••");
    }
}
