use engine::{MoneyCents, NormalizedRow};
use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

use crate::ui::theme::Theme;

/// Amount in BRL, green for credits and red for debits.
///
/// Rows without a known kind fall back to the sign of the amount.
#[must_use]
pub fn row_amount(row: &NormalizedRow, theme: &Theme) -> Span<'static> {
    let color = if row.is_credit() {
        theme.positive
    } else if row.is_debit() {
        theme.negative
    } else {
        sign_color(row.amount, theme)
    };
    Span::styled(row.amount.format_brl(), Style::default().fg(color))
}

/// Bold amount colored by sign, for the totals line.
#[must_use]
pub fn styled_total(amount: MoneyCents, theme: &Theme) -> Span<'static> {
    Span::styled(
        amount.format_brl(),
        Style::default()
            .fg(sign_color(amount, theme))
            .add_modifier(Modifier::BOLD),
    )
}

fn sign_color(amount: MoneyCents, theme: &Theme) -> ratatui::style::Color {
    if amount.is_positive() {
        theme.positive
    } else if amount.is_negative() {
        theme.negative
    } else {
        theme.text
    }
}
