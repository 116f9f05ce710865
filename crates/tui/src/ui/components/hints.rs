use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// A keyboard hint consisting of a key and its action.
#[derive(Debug, Clone)]
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

pub const BROWSE: &[KeyHint] = &[
    KeyHint::new("n/p", "página"),
    KeyHint::new("r", "recarregar"),
    KeyHint::new("/", "filtros"),
    KeyHint::new("1-4", "períodos"),
    KeyHint::new("s/o", "ordem"),
    KeyHint::new("c", "limpar"),
    KeyHint::new("l", "ledger"),
];

pub const EXPORT: &[KeyHint] = &[
    KeyHint::new("x", "csv local"),
    KeyHint::new("e/E", "csv servidor"),
    KeyHint::new("m", "formato"),
];

pub const SESSION: &[KeyHint] = &[
    KeyHint::new("t", "renovar"),
    KeyHint::new("i", "id"),
    KeyHint::new("L", "sair"),
    KeyHint::new("q", "fechar"),
];

pub const FORM: &[KeyHint] = &[
    KeyHint::new("Tab", "próximo"),
    KeyHint::new("Enter", "aplicar"),
    KeyHint::new("Esc", "cancelar"),
];

pub const LOGIN: &[KeyHint] = &[
    KeyHint::new("Tab", "próximo"),
    KeyHint::new("Enter", "entrar"),
    KeyHint::new("Ctrl+D", "login dev"),
    KeyHint::new("Ctrl+C", "sair"),
];
