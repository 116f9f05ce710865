use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    DevLogin,
    Cancel,
    NextField,
    Submit,
    Backspace,
    Input(char),
    None,
}

/// Letters are passed through as input; each screen decides what they mean.
pub fn map_key(key: KeyEvent) -> AppAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => AppAction::Quit,
            KeyCode::Char('d') => AppAction::DevLogin,
            _ => AppAction::None,
        };
    }

    match key.code {
        KeyCode::Esc => AppAction::Cancel,
        KeyCode::Tab => AppAction::NextField,
        KeyCode::Enter => AppAction::Submit,
        KeyCode::Backspace => AppAction::Backspace,
        KeyCode::Char(ch) => AppAction::Input(ch),
        _ => AppAction::None,
    }
}

/// Dashboard keys that start a network request.
pub fn is_fetch_key(ch: char) -> bool {
    matches!(
        ch,
        'n' | 'p' | 'r' | 's' | 'o' | '1' | '2' | '3' | '4' | 'c' | 'l' | 'e' | 'E' | 't'
    )
}
