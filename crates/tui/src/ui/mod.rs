pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{Frame, style::Style, widgets::Block};

use crate::app::{AppState, Screen};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let theme = Theme::default();
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background).fg(theme.text)),
        area,
    );

    match state.screen {
        Screen::Login => screens::login::render(frame, area, state, &theme),
        Screen::Dashboard => screens::dashboard::render(frame, area, state, &theme),
    }
    components::banner::render(frame, area, state.banner.as_ref(), &theme);
}
