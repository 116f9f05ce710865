use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::{
    app::{Banner, BannerLevel},
    ui::theme::Theme,
};

/// Bottom-right notice; it disappears once [`crate::app::BANNER_TTL`] elapses.
pub fn render(frame: &mut Frame<'_>, area: Rect, banner: Option<&Banner>, theme: &Theme) {
    let Some(banner) = banner else {
        return;
    };
    let width = (banner.message.chars().count() + 4).min(area.width as usize) as u16;
    let height = 3u16;
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width),
        y: area
            .y
            .saturating_add(area.height.saturating_sub(height + 1)),
        width,
        height: height.min(area.height),
    };

    let style = Style::default().fg(level_color(banner.level, theme));
    let block = Block::default().borders(Borders::ALL).border_style(style);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(Line::from(banner.message.as_str()))
            .style(style)
            .block(block),
        rect,
    );
}

fn level_color(level: BannerLevel, theme: &Theme) -> ratatui::style::Color {
    match level {
        BannerLevel::Info => theme.text,
        BannerLevel::Success => theme.positive,
        BannerLevel::Error => theme.error,
    }
}
