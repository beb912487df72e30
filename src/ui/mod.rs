mod detail;
pub mod highlight;
mod intake;
mod status_bar;
mod styles;
mod summary;
mod utils;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::widgets::Block;
use ratatui::Frame;

use crate::app::{App, Screen};
use highlight::Highlighter;

/// Render the entire UI
pub fn draw(f: &mut Frame, app: &App, hl: &Highlighter) {
    f.render_widget(Block::default().style(styles::default_style()), f.area());

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // top bar
            Constraint::Min(1),    // main content
            Constraint::Length(1), // bottom bar
        ])
        .split(f.area());

    status_bar::render_top_bar(f, outer[0], app);

    match app.screen() {
        Screen::Intake => intake::render(f, outer[1], app),
        Screen::Summary => summary::render(f, outer[1], app, hl),
        Screen::Detail => detail::render(f, outer[1], app),
    }

    status_bar::render_bottom_bar(f, outer[2], app);

    // Notification overlay
    if let Some(ref msg) = app.notice {
        status_bar::render_notice(f, f.area(), msg);
    }
}
