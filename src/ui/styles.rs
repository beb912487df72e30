use ratatui::style::{Color, Modifier, Style};

use crate::review::issues::Category;

// ── Background colors ──
pub const BG: Color = Color::Rgb(12, 12, 12);
pub const SURFACE: Color = Color::Rgb(20, 20, 20);
pub const PANEL: Color = Color::Rgb(26, 26, 26);
pub const BORDER: Color = Color::Rgb(42, 42, 42);

// ── Text colors ──
pub const TEXT: Color = Color::Rgb(200, 200, 200);
pub const DIM: Color = Color::Rgb(102, 102, 102);
pub const MUTED: Color = Color::Rgb(136, 136, 136);
pub const BRIGHT: Color = Color::Rgb(232, 232, 232);

// ── Accent colors ──
pub const BLUE: Color = Color::Rgb(96, 165, 250);
pub const CYAN: Color = Color::Rgb(34, 211, 238);
pub const GREEN: Color = Color::Rgb(74, 222, 128);
pub const YELLOW: Color = Color::Rgb(250, 204, 21);
pub const RED: Color = Color::Rgb(248, 113, 113);
pub const PURPLE: Color = Color::Rgb(167, 139, 250);
pub const PINK: Color = Color::Rgb(244, 114, 182);

// ── Composed styles ──

pub fn default_style() -> Style {
    Style::default().fg(TEXT).bg(BG)
}

pub fn surface_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub fn selected_style() -> Style {
    Style::default().fg(BLUE).bg(Color::Rgb(26, 42, 58))
}

pub fn heading_style() -> Style {
    Style::default().fg(BRIGHT).add_modifier(Modifier::BOLD)
}

/// Map a category's configured color tag to the palette. Unknown tags fall
/// back to the neutral accent.
pub fn category_color(category: &Category) -> Color {
    match category.color.as_str() {
        "pink" => PINK,
        "purple" => PURPLE,
        "blue" => BLUE,
        "cyan" => CYAN,
        "green" => GREEN,
        "yellow" => YELLOW,
        "red" => RED,
        _ => MUTED,
    }
}

/// Badge on a summary code line: category color on the panel background.
pub fn badge_style(category: &Category) -> Style {
    Style::default()
        .fg(category_color(category))
        .bg(PANEL)
        .add_modifier(Modifier::BOLD)
}

/// A code line that belongs to the issue under inspection.
pub fn issue_line_style(category: &Category) -> Style {
    Style::default()
        .fg(category_color(category))
        .add_modifier(Modifier::BOLD)
}
