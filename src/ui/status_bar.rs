use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::styles;
use crate::app::{App, InputMode, Screen};

/// Render the top status bar: app name, model, and where the session is.
pub fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let phase = match app.screen() {
        Screen::Intake => {
            if app.api.in_flight {
                "reviewing"
            } else {
                "intake"
            }
        }
        Screen::Summary => "summary",
        Screen::Detail => "detail",
    };

    let mut spans = vec![
        Span::styled(" revu ", styles::heading_style()),
        Span::styled("· ", Style::default().fg(styles::DIM)),
        Span::styled(app.api.model().to_string(), Style::default().fg(styles::MUTED)),
        Span::styled(" · ", Style::default().fg(styles::DIM)),
        Span::styled(phase, Style::default().fg(styles::CYAN)),
    ];

    if let Some(category) = app.session.current_category() {
        spans.push(Span::styled(" · ", Style::default().fg(styles::DIM)));
        spans.push(Span::styled(
            category.name.clone(),
            Style::default().fg(styles::category_color(category)),
        ));
        if let Some(line) = app.session.selected_line {
            spans.push(Span::styled(
                format!(": line {}", line),
                Style::default().fg(styles::MUTED),
            ));
        }
    }

    let bar = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(styles::PANEL).fg(styles::TEXT));
    f.render_widget(bar, area);
}

/// Render the bottom bar: key hints for the current screen, or progress
/// text while a request is out.
pub fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let hints: &str = match app.screen() {
        Screen::Intake => {
            if app.api.in_flight {
                " Reviewing… this can take a moment"
            } else {
                match app.input_mode {
                    InputMode::Edit => " Esc commands · Ctrl+r review · Ctrl+q quit",
                    InputMode::Command => {
                        " i edit · 1-9 toggle category · r review · q quit"
                    }
                }
            }
        }
        Screen::Summary => {
            " j/k move · Enter line issues · 1-9 category · e edit code · q quit"
        }
        Screen::Detail => {
            if app.extra_api.in_flight {
                " Loading details…"
            } else {
                " n/p issue · m learn more · j/k scroll · Esc back · e edit code · q quit"
            }
        }
    };

    let bar = Paragraph::new(Line::from(Span::styled(
        hints,
        Style::default().fg(styles::MUTED),
    )))
    .style(Style::default().bg(styles::PANEL));
    f.render_widget(bar, area);
}

/// Transient notification pinned to the top-right corner.
pub fn render_notice(f: &mut Frame, area: Rect, message: &str) {
    let width = message.chars().count() as u16 + 4;
    let x = area.x + area.width.saturating_sub(width + 2);
    let notice_area = Rect {
        x,
        y: area.y + 2,
        width: width.min(area.width),
        height: 1,
    };

    let notice = Paragraph::new(Line::from(vec![
        Span::styled(" ● ", Style::default().fg(styles::GREEN)),
        Span::styled(message.to_string(), Style::default().fg(styles::TEXT)),
        Span::raw(" "),
    ]))
    .style(Style::default().bg(styles::PANEL));
    f.render_widget(notice, notice_area);
}
