use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{styles, utils};
use crate::app::App;
use crate::review::issues::{code_excerpt, excerpt_start_line, is_highlighted_line};

/// Detail screen: the issues behind the current selection, each with its
/// excerpt and any fetched elaboration.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(category) = app.session.current_category() else {
        return;
    };
    let color = styles::category_color(category);

    let title = match app.session.selected_line {
        Some(line) => format!(" {} · line {} ", category.name, line),
        None => format!(" {} ", category.name),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let issues = app.session.selected_issues();
    if issues.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No issues here.",
            Style::default().fg(styles::DIM),
        )));
        f.render_widget(empty, inner);
        return;
    }

    let width = inner.width.saturating_sub(2) as usize;
    let context = app.config.display.context_lines;
    let mut lines: Vec<Line> = Vec::new();

    for (pos, issue) in issues.iter().enumerate() {
        let selected = pos == app.selected_issue;
        let marker = if selected { "▸" } else { " " };
        let title_style = if selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(styles::BRIGHT)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} {}. ", marker, pos + 1), Style::default().fg(styles::DIM)),
            Span::styled(issue.title.clone(), title_style),
        ]));

        for row in utils::word_wrap(&issue.description, width) {
            lines.push(Line::from(Span::styled(
                format!("   {}", row),
                Style::default().fg(styles::TEXT),
            )));
        }

        if let Some(excerpt) = code_excerpt(&app.session.code, issue, context) {
            let start = excerpt_start_line(issue, context);
            lines.push(Line::default());
            for (rel, code_line) in excerpt.split('\n').enumerate() {
                let absolute = start + rel + 1;
                let style = if is_highlighted_line(issue, rel, context) {
                    styles::issue_line_style(category)
                } else {
                    Style::default().fg(styles::MUTED)
                };
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("   {:>4} │ ", absolute),
                        Style::default().fg(styles::DIM),
                    ),
                    Span::styled(code_line.to_string(), style),
                ]));
            }
        }

        lines.push(Line::default());
        if issue.loading_extra {
            lines.push(Line::from(Span::styled(
                "   Loading details…",
                Style::default().fg(styles::YELLOW),
            )));
        } else if issue.extra.is_empty() {
            if selected {
                lines.push(Line::from(Span::styled(
                    "   [m] learn more",
                    Style::default().fg(styles::DIM),
                )));
            }
        } else {
            for row in utils::word_wrap(&issue.extra, width) {
                lines.push(Line::from(Span::styled(
                    format!("   {}", row),
                    Style::default().fg(styles::CYAN),
                )));
            }
        }
        lines.push(Line::default());
    }

    let body = Paragraph::new(lines).scroll((app.detail_scroll, 0));
    f.render_widget(body, inner);
}
