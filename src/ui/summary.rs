use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::highlight::Highlighter;
use super::styles;
use crate::app::App;
use crate::review::issues::line_badge_counts;

/// Width reserved for the per-line badge column on the right.
const BADGE_COL: u16 = 16;

/// Summary screen: per-category cards over the full highlighted code with
/// per-line issue badges.
pub fn render(f: &mut Frame, area: Rect, app: &App, hl: &Highlighter) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // category cards
            Constraint::Min(1),    // code view
        ])
        .split(area);

    render_cards(f, rows[0], app);
    render_code(f, rows[1], app, hl);
}

fn render_cards(f: &mut Frame, area: Rect, app: &App) {
    let count = app.session.categories.len().max(1);
    let constraints: Vec<Constraint> = (0..count)
        .map(|_| Constraint::Ratio(1, count as u32))
        .collect();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, category) in app.session.categories.iter().enumerate() {
        let issue_count = app.session.category_count(&category.name);
        let color = styles::category_color(category);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if issue_count > 0 {
                color
            } else {
                styles::BORDER
            }))
            .title(Span::styled(
                format!(" {} {} ", i + 1, category.name),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(cols[i]);
        f.render_widget(block, cols[i]);

        let mut lines = vec![Line::from(Span::styled(
            format!(
                "{} issue{}",
                issue_count,
                if issue_count == 1 { "" } else { "s" }
            ),
            Style::default().fg(styles::BRIGHT),
        ))];
        if issue_count > 0 {
            lines.push(Line::from(Span::styled(
                format!("press {} to explore", i + 1),
                Style::default().fg(styles::DIM),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "nothing found",
                Style::default().fg(styles::DIM),
            )));
        }
        f.render_widget(Paragraph::new(lines), inner);
    }
}

fn render_code(f: &mut Frame, area: Rect, app: &App, hl: &Highlighter) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(styles::BORDER))
        .title(Span::styled(" Code ", Style::default().fg(styles::MUTED)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let code = &app.session.code;
    let language = app.config.display.language.as_deref();
    let highlighted = hl.highlight_code(code, language, Style::default());

    let total = highlighted.len();
    let gutter_width = if app.config.display.line_numbers {
        total.to_string().len().max(3) + 1
    } else {
        0
    };

    let height = inner.height as usize;
    let scroll = app
        .code_scroll
        .min(total.saturating_sub(height))
        // Never let the cursor row fall below the viewport.
        .max((app.cursor_line + 1).saturating_sub(height));

    let code_width = inner.width.saturating_sub(BADGE_COL);
    let mut lines: Vec<Line> = Vec::with_capacity(height);
    for (row, spans) in highlighted.iter().enumerate().skip(scroll).take(height) {
        let line_no = row + 1;
        let on_cursor = row == app.cursor_line;
        let base = if on_cursor {
            styles::selected_style()
        } else {
            Style::default()
        };

        let mut all: Vec<Span> = Vec::new();
        if gutter_width > 0 {
            all.push(Span::styled(
                format!("{:>width$} ", line_no, width = gutter_width - 1),
                base.fg(styles::DIM),
            ));
        }
        let mut used = gutter_width;
        for span in spans {
            used += span.content.chars().count();
            all.push(span.clone().patch_style(base));
        }

        // Right-aligned badge column, one cell per category with issues here.
        let badges = line_badge_counts(&app.session.issues, line_no, &app.session.categories);
        if !badges.is_empty() {
            let labels: Vec<Span> = badges
                .iter()
                .map(|(category, n)| {
                    Span::styled(format!(" {} {} ", initial(&category.name), n), styles::badge_style(category))
                })
                .collect();
            let pad = (code_width as usize).saturating_sub(used) + 1;
            all.push(Span::raw(" ".repeat(pad)));
            all.extend(labels);
        }

        lines.push(Line::from(all));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

/// Badge label: first letter of the category name.
fn initial(name: &str) -> String {
    name.chars().next().map(|c| c.to_string()).unwrap_or_default()
}
