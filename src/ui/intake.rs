use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{styles, utils};
use crate::app::{App, InputMode};

/// Intake screen: code editor on top, category toggle cards below.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),    // editor
            Constraint::Length(7), // category cards
            Constraint::Length(1), // guard warning
        ])
        .split(area);

    render_editor(f, rows[0], app);
    render_categories(f, rows[1], app);
    render_warning(f, rows[2], app);
}

fn render_editor(f: &mut Frame, area: Rect, app: &App) {
    let editing = app.input_mode == InputMode::Edit && !app.api.in_flight;
    let border_style = if editing {
        Style::default().fg(styles::BLUE)
    } else {
        Style::default().fg(styles::BORDER)
    };
    let title = if app.api.in_flight {
        " Code · reviewing… "
    } else {
        " Code "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(title, Style::default().fg(styles::MUTED)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let text_style = if app.api.in_flight {
        Style::default().fg(styles::DIM)
    } else {
        Style::default().fg(styles::TEXT)
    };

    // Keep the cursor row inside the viewport.
    let height = inner.height as usize;
    let scroll = app
        .editor
        .cursor_row
        .saturating_sub(height.saturating_sub(1));

    let lines: Vec<Line> = app
        .editor
        .lines
        .iter()
        .skip(scroll)
        .take(height)
        .map(|l| Line::from(Span::styled(l.clone(), text_style)))
        .collect();
    f.render_widget(Paragraph::new(lines).style(styles::surface_style()), inner);

    if editing {
        let x = inner.x + app.editor.cursor_col.min((inner.width as usize).saturating_sub(1)) as u16;
        let y = inner.y + (app.editor.cursor_row - scroll) as u16;
        f.set_cursor_position(Position { x, y });
    }
}

fn render_categories(f: &mut Frame, area: Rect, app: &App) {
    let count = app.session.categories.len().max(1);
    let constraints: Vec<Constraint> = (0..count)
        .map(|_| Constraint::Ratio(1, count as u32))
        .collect();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, category) in app.session.categories.iter().enumerate() {
        let selected = app.session.selected_for_review.get(i).copied().unwrap_or(false);
        let color = styles::category_color(category);
        let border_style = if selected {
            Style::default().fg(color)
        } else {
            Style::default().fg(styles::BORDER)
        };
        let mark = if selected { "[x]" } else { "[ ]" };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                format!(" {} {} · {} ", mark, i + 1, category.name),
                if selected {
                    Style::default().fg(color).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(styles::MUTED)
                },
            ));
        let inner = block.inner(cols[i]);
        f.render_widget(block, cols[i]);

        let lines: Vec<Line> = utils::word_wrap(&category.description, inner.width as usize)
            .into_iter()
            .take(inner.height as usize)
            .map(|l| Line::from(Span::styled(l, Style::default().fg(styles::DIM))))
            .collect();
        f.render_widget(Paragraph::new(lines), inner);
    }
}

fn render_warning(f: &mut Frame, area: Rect, app: &App) {
    if app.session.selected_categories().is_empty() {
        let warning = Paragraph::new(Line::from(Span::styled(
            " Select at least one category to review against",
            Style::default().fg(styles::YELLOW),
        )));
        f.render_widget(warning, area);
    }
}
