mod api;
mod app;
mod config;
mod review;
mod ui;

use anyhow::Result;
use app::{App, CodeEditor, InputMode, Screen};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Terminal UI for AI code review
#[derive(Parser)]
#[command(name = "revu", version, about)]
struct Cli {
    /// File to preload into the editor
    file: Option<PathBuf>,

    /// Override the configured model id
    #[arg(long)]
    model: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config(".");
    if let Some(model) = cli.model {
        config.api.model = model;
    }

    let mut app = App::new(config);
    if let Some(ref path) = cli.file {
        let contents = std::fs::read_to_string(path)?;
        app.editor = CodeEditor::from_text(&contents);
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if app.config.display.language.is_none() {
                app.config.display.language = Some(ext.to_string());
            }
        }
    }

    // Load syntax highlighting (once, reused for all draws)
    let highlighter = ui::highlight::Highlighter::new();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let result = run_app(&mut terminal, &mut app, &highlighter);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    hl: &ui::highlight::Highlighter,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        // Draw
        terminal.draw(|f| ui::draw(f, app, hl))?;

        // Poll for input with a timeout so API channels stay responsive
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
                match app.screen() {
                    Screen::Intake => handle_intake_input(app, key),
                    Screen::Summary => handle_summary_input(app, key),
                    Screen::Detail => handle_detail_input(app, key),
                }
            }
        }

        // Drain finished API calls, then age the notification
        app.poll_api();
        app.tick();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn handle_intake_input(app: &mut App, key: KeyEvent) {
    // While the review request is out, only quitting is allowed
    if app.api.in_flight {
        if key.code == KeyCode::Char('q') {
            app.should_quit = true;
        }
        return;
    }

    match app.input_mode {
        InputMode::Edit => handle_editor_input(app, key),
        InputMode::Command => match key.code {
            KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Edit,
            KeyCode::Char('r') => app.submit_review(),
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                app.session.toggle_category(index);
            }
            _ => {}
        },
    }
}

fn handle_editor_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.submit_review();
        return;
    }
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Command,
        KeyCode::Enter => app.editor.insert_newline(),
        KeyCode::Backspace => app.editor.backspace(),
        KeyCode::Up => app.editor.move_up(),
        KeyCode::Down => app.editor.move_down(),
        KeyCode::Left => app.editor.move_left(),
        KeyCode::Right => app.editor.move_right(),
        KeyCode::Tab => {
            for _ in 0..4 {
                app.editor.insert_char(' ');
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.editor.insert_char(c)
        }
        _ => {}
    }
}

fn handle_summary_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => app.move_cursor(10),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.move_cursor(-10),
        KeyCode::Enter => app.open_line_detail(),
        KeyCode::Char(c @ '1'..='9') => app.open_category(c as usize - '1' as usize),
        KeyCode::Char('e') | KeyCode::Backspace => app.restart(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_detail_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.detail_scroll = app.detail_scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => app.detail_scroll = app.detail_scroll.saturating_sub(1),
        KeyCode::Char('n') => app.cycle_issue(1),
        KeyCode::Char('p') => app.cycle_issue(-1),
        KeyCode::Char('m') => app.learn_more(),
        KeyCode::Esc | KeyCode::Char('b') => app.back_to_summary(),
        KeyCode::Char(c @ '1'..='9') => app.open_category(c as usize - '1' as usize),
        KeyCode::Char('e') => app.restart(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}
