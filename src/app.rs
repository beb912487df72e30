use crate::api::ApiClient;
use crate::config::RevuConfig;
use crate::review::issues::line_badge_counts;
use crate::review::session::{Phase, ReviewSession};

// ── Screens ──

/// Which screen is on display. Derived from session state, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Intake,
    Summary,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Keys go into the code editor.
    Edit,
    /// Keys are commands (toggle categories, submit, quit).
    Command,
}

// ── Editor ──

/// Minimal multi-line editor for pasted code. Holds its buffer across
/// restarts so "edit code" returns to a populated form.
pub struct CodeEditor {
    pub lines: Vec<String>,
    pub cursor_row: usize,
    pub cursor_col: usize,
}

impl CodeEditor {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_row: 0,
            cursor_col: 0,
        }
    }

    pub fn from_text(text: &str) -> Self {
        let mut editor = Self::new();
        editor.lines = text.split('\n').map(|l| l.to_string()).collect();
        if editor.lines.is_empty() {
            editor.lines.push(String::new());
        }
        editor
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty()
    }

    fn clamp_col(&mut self) {
        self.cursor_col = self
            .cursor_col
            .min(self.lines[self.cursor_row].chars().count());
    }

    pub fn insert_char(&mut self, c: char) {
        let col = byte_index(&self.lines[self.cursor_row], self.cursor_col);
        self.lines[self.cursor_row].insert(col, c);
        self.cursor_col += 1;
    }

    pub fn insert_newline(&mut self) {
        let col = byte_index(&self.lines[self.cursor_row], self.cursor_col);
        let rest = self.lines[self.cursor_row].split_off(col);
        self.lines.insert(self.cursor_row + 1, rest);
        self.cursor_row += 1;
        self.cursor_col = 0;
    }

    pub fn backspace(&mut self) {
        if self.cursor_col > 0 {
            let col = byte_index(&self.lines[self.cursor_row], self.cursor_col - 1);
            self.lines[self.cursor_row].remove(col);
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            let removed = self.lines.remove(self.cursor_row);
            self.cursor_row -= 1;
            self.cursor_col = self.lines[self.cursor_row].chars().count();
            self.lines[self.cursor_row].push_str(&removed);
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.clamp_col();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.clamp_col();
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = self.lines[self.cursor_row].chars().count();
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor_col < self.lines[self.cursor_row].chars().count() {
            self.cursor_col += 1;
        } else if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.cursor_col = 0;
        }
    }
}

/// Byte offset of the `char_col`-th character (cursor columns are chars).
fn byte_index(line: &str, char_col: usize) -> usize {
    line.char_indices()
        .nth(char_col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

// ── App ──

/// Top-level application state: session + fetch clients + view chrome.
pub struct App {
    pub config: RevuConfig,
    pub session: ReviewSession,
    /// Client for the review request (JSON mode).
    pub api: ApiClient,
    /// Client for elaborations (text mode), so a pending "learn more"
    /// never blocks the review channel.
    pub extra_api: ApiClient,
    /// Issue id the in-flight elaboration belongs to.
    pub pending_extra: Option<usize>,
    pub editor: CodeEditor,
    pub input_mode: InputMode,
    /// Cursor line (0-based) on the summary code view.
    pub cursor_line: usize,
    pub code_scroll: usize,
    pub detail_scroll: u16,
    /// Index into the detail view's issue list (for n/p cycling).
    pub selected_issue: usize,
    pub notice: Option<String>,
    notice_ticks: u8,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: RevuConfig) -> Self {
        let api = ApiClient::new(
            config.api.endpoint.clone(),
            config.api.model.clone(),
            config.api.key_env.clone(),
        );
        let extra_api = ApiClient::new(
            config.api.endpoint.clone(),
            config.api.model.clone(),
            config.api.key_env.clone(),
        );
        let session = ReviewSession::new(config.categories.clone());
        Self {
            config,
            session,
            api,
            extra_api,
            pending_extra: None,
            editor: CodeEditor::new(),
            input_mode: InputMode::Edit,
            cursor_line: 0,
            code_scroll: 0,
            detail_scroll: 0,
            selected_issue: 0,
            notice: None,
            notice_ticks: 0,
            should_quit: false,
        }
    }

    /// The screen to render, derived from phase + selection.
    pub fn screen(&self) -> Screen {
        match self.session.phase {
            Phase::Intake | Phase::Reviewing => Screen::Intake,
            Phase::Complete => {
                if self.session.selected_category.is_some() {
                    Screen::Detail
                } else {
                    Screen::Summary
                }
            }
        }
    }

    // ── Review flow ──

    pub fn submit_review(&mut self) {
        if self.api.in_flight {
            return;
        }
        if self.editor.is_empty() {
            self.notify("Nothing to review — paste some code first");
            return;
        }
        match self.session.begin_review(&self.editor.text()) {
            Some(messages) => self.api.fetch(messages, true),
            None => self.notify("Select at least one category"),
        }
    }

    /// Drain both fetch clients. Called every event-loop iteration.
    pub fn poll_api(&mut self) {
        if let Some(result) = self.api.poll() {
            match result {
                Ok(resp) => {
                    let usage = resp.usage;
                    match self.session.apply_review_response(&resp) {
                        Ok(()) => {
                            self.cursor_line = 0;
                            self.code_scroll = 0;
                            let mut msg = format!(
                                "Review complete: {} issue{}",
                                self.session.issues.len(),
                                if self.session.issues.len() == 1 { "" } else { "s" },
                            );
                            if self.session.skipped > 0 {
                                msg.push_str(&format!(" ({} skipped)", self.session.skipped));
                            }
                            if let Some(u) = usage {
                                msg.push_str(&format!(" · {} tokens", u.total_tokens));
                            }
                            self.notify(&msg);
                        }
                        Err(err) => {
                            self.session.review_failed();
                            self.notify(&format!("Bad review reply: {}", truncate(&err.to_string(), 80)));
                        }
                    }
                }
                Err(err) => {
                    self.session.review_failed();
                    self.notify(&format!("Review failed: {}", truncate(&err.to_string(), 80)));
                }
            }
        }

        if let Some(result) = self.extra_api.poll() {
            if let Some(id) = self.pending_extra.take() {
                match result {
                    Ok(resp) => self.session.apply_elaboration(id, &resp),
                    Err(err) => {
                        self.session.elaboration_failed(id);
                        self.notify(&format!("Details failed: {}", truncate(&err.to_string(), 80)));
                    }
                }
            }
        }
    }

    /// "Learn more" for the issue at `selected_issue` in the current
    /// detail filter.
    pub fn learn_more(&mut self) {
        let Some(issue) = self.session.selected_issues().get(self.selected_issue).copied()
        else {
            return;
        };
        let id = issue.id;
        if !issue.extra.is_empty() {
            return;
        }
        match self.session.request_elaboration(id) {
            Ok(messages) => {
                self.pending_extra = Some(id);
                self.extra_api.fetch(messages, false);
            }
            Err(err) => self.notify(&err.to_string()),
        }
    }

    // ── Navigation ──

    pub fn open_category(&mut self, index: usize) {
        if index < self.session.categories.len() {
            self.session.select_category(index);
            self.selected_issue = 0;
            self.detail_scroll = 0;
        }
    }

    /// Enter on a summary line: open the first badged category there.
    pub fn open_line_detail(&mut self) {
        let line = self.cursor_line + 1;
        let badges = line_badge_counts(&self.session.issues, line, &self.session.categories);
        let Some((category, _)) = badges.first() else {
            return;
        };
        let index = self
            .session
            .categories
            .iter()
            .position(|c| c.name == category.name);
        if let Some(index) = index {
            self.session.select_category_and_line(index, line);
            self.selected_issue = 0;
            self.detail_scroll = 0;
        }
    }

    pub fn back_to_summary(&mut self) {
        self.session.clear_selection();
        self.selected_issue = 0;
        self.detail_scroll = 0;
    }

    /// Back to intake. The editor buffer survives; session, stored
    /// responses and any pending elaboration do not.
    pub fn restart(&mut self) {
        self.session.restart();
        self.api.clear();
        self.extra_api.clear();
        self.pending_extra = None;
        self.cursor_line = 0;
        self.code_scroll = 0;
        self.detail_scroll = 0;
        self.selected_issue = 0;
        self.input_mode = InputMode::Edit;
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let total = self.session.code.split('\n').count();
        let new = self.cursor_line as isize + delta;
        self.cursor_line = new.clamp(0, total.saturating_sub(1) as isize) as usize;
        // Keep a top margin while scrolling.
        self.code_scroll = self.cursor_line.saturating_sub(10);
    }

    pub fn cycle_issue(&mut self, delta: isize) {
        let count = self.session.selected_issues().len();
        if count == 0 {
            return;
        }
        let new = (self.selected_issue as isize + delta).rem_euclid(count as isize);
        self.selected_issue = new as usize;
    }

    // ── Notifications ──

    pub fn notify(&mut self, msg: &str) {
        self.notice = Some(msg.to_string());
        self.notice_ticks = 0;
    }

    /// Tick called on every event loop iteration — used for notification
    /// auto-clear.
    pub fn tick(&mut self) {
        if self.notice.is_some() {
            self.notice_ticks += 1;
            if self.notice_ticks > 30 {
                self.notice = None;
                self.notice_ticks = 0;
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{}…", cut)
    }
}
