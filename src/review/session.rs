use thiserror::Error;

use crate::api::{ChatResponse, Message};
use crate::review::issues::{
    categories_phrase, issues_by_category, issues_by_line_and_category, number_lines, parse_issues,
    Category, Issue, ParseError,
};

// ── Phase ──

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Editing code and picking categories.
    Intake,
    /// Review request sent, waiting for the reply.
    Reviewing,
    /// Issues parsed; summary and detail views available.
    Complete,
}

#[derive(Debug, Error, PartialEq)]
pub enum ElaborateError {
    #[error("an elaboration is already in progress")]
    AlreadyPending,
    #[error("no issue with id {0}")]
    UnknownIssue(usize),
}

// ── Session ──

/// One review conversation: the code, the configured categories, the
/// message log, the parsed issues, and the current selection. All mutation
/// goes through the named transition methods below.
pub struct ReviewSession {
    pub categories: Vec<Category>,
    /// Parallel to `categories`: which ones the next review asks about.
    pub selected_for_review: Vec<bool>,
    pub code: String,
    pub messages: Vec<Message>,
    pub issues: Vec<Issue>,
    /// Issues the model returned under a category not configured here.
    pub skipped: usize,
    pub phase: Phase,
    pub selected_category: Option<usize>,
    pub selected_line: Option<usize>,
}

impl ReviewSession {
    pub fn new(categories: Vec<Category>) -> Self {
        let selected = vec![true; categories.len()];
        Self {
            categories,
            selected_for_review: selected,
            code: String::new(),
            messages: Vec::new(),
            issues: Vec::new(),
            skipped: 0,
            phase: Phase::Intake,
            selected_category: None,
            selected_line: None,
        }
    }

    // ── Category selection (intake) ──

    pub fn toggle_category(&mut self, index: usize) {
        if let Some(flag) = self.selected_for_review.get_mut(index) {
            *flag = !*flag;
        }
    }

    pub fn selected_categories(&self) -> Vec<&Category> {
        self.categories
            .iter()
            .zip(&self.selected_for_review)
            .filter(|(_, sel)| **sel)
            .map(|(c, _)| c)
            .collect()
    }

    // ── Review lifecycle ──

    /// Start a review of `code`. Returns the conversation to send, or
    /// `None` when the guard fails (empty code or no category selected).
    pub fn begin_review(&mut self, code: &str) -> Option<Vec<Message>> {
        let selected = self.selected_categories();
        if code.trim().is_empty() || selected.is_empty() {
            return None;
        }

        let names: Vec<&str> = selected.iter().map(|c| c.name.as_str()).collect();
        let system = format!(
            "Please review the submitted code. Look for issues related to {}. \
             Provide the response as JSON in the shape {{\"issues\": [{{\"title\": string, \
             \"description\": string, \"category\": string, \"lines\": number[]}}]}}. \
             The category must be one of: {}. The line number can be referenced from the \
             comment at the end of each line of the submitted code. If asked for additional \
             information on an issue, return the response as plain text.",
            categories_phrase(&names),
            names.join(", "),
        );

        self.code = code.to_string();
        self.messages = vec![Message::system(system), Message::user(number_lines(code))];
        self.issues.clear();
        self.skipped = 0;
        self.phase = Phase::Reviewing;
        Some(self.messages.clone())
    }

    /// Absorb the review reply: parse issues out of the first choice and
    /// move to Complete. Malformed payloads surface as a `ParseError` and
    /// leave the session unchanged.
    pub fn apply_review_response(&mut self, resp: &ChatResponse) -> Result<(), ParseError> {
        let message = resp
            .choices
            .first()
            .map(|c| &c.message)
            .ok_or(ParseError::NoChoices)?;

        let parsed = parse_issues(&message.content, &self.categories)?;
        self.issues = parsed.issues;
        self.skipped = parsed.skipped;
        self.messages.push(message.clone());
        self.phase = Phase::Complete;
        Ok(())
    }

    /// The review request failed; back to intake with the code retained.
    pub fn review_failed(&mut self) {
        self.phase = Phase::Intake;
    }

    // ── Elaboration ──

    /// Ask for more detail on one issue. At most one elaboration may be in
    /// flight; a second request is rejected here rather than at the UI.
    /// Returns the full conversation to send.
    pub fn request_elaboration(&mut self, id: usize) -> Result<Vec<Message>, ElaborateError> {
        if self.issues.iter().any(|i| i.loading_extra) {
            return Err(ElaborateError::AlreadyPending);
        }
        let issue = self
            .issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(ElaborateError::UnknownIssue(id))?;

        issue.loading_extra = true;
        let prompt = format!("Provide more information on {}", issue.title);
        self.messages.push(Message::user(prompt));
        Ok(self.messages.clone())
    }

    /// Store the elaboration reply (the *last* choice) on the issue.
    pub fn apply_elaboration(&mut self, id: usize, resp: &ChatResponse) {
        if let Some(issue) = self.issues.iter_mut().find(|i| i.id == id) {
            issue.loading_extra = false;
            if let Some(choice) = resp.choices.last() {
                issue.extra = choice.message.content.clone();
                self.messages.push(choice.message.clone());
            }
        }
    }

    pub fn elaboration_failed(&mut self, id: usize) {
        if let Some(issue) = self.issues.iter_mut().find(|i| i.id == id) {
            issue.loading_extra = false;
        }
    }

    // ── Selection ──

    pub fn select_category(&mut self, index: usize) {
        if index < self.categories.len() {
            self.selected_category = Some(index);
            self.selected_line = None;
        }
    }

    pub fn select_category_and_line(&mut self, index: usize, line: usize) {
        if index < self.categories.len() {
            self.selected_category = Some(index);
            self.selected_line = Some(line);
        }
    }

    /// Back from detail to summary; code and issues are kept.
    pub fn clear_selection(&mut self) {
        self.selected_category = None;
        self.selected_line = None;
    }

    /// Drop everything but the category configuration. The caller keeps
    /// its editor buffer and clears the fetch clients.
    pub fn restart(&mut self) {
        self.code.clear();
        self.messages.clear();
        self.issues.clear();
        self.skipped = 0;
        self.selected_category = None;
        self.selected_line = None;
        self.phase = Phase::Intake;
    }

    // ── Views over the issue list ──

    pub fn current_category(&self) -> Option<&Category> {
        self.selected_category.and_then(|i| self.categories.get(i))
    }

    /// Issues for the current selection: category-wide, or narrowed to the
    /// selected line. Empty selection or empty result is just an empty list.
    pub fn selected_issues(&self) -> Vec<&Issue> {
        let Some(category) = self.current_category() else {
            return Vec::new();
        };
        match self.selected_line {
            Some(line) => issues_by_line_and_category(&self.issues, line, &category.name),
            None => issues_by_category(&self.issues, &category.name),
        }
    }

    pub fn category_count(&self, name: &str) -> usize {
        issues_by_category(&self.issues, name).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Choice, Role};

    fn make_session() -> ReviewSession {
        ReviewSession::new(vec![
            Category {
                name: "Best Practices".to_string(),
                color: "pink".to_string(),
                description: String::new(),
            },
            Category {
                name: "Security".to_string(),
                color: "purple".to_string(),
                description: String::new(),
            },
        ])
    }

    fn response_with(content: &str) -> ChatResponse {
        ChatResponse {
            id: String::new(),
            model: String::new(),
            choices: vec![Choice {
                index: 0,
                message: Message {
                    role: Role::Assistant,
                    content: content.to_string(),
                },
                finish_reason: None,
            }],
            usage: None,
        }
    }

    const TWO_ISSUES: &str = r#"{"issues": [
        {"title": "A", "description": "a", "category": "Security", "lines": [1]},
        {"title": "B", "description": "b", "category": "Best Practices", "lines": [2]}
    ]}"#;

    fn completed_session() -> ReviewSession {
        let mut s = make_session();
        s.begin_review("let x = 1;\nlet y = 2;").unwrap();
        s.apply_review_response(&response_with(TWO_ISSUES)).unwrap();
        s
    }

    // ── begin_review ──

    #[test]
    fn begin_review_builds_system_and_user_messages() {
        let mut s = make_session();
        let messages = s.begin_review("let x = 1;\nlet y = 2;").unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Best Practices and Security"));
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "let x = 1; //1\nlet y = 2; //2");
        assert_eq!(s.phase, Phase::Reviewing);
    }

    #[test]
    fn begin_review_rejects_empty_code() {
        let mut s = make_session();
        assert!(s.begin_review("   \n  ").is_none());
        assert_eq!(s.phase, Phase::Intake);
    }

    #[test]
    fn begin_review_rejects_no_selected_categories() {
        let mut s = make_session();
        s.toggle_category(0);
        s.toggle_category(1);
        assert!(s.begin_review("let x = 1;").is_none());
    }

    #[test]
    fn begin_review_names_only_selected_categories() {
        let mut s = make_session();
        s.toggle_category(0);
        let messages = s.begin_review("let x = 1;").unwrap();
        assert!(messages[0].content.contains("related to Security."));
        assert!(!messages[0].content.contains("Best Practices and"));
    }

    // ── apply_review_response ──

    #[test]
    fn apply_review_parses_issues_and_completes() {
        let s = completed_session();
        assert_eq!(s.phase, Phase::Complete);
        assert_eq!(s.issues.len(), 2);
        assert_eq!(s.issues[0].id, 0);
        assert_eq!(s.issues[1].id, 1);
        // system + user + assistant
        assert_eq!(s.messages.len(), 3);
        assert_eq!(s.messages[2].role, Role::Assistant);
    }

    #[test]
    fn apply_review_malformed_payload_is_typed_error() {
        let mut s = make_session();
        s.begin_review("x").unwrap();
        let err = s.apply_review_response(&response_with("not json"));
        assert!(matches!(err, Err(ParseError::Json(_))));
        assert_eq!(s.phase, Phase::Reviewing);
        assert!(s.issues.is_empty());
    }

    #[test]
    fn apply_review_no_choices_is_typed_error() {
        let mut s = make_session();
        s.begin_review("x").unwrap();
        let resp = ChatResponse {
            id: String::new(),
            model: String::new(),
            choices: vec![],
            usage: None,
        };
        assert!(matches!(
            s.apply_review_response(&resp),
            Err(ParseError::NoChoices)
        ));
    }

    #[test]
    fn review_failed_returns_to_intake_keeping_code() {
        let mut s = make_session();
        s.begin_review("let x = 1;").unwrap();
        s.review_failed();
        assert_eq!(s.phase, Phase::Intake);
        assert_eq!(s.code, "let x = 1;");
    }

    // ── elaboration ──

    #[test]
    fn request_elaboration_appends_follow_up() {
        let mut s = completed_session();
        let messages = s.request_elaboration(0).unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[3].content, "Provide more information on A");
        assert!(s.issues[0].loading_extra);
    }

    #[test]
    fn request_elaboration_rejects_concurrent() {
        let mut s = completed_session();
        s.request_elaboration(0).unwrap();
        assert_eq!(
            s.request_elaboration(1),
            Err(ElaborateError::AlreadyPending)
        );
    }

    #[test]
    fn request_elaboration_unknown_issue() {
        let mut s = completed_session();
        assert_eq!(
            s.request_elaboration(42),
            Err(ElaborateError::UnknownIssue(42))
        );
    }

    #[test]
    fn apply_elaboration_takes_last_choice() {
        let mut s = completed_session();
        s.request_elaboration(0).unwrap();
        let mut resp = response_with("first");
        resp.choices.push(Choice {
            index: 1,
            message: Message {
                role: Role::Assistant,
                content: "the details".to_string(),
            },
            finish_reason: None,
        });
        s.apply_elaboration(0, &resp);
        assert_eq!(s.issues[0].extra, "the details");
        assert!(!s.issues[0].loading_extra);
        assert_eq!(s.messages.last().map(|m| m.content.as_str()), Some("the details"));
    }

    #[test]
    fn elaboration_failed_only_clears_flag() {
        let mut s = completed_session();
        s.request_elaboration(0).unwrap();
        let before = s.messages.len();
        s.elaboration_failed(0);
        assert!(!s.issues[0].loading_extra);
        assert_eq!(s.issues[0].extra, "");
        assert_eq!(s.messages.len(), before);
    }

    // ── selection & restart ──

    #[test]
    fn selected_issues_category_wide_and_narrowed() {
        let mut s = completed_session();
        s.select_category(1);
        assert_eq!(s.selected_issues().len(), 1);
        s.select_category_and_line(1, 1);
        assert_eq!(s.selected_issues().len(), 1);
        s.select_category_and_line(1, 2);
        assert!(s.selected_issues().is_empty());
    }

    #[test]
    fn clear_selection_keeps_issues() {
        let mut s = completed_session();
        s.select_category_and_line(0, 2);
        s.clear_selection();
        assert_eq!(s.selected_category, None);
        assert_eq!(s.selected_line, None);
        assert_eq!(s.issues.len(), 2);
        assert_eq!(s.phase, Phase::Complete);
    }

    #[test]
    fn restart_clears_everything_but_categories() {
        let mut s = completed_session();
        s.select_category(0);
        s.restart();
        assert_eq!(s.phase, Phase::Intake);
        assert!(s.code.is_empty());
        assert!(s.messages.is_empty());
        assert!(s.issues.is_empty());
        assert_eq!(s.selected_category, None);
        assert_eq!(s.categories.len(), 2);
    }
}
