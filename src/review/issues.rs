use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Context window (lines above/below) for issue code excerpts.
pub const CONTEXT_LINES: usize = 4;

// ── Categories ──

/// A review dimension the model is asked to look for.
/// Supplied by config; the defaults live in `crate::config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Display color tag (e.g. "pink"); mapped to a palette color by the UI.
    pub color: String,
    pub description: String,
}

// ── Issues ──

/// A single reviewer finding, tied to zero or more 1-based line numbers.
///
/// `lines` is not guaranteed to be sorted or contiguous; filtering and badge
/// counting key off the *first* element only. An empty `lines` marks a
/// file-level finding: it shows up in category filters but has no badge and
/// no excerpt.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    /// Dense sequential id, unique and stable within one review session.
    pub id: usize,
    pub category: String,
    pub title: String,
    pub description: String,
    pub lines: Vec<usize>,
    /// Elaboration text, empty until "learn more" completes.
    pub extra: String,
    pub loading_extra: bool,
}

impl Issue {
    /// The line this issue is anchored to for filtering and badges.
    pub fn first_line(&self) -> Option<usize> {
        self.lines.first().copied()
    }
}

// ── Parse boundary ──

/// Wire shape the model is instructed to produce.
#[derive(Debug, Deserialize)]
struct ReviewPayload {
    issues: Vec<RawIssue>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    title: String,
    description: String,
    category: String,
    #[serde(default)]
    lines: Vec<usize>,
}

/// A shape violation in the model's review payload.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response contained no choices")]
    NoChoices,
    #[error("reply was not valid review JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of parsing one review reply.
#[derive(Debug)]
pub struct ParsedReview {
    pub issues: Vec<Issue>,
    /// Issues dropped because their category is not a configured one.
    pub skipped: usize,
}

/// Parse the model's JSON reply into issues.
///
/// Validation happens here, at the boundary: a payload that is not JSON or
/// is missing required fields becomes a `ParseError`; an issue naming an
/// unknown category is skipped (and counted) rather than failing the whole
/// review. Retained issues get dense ids 0..N-1 in payload order.
pub fn parse_issues(content: &str, categories: &[Category]) -> Result<ParsedReview, ParseError> {
    let payload: ReviewPayload = serde_json::from_str(content)?;

    let mut issues = Vec::new();
    let mut skipped = 0;
    for raw in payload.issues {
        if !categories.iter().any(|c| c.name == raw.category) {
            skipped += 1;
            continue;
        }
        issues.push(Issue {
            id: issues.len(),
            category: raw.category,
            title: raw.title,
            description: raw.description,
            lines: raw.lines,
            extra: String::new(),
            loading_extra: false,
        });
    }

    Ok(ParsedReview { issues, skipped })
}

// ── Derivation helpers ──

/// Issues in a category, preserving original order.
pub fn issues_by_category<'a>(issues: &'a [Issue], category: &str) -> Vec<&'a Issue> {
    issues.iter().filter(|i| i.category == category).collect()
}

/// Issues anchored to `line` (first element of `lines`) in a category.
pub fn issues_by_line_and_category<'a>(
    issues: &'a [Issue],
    line: usize,
    category: &str,
) -> Vec<&'a Issue> {
    issues
        .iter()
        .filter(|i| i.first_line() == Some(line) && i.category == category)
        .collect()
}

/// Per-category issue counts for one line, sorted by category name so badge
/// ordering is stable. Categories with zero issues are omitted entirely.
pub fn line_badge_counts<'a>(
    issues: &[Issue],
    line: usize,
    categories: &'a [Category],
) -> Vec<(&'a Category, usize)> {
    let mut counts: Vec<(&Category, usize)> = categories
        .iter()
        .map(|c| {
            let n = issues
                .iter()
                .filter(|i| i.first_line() == Some(line) && i.category == c.name)
                .count();
            (c, n)
        })
        .filter(|(_, n)| *n > 0)
        .collect();
    counts.sort_by(|a, b| a.0.name.cmp(&b.0.name));
    counts
}

/// The 0-based index (into the full code) of the first excerpt line.
pub fn excerpt_start_line(issue: &Issue, context: usize) -> usize {
    issue
        .first_line()
        .map(|f| f.saturating_sub(1 + context))
        .unwrap_or(0)
}

/// A window of code lines around the issue, newline-joined.
///
/// The window runs from `context` lines above the *first* referenced line to
/// `context` lines below the *last*, clamped to the file. Only the first and
/// last elements of `lines` bound the window, however many lines the issue
/// spans. Returns `None` for file-level issues (empty `lines`).
pub fn code_excerpt(code: &str, issue: &Issue, context: usize) -> Option<String> {
    issue.first_line()?;
    let last = *issue.lines.last()?;

    let lines: Vec<&str> = code.split('\n').collect();
    let start = excerpt_start_line(issue, context);
    let end = (last + context).min(lines.len());
    if start >= end {
        return Some(String::new());
    }
    Some(lines[start..end].join("\n"))
}

/// Whether the excerpt line at `relative_index` is one of the issue's lines.
/// The absolute line number is recovered from the excerpt start.
pub fn is_highlighted_line(issue: &Issue, relative_index: usize, context: usize) -> bool {
    let absolute = relative_index + excerpt_start_line(issue, context) + 1;
    issue.lines.contains(&absolute)
}

/// Append a trailing `" //N"` marker (1-based) to every line so the model
/// can reference line numbers in its reply.
pub fn number_lines(code: &str) -> String {
    code.split('\n')
        .enumerate()
        .map(|(i, line)| format!("{} //{}", line, i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join category names for prose: "A", "A and B", "A, B and C".
pub fn categories_phrase(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [rest @ .., tail] => format!("{} and {}", rest.join(", "), tail),
    }
}
