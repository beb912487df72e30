use ratatui::style::{Color, Style};
use ratatui::text::Span;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::{SyntaxReference, SyntaxSet};

/// Cached syntax highlighting state — loaded once, reused for every draw.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Highlighter {
    pub fn new() -> Self {
        Highlighter {
            // Extended syntax set: pasted code can be anything.
            syntax_set: two_face::syntax::extra_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Pasted code has no filename. Try the configured token first (e.g.
    /// "rs", "py"), then the first line (shebangs etc.), then plain text.
    fn detect_syntax(&self, code: &str, language: Option<&str>) -> &SyntaxReference {
        language
            .and_then(|token| self.syntax_set.find_syntax_by_token(token))
            .or_else(|| {
                code.lines()
                    .next()
                    .and_then(|first| self.syntax_set.find_syntax_by_first_line(first))
            })
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Highlight a whole block of code, one styled span row per line.
    /// `base_style` is layered underneath so selection backgrounds survive.
    pub fn highlight_code(
        &self,
        code: &str,
        language: Option<&str>,
        base_style: Style,
    ) -> Vec<Vec<Span<'static>>> {
        let syntax = self.detect_syntax(code, language);
        // Dark theme that works well with our dark TUI background
        let theme = &self.theme_set.themes["base16-ocean.dark"];
        let mut highlighter = HighlightLines::new(syntax, theme);

        code.split('\n')
            .map(|line| {
                // syntect needs a trailing newline
                let input = format!("{}\n", line);
                match highlighter.highlight_line(&input, &self.syntax_set) {
                    Ok(ranges) => ranges
                        .into_iter()
                        .map(|(syn_style, text)| {
                            let text = text.trim_end_matches('\n');
                            let fg = Color::Rgb(
                                syn_style.foreground.r,
                                syn_style.foreground.g,
                                syn_style.foreground.b,
                            );
                            Span::styled(text.to_string(), base_style.fg(fg))
                        })
                        .collect(),
                    Err(_) => {
                        // Fallback: return unstyled
                        vec![Span::styled(line.to_string(), base_style)]
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_preserves_line_count_and_text() {
        let hl = Highlighter::new();
        let code = "fn main() {\n    let x = 1;\n}";
        let rows = hl.highlight_code(code, Some("rs"), Style::default());
        assert_eq!(rows.len(), 3);
        let first: String = rows[0].iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, "fn main() {");
    }

    #[test]
    fn unknown_token_falls_back_to_plain_text() {
        let hl = Highlighter::new();
        let rows = hl.highlight_code("whatever", Some("not-a-language"), Style::default());
        let text: String = rows[0].iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "whatever");
    }
}
