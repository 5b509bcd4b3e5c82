//! Code block highlighting with syntect.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{self, FontStyle, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// The syntect theme used for code blocks.
const THEME_NAME: &str = "base16-ocean.dark";

pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme: highlighting::Theme,
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        let mut themes = ThemeSet::load_defaults();
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme: themes.themes.remove(THEME_NAME).unwrap_or_default(),
        }
    }

    /// Finds a syntax by fence token (`rust`, `py`, `sh`...), falling back to plain text.
    fn syntax_for(&self, language: &str) -> &SyntaxReference {
        let language = language.trim();
        if language.is_empty() {
            return self.syntax_set.find_syntax_plain_text();
        }
        self.syntax_set
            .find_syntax_by_token(language)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Highlights `code`, one ratatui line per source line.
    pub fn highlight_code(&self, code: &str, language: &str) -> Vec<Line<'static>> {
        let mut highlighter = HighlightLines::new(self.syntax_for(language), &self.theme);
        LinesWithEndings::from(code)
            .map(|line| match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => Line::from(
                    ranges
                        .into_iter()
                        .map(|(style, text)| {
                            Span::styled(
                                text.trim_end_matches(['\n', '\r']).to_string(),
                                convert_style(style),
                            )
                        })
                        .collect::<Vec<_>>(),
                ),
                Err(_) => Line::from(line.trim_end_matches(['\n', '\r']).to_string()),
            })
            .collect()
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn convert_style(style: highlighting::Style) -> Style {
    let fg = style.foreground;
    let mut converted = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
    if style.font_style.contains(FontStyle::BOLD) {
        converted = converted.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        converted = converted.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        converted = converted.add_modifier(Modifier::UNDERLINED);
    }
    converted
}
