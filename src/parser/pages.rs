//! Page splitting.
//!
//! A presentation body is cut into pages at page-break lines. The default
//! break is a thematic break (`---`, `***`, `___`), which is dropped from the
//! output. Alternatively a heading of a given level can start each page, in
//! which case the heading stays on the page it starts.
//!
//! Lines inside fenced code blocks never break a page.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::content::parse_content;
use super::output::Block;

/// Conditions for breaking a document into pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageBreak {
    /// Break on a thematic break line.
    #[default]
    ThematicBreak,

    /// Break before every heading of exactly this level.
    Heading {
        /// The heading level (1-6).
        level: usize,
    },
}

/// How a break line relates to the pages around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakKind {
    /// The line ends the page and belongs to neither page.
    Consume,
    /// The line starts the next page.
    Before,
}

impl PageBreak {
    fn classify(&self, line: &str) -> Option<BreakKind> {
        match self {
            PageBreak::ThematicBreak => is_thematic_break(line).then_some(BreakKind::Consume),
            PageBreak::Heading { level } => {
                (heading_level(line) == Some(*level)).then_some(BreakKind::Before)
            }
        }
    }
}

/// Returns true if `line` is a thematic break: three or more of the same
/// character out of `-`, `*` and `_`, optionally separated by spaces, with at
/// most three spaces of indentation.
pub fn is_thematic_break(line: &str) -> bool {
    // The regex crate has no backreferences, so each marker gets its own branch.
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^ {0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap()
    });
    pattern.is_match(line.trim_end_matches(['\n', '\r']))
}

/// Returns the level of an ATX heading line, if `line` is one.
fn heading_level(line: &str) -> Option<usize> {
    let trimmed = line.strip_prefix("   ").or_else(|| line.strip_prefix("  "));
    let trimmed = trimmed.or_else(|| line.strip_prefix(' ')).unwrap_or(line);
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    match trimmed[level..].chars().next() {
        None | Some(' ') | Some('\t') | Some('\n') | Some('\r') => Some(level),
        _ => None,
    }
}

/// An open fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// Parses an opening (or closing) fence line.
    fn parse(line: &str) -> Option<Fence> {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            return None;
        }
        let rest = &line[indent..];
        let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = rest.chars().take_while(|&c| c == marker).count();
        (len >= 3).then_some(Fence { marker, len })
    }

    /// Returns true if `line` closes this fence.
    fn closed_by(&self, line: &str) -> bool {
        match Fence::parse(line) {
            Some(close) => {
                close.marker == self.marker
                    && close.len >= self.len
                    && line.trim().chars().all(|c| c == self.marker)
            }
            None => false,
        }
    }
}

/// A single page of the presentation.
#[derive(Debug, Clone)]
pub struct Page {
    number: usize,
    start_line: usize,
    source: String,
    blocks: Vec<Block>,
}

impl Page {
    /// The 1-based page number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// The 1-based document line of the first content line of this page.
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// The raw markdown of this page, without surrounding blank lines.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The markdown blocks of this page, in document order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns true for a deliberately blank page.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The first non-blank line of the page, with heading markers removed.
    pub fn headline(&self) -> &str {
        self.source
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| line.trim_start_matches('#').trim_start())
            .unwrap_or("")
    }
}

/// A lazy iterator over the pages of a body.
///
/// Pages are parsed one at a time as the iterator advances. Calling [`pages`]
/// again restarts from the first page.
#[derive(Debug, Clone)]
pub struct Pages<'a> {
    rest: &'a str,
    line: usize,
    emitted: usize,
    finished: bool,
    /// Set once the break on the first body line has been dropped.
    skipped_leading: bool,
    condition: &'a PageBreak,
}

/// Splits `body` into pages.
///
/// # Arguments
///
/// * `body` - The body text, front matter already removed
/// * `condition` - The page break condition
/// * `first_line` - The document line on which `body` starts (1-based)
///
/// # Examples
///
/// ```
/// use slidehook::parser::pages::{pages, PageBreak};
///
/// let condition = PageBreak::default();
/// let sources: Vec<String> = pages("A\n---\nB\n---\nC", &condition, 1)
///     .map(|page| page.source().to_string())
///     .collect();
/// assert_eq!(sources, ["A", "B", "C"]);
/// ```
pub fn pages<'a>(body: &'a str, condition: &'a PageBreak, first_line: usize) -> Pages<'a> {
    Pages {
        rest: body,
        line: first_line,
        emitted: 0,
        finished: false,
        skipped_leading: false,
        condition,
    }
}

impl<'a> Pages<'a> {
    /// Takes the next line, advancing the cursor.
    fn take_line(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self.rest.find('\n').map(|i| i + 1).unwrap_or(self.rest.len());
        let (line, rest) = self.rest.split_at(end);
        self.rest = rest;
        self.line += 1;
        Some(line)
    }

    fn peek_line(&self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self.rest.find('\n').map(|i| i + 1).unwrap_or(self.rest.len());
        Some(&self.rest[..end])
    }
}

impl Iterator for Pages<'_> {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        if self.finished {
            return None;
        }

        let mut lines: Vec<&str> = Vec::new();
        let mut start_line = self.line;
        let mut fence: Option<Fence> = None;

        loop {
            let Some(line) = self.peek_line() else {
                self.finished = true;
                break;
            };

            // Only a break before any content of the first page is dropped.
            let leading = self.emitted == 0
                && !self.skipped_leading
                && lines.iter().all(|l| l.trim().is_empty());

            let kind = if fence.is_none() {
                self.condition.classify(line)
            } else {
                None
            };
            match kind {
                Some(BreakKind::Consume) => {
                    self.take_line();
                    if leading {
                        self.skipped_leading = true;
                        lines.clear();
                        start_line = self.line;
                        continue;
                    }
                    break;
                }
                Some(BreakKind::Before) if !lines.is_empty() && !leading => break,
                Some(BreakKind::Before) if leading => {
                    lines.clear();
                    start_line = self.line;
                }
                _ => {}
            }

            fence = match fence {
                Some(open) if open.closed_by(line) => None,
                Some(open) => Some(open),
                None => Fence::parse(line),
            };
            lines.push(line);
            self.take_line();
        }

        self.emitted += 1;
        Some(build_page(self.emitted, start_line, &lines))
    }
}

fn build_page(number: usize, start_line: usize, lines: &[&str]) -> Page {
    let skip = lines.iter().take_while(|l| l.trim().is_empty()).count();
    let start_line = start_line + skip;
    let source = lines[skip..].concat().trim_end().to_string();
    let blocks = if source.is_empty() {
        Vec::new()
    } else {
        parse_content(&source, start_line)
    };
    Page {
        number,
        start_line,
        source,
        blocks,
    }
}
