//! Front matter extraction.
//!
//! A presentation may open with a configuration block fenced by `%%%` lines:
//!
//! ```text
//! %%%
//! title = "Quarterly review"
//! %%%
//! # First slide
//! ```
//!
//! The block is only recognized when the opening delimiter is the very first
//! line and a closing delimiter follows on a line of its own. Anything else
//! leaves the whole text as body.

use crate::config::ConfigFragment;
use crate::error::ConfigError;

/// The delimiter line that opens and closes the front matter.
pub const FRONT_MATTER_DELIMITER: &str = "%%%";

/// The result of splitting a document into front matter and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// The text between the delimiters, if a block was found.
    pub front_matter: Option<&'a str>,
    /// Everything after the closing delimiter line, or the whole text.
    pub body: &'a str,
    /// The 1-based document line on which the body starts.
    pub body_line: usize,
}

/// Splits `text` into front matter and body without parsing the front matter.
///
/// # Examples
///
/// ```
/// use slidehook::parser::front_matter::split;
///
/// let split = split("%%%\ntitle = \"X\"\n%%%\nBody");
/// assert_eq!(split.front_matter, Some("title = \"X\"\n"));
/// assert_eq!(split.body, "Body");
/// assert_eq!(split.body_line, 4);
/// ```
pub fn split(text: &str) -> Split<'_> {
    let no_front_matter = Split {
        front_matter: None,
        body: text,
        body_line: 1,
    };

    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return no_front_matter;
    };
    if !is_delimiter(first) {
        return no_front_matter;
    }

    let start = first.len();
    let mut offset = start;
    for (index, line) in lines.enumerate() {
        if is_delimiter(line) {
            return Split {
                front_matter: Some(&text[start..offset]),
                body: &text[offset + line.len()..],
                // Opening line, `index` config lines, closing line, then body.
                body_line: index + 3,
            };
        }
        offset += line.len();
    }

    // An unterminated block is not front matter.
    no_front_matter
}

/// Extracts and parses the front matter of `text`.
///
/// Returns the parsed configuration fragment (if any) together with the body.
/// Syntax errors report line and column relative to the whole document.
pub fn extract(text: &str) -> Result<(Option<ConfigFragment>, Split<'_>), ConfigError> {
    let split = split(text);
    let fragment = split
        .front_matter
        .map(|source| ConfigFragment::from_toml(source, "front matter", 1))
        .transpose()?;
    Ok((fragment, split))
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == FRONT_MATTER_DELIMITER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_title_and_body() {
        let (fragment, split) = extract("%%%\ntitle = \"X\"\n%%%\nBody").unwrap();
        assert_eq!(fragment.unwrap().title.as_deref(), Some("X"));
        assert_eq!(split.body, "Body");
    }

    #[test]
    fn test_no_delimiter_on_first_line_is_all_body() {
        let text = "# Slide\n%%%\ntitle = \"X\"\n%%%\n";
        let (fragment, split) = extract(text).unwrap();
        assert!(fragment.is_none());
        assert_eq!(split.body, text);
        assert_eq!(split.body_line, 1);
    }

    #[test]
    fn test_leading_blank_line_disables_front_matter() {
        let text = "\n%%%\ntitle = \"X\"\n%%%\nBody";
        let split = split(text);
        assert!(split.front_matter.is_none());
        assert_eq!(split.body, text);
    }

    #[test]
    fn test_unterminated_block_is_body() {
        let text = "%%%\ntitle = \"X\"\nBody";
        let (fragment, split) = extract(text).unwrap();
        assert!(fragment.is_none());
        assert_eq!(split.body, text);
    }

    #[test]
    fn test_empty_document() {
        let split = split("");
        assert!(split.front_matter.is_none());
        assert_eq!(split.body, "");
    }

    #[test]
    fn test_empty_block_and_crlf_delimiters() {
        let split = split("%%%\r\n%%%\r\nBody\r\n");
        assert_eq!(split.front_matter, Some(""));
        assert_eq!(split.body, "Body\r\n");
        assert_eq!(split.body_line, 3);
    }

    #[test]
    fn test_delimiter_must_be_alone_on_its_line() {
        let text = "%%% config\ntitle = \"X\"\n%%%\nBody";
        assert!(split(text).front_matter.is_none());
    }

    #[test]
    fn test_syntax_error_reports_document_position() {
        let text = "%%%\ntitle = \"X\"\nbroken line\n%%%\nBody";
        match extract(text) {
            Err(ConfigError::Syntax { line, column, .. }) => {
                assert_eq!(line, 3);
                assert!(column >= 1);
            }
            other => panic!("expected syntax error, got {:?}", other.map(|(f, _)| f)),
        }
    }

    #[test]
    fn test_body_keeps_later_delimiters() {
        let (_, split) = extract("%%%\n%%%\nA\n%%%\nB").unwrap();
        assert_eq!(split.body, "A\n%%%\nB");
    }
}
