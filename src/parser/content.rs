//! Content parsing for presentation pages
//!
//! This module wraps turbovault-parser's block parsing functionality,
//! providing code-block-aware markdown parsing for a single page.
//!
//! ## Key Features
//! - Proper code block handling (markup inside fences is left alone)
//! - Full GFM support: tables, strikethrough, task lists

use super::output::Block;

/// Parse markdown content into structured blocks.
///
/// # Arguments
///
/// * `markdown` - The markdown content of one page
/// * `start_line` - Starting line number for position tracking
///
/// # Returns
///
/// A vector of parsed content blocks.
pub fn parse_content(markdown: &str, start_line: usize) -> Vec<Block> {
    turbovault_parser::parse_blocks_from_line(markdown, start_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paragraph() {
        let blocks = parse_content("Welcome to the talk.", 1);

        assert_eq!(blocks.len(), 1);
        if let Block::Paragraph { content, .. } = &blocks[0] {
            assert_eq!(content, "Welcome to the talk.");
        } else {
            panic!("Expected Paragraph block");
        }
    }

    #[test]
    fn test_parse_slide_heading() {
        let blocks = parse_content("# Agenda", 1);

        assert_eq!(blocks.len(), 1);
        if let Block::Heading { level, content, .. } = &blocks[0] {
            assert_eq!(*level, 1);
            assert_eq!(content, "Agenda");
        } else {
            panic!("Expected Heading block");
        }
    }

    #[test]
    fn test_parse_code_block() {
        let blocks = parse_content("```rust\nfn main() {}\n```", 1);

        assert_eq!(blocks.len(), 1);
        if let Block::Code {
            language, content, ..
        } = &blocks[0]
        {
            assert_eq!(language.as_deref(), Some("rust"));
            assert_eq!(content, "fn main() {}");
        } else {
            panic!("Expected Code block");
        }
    }

    #[test]
    fn test_parse_bullet_slide() {
        let blocks = parse_content("# Goals\n\n- ship\n- measure", 1);

        assert_eq!(blocks.len(), 2);
        if let Block::List { ordered, items } = &blocks[1] {
            assert!(!ordered);
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].content, "ship");
        } else {
            panic!("Expected List block");
        }
    }
}
