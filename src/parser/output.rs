//! Output types for page content and JSON listings
//!
//! Block-level content types are re-exported from turbovault-parser for
//! unified parsing with proper code block awareness.

use serde::{Deserialize, Serialize};

use super::pages::Page;

// Re-export content block types from turbovault-parser
pub use turbovault_parser::{ContentBlock as Block, InlineElement, ListItem};

/// Root structure for `--list -o json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationOutput {
    pub title: String,
    pub source: String,
    #[serde(rename = "pageCount")]
    pub page_count: usize,
    pub pages: Vec<PageOutput>,
}

/// One page in a JSON listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOutput {
    /// Page number (1-indexed)
    pub number: usize,
    /// Line number in source file (1-indexed)
    pub line: usize,
    /// First line of the page, heading markers removed
    pub headline: String,
    /// Number of markdown blocks on the page
    #[serde(rename = "blockCount")]
    pub block_count: usize,
    /// Raw markdown content
    pub raw: String,
}

impl From<&Page> for PageOutput {
    fn from(page: &Page) -> Self {
        Self {
            number: page.number(),
            line: page.start_line(),
            headline: page.headline().to_string(),
            block_count: page.blocks().len(),
            raw: page.source().to_string(),
        }
    }
}
