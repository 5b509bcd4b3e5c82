//! Presentation document parsing.
//!
//! This module strips the front matter from a presentation, splits the body
//! into pages, and parses each page into markdown blocks.
//!
//! Block parsing is delegated to `turbovault-parser` for code-block-aware
//! markdown support.

pub mod content;
mod document;
pub mod front_matter;
pub mod output;
pub mod pages;

pub use document::Document;
pub use output::{Block, InlineElement, PageOutput, PresentationOutput};
pub use pages::{Page, PageBreak, Pages};

/// Parse presentation text into a document.
///
/// The path is only used for identification; nothing is read from disk.
///
/// # Errors
///
/// Returns an error if the front matter is malformed.
pub fn parse_presentation(
    path: impl Into<std::path::PathBuf>,
    content: &str,
) -> Result<Document, crate::error::ConfigError> {
    Document::parse(path.into(), content.to_string())
}
