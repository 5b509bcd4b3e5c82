use std::path::{Path, PathBuf};

use crate::config::ConfigFragment;
use crate::error::{ConfigError, LoadError};

use super::front_matter;
use super::pages::{PageBreak, Pages, pages};

/// A loaded presentation document.
///
/// The text is kept as read; the front matter is parsed once and the body is
/// addressed by offset.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub content: String,
    front_matter: Option<ConfigFragment>,
    body_offset: usize,
    body_line: usize,
}

impl Document {
    /// Reads and parses a presentation file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(path.to_path_buf(), content)?)
    }

    /// Parses presentation text that has already been read.
    ///
    /// A relative `sync.path` in the front matter is taken relative to the
    /// document's directory.
    pub fn parse(path: PathBuf, content: String) -> Result<Self, ConfigError> {
        let (front_matter, split) = front_matter::extract(&content)?;
        let base = path.parent().unwrap_or(Path::new(""));
        let front_matter = front_matter.map(|fragment| fragment.relative_to(base));
        let body_offset = content.len() - split.body.len();
        let body_line = split.body_line;
        Ok(Self {
            path,
            front_matter,
            body_offset,
            body_line,
            content,
        })
    }

    /// The configuration embedded in the document, if any.
    pub fn front_matter(&self) -> Option<&ConfigFragment> {
        self.front_matter.as_ref()
    }

    /// The document text after the front matter.
    pub fn body(&self) -> &str {
        &self.content[self.body_offset..]
    }

    /// The 1-based line on which the body starts.
    pub fn body_line(&self) -> usize {
        self.body_line
    }

    /// Lazily splits the body into pages.
    pub fn pages<'a>(&'a self, condition: &'a PageBreak) -> Pages<'a> {
        pages(self.body(), condition, self.body_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_front_matter() {
        let doc = Document::parse(
            "talk.md".into(),
            "%%%\ntitle = \"Talk\"\n%%%\n# One\n---\n# Two\n".to_string(),
        )
        .unwrap();

        assert_eq!(doc.front_matter().unwrap().title.as_deref(), Some("Talk"));
        assert_eq!(doc.body(), "# One\n---\n# Two\n");
        assert_eq!(doc.body_line(), 4);

        let condition = PageBreak::default();
        let pages: Vec<_> = doc.pages(&condition).collect();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].start_line(), 4);
        assert_eq!(pages[1].start_line(), 6);
    }

    #[test]
    fn test_relative_sync_path_follows_document() {
        let doc = Document::parse(
            PathBuf::from("decks").join("talk.md"),
            "%%%\n[sync]\npath = \"viewer.fifo\"\n%%%\nA\n".to_string(),
        )
        .unwrap();
        assert_eq!(
            doc.front_matter().unwrap().sync.path,
            Some(PathBuf::from("decks").join("viewer.fifo"))
        );

        let doc = Document::parse(
            "talk.md".into(),
            "%%%\n[sync]\npath = \"/tmp/viewer.fifo\"\n%%%\nA\n".to_string(),
        )
        .unwrap();
        assert_eq!(
            doc.front_matter().unwrap().sync.path,
            Some(PathBuf::from("/tmp/viewer.fifo"))
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Document::load(Path::new("does-not-exist.md"));
        assert!(matches!(result, Err(LoadError::Read { .. })));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.md");
        std::fs::write(&path, "A\n***\nB").unwrap();

        let doc = Document::load(&path).unwrap();
        assert!(doc.front_matter().is_none());
        assert_eq!(doc.pages(&PageBreak::default()).count(), 2);
    }
}
