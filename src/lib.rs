//! # slidehook
//!
//! A markdown presentation library that runs external commands as the
//! presentation moves and tells a PDF viewer which page is showing.
//!
//! A presentation is a markdown file that may start with a `%%%`-delimited
//! TOML block. The body is split into pages at thematic breaks (or headings
//! of a configured level). While presenting, hooks run at three points:
//! `initialize`, `update` after every page change, and `finalize`. The
//! current page number can also be written to a named pipe.
//!
//! ## Example
//!
//! ```rust
//! use slidehook::parser::parse_presentation;
//! use slidehook::Config;
//!
//! let markdown = r#"%%%
//! title = "Release notes"
//!
//! [commands.update]
//! binary = "pdf-export"
//! arguments = ["${presentation.path}", "${page.current}"]
//! %%%
//! # What's new
//! ---
//! # Thanks
//! "#;
//!
//! let document = parse_presentation("notes.md", markdown).unwrap();
//! let config = Config::from(document.front_matter().cloned().unwrap_or_default());
//! assert_eq!(config.title, "Release notes");
//! assert_eq!(document.pages(&config.page_break).count(), 2);
//! ```

/// Configuration layering: user file, front matter and command line.
pub mod config;

/// The presentation state machine.
pub mod controller;

pub mod error;

/// Line-oriented front end reading commands from stdin.
pub mod headless;

/// External command hooks and argument templates.
pub mod hooks;

pub mod logging;

/// Front matter extraction, page splitting and block parsing.
pub mod parser;

pub mod signals;

/// Page-number announcements over a named pipe.
pub mod sync;

/// TUI module for the interactive presentation.
///
/// Provides the App and UI rendering on top of the controller.
pub mod tui;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigFragment};
pub use controller::{Command, Controller, State, Transition};
pub use error::{ConfigError, HookError, LoadError, NavigationError, SyncError};
pub use hooks::{HookName, ProcessRunner, SystemRunner};
pub use parser::{Document, Page, PageBreak};
pub use sync::{PageSync, SubscriberPolicy};
pub use tui::App;
