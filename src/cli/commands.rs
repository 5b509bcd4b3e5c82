use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "slidehook")]
#[command(version)]
#[command(about = "A markdown presentation tool that drives external converters and PDF viewers")]
#[command(
    long_about = "slidehook - present a markdown document page by page in the terminal.\n\n\
    The document may start with a %%%-delimited TOML block configuring the title,\n\
    the page break, hook commands run on initialize/update/finalize, and a named\n\
    pipe that receives the current page number for a companion PDF viewer.\n\n\
    Examples:\n  \
    slidehook talk.md                  # Interactive presentation\n  \
    slidehook --list talk.md           # List pages\n  \
    slidehook --check -o json talk.md  # Validate document and configuration\n  \
    echo next | slidehook --headless talk.md"
)]
pub struct Cli {
    /// Presentation file (markdown)
    pub file: PathBuf,

    /// Read navigation commands from stdin instead of the TUI
    ///
    /// One command per line: next (n), previous (prev, p), first, last,
    /// goto N (g N), a bare page number, or quit (q).
    /// The current page is printed after each command.
    #[arg(long = "headless", conflicts_with_all = ["list", "count", "check"])]
    pub headless: bool,

    /// List pages with their start line and headline (non-interactive)
    #[arg(short = 'l', long = "list", conflicts_with_all = ["count", "check"])]
    pub list: bool,

    /// Print the number of pages (non-interactive)
    #[arg(long = "count", conflicts_with = "check")]
    pub count: bool,

    /// Validate the document and configuration, then print a summary
    ///
    /// No hooks are run and no pipe is opened.
    #[arg(long = "check")]
    pub check: bool,

    /// Output format for --list and --check
    #[arg(short = 'o', long = "output", default_value = "plain")]
    pub output: OutputFormat,

    /// Named pipe for page sync, overriding `sync.path`
    #[arg(long = "sync", value_name = "PATH")]
    pub sync: Option<PathBuf>,

    /// Presentation title, overriding `title`
    #[arg(long = "title", value_name = "TITLE")]
    pub title: Option<String>,

    /// Write logs to this file
    ///
    /// The TUI logs to the cache directory by default since it owns the terminal.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Returns true when the TUI will run.
    pub fn is_interactive(&self) -> bool {
        !(self.headless || self.list || self.count || self.check)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// JSON output
    Json,
}
