//! # slidehook
//!
//! Present a markdown document page by page while keeping an exported PDF
//! and a PDF viewer in step.
//!
//! ## Usage
//!
//! Launch the interactive presentation:
//! ```sh
//! slidehook talk.md
//! ```
//!
//! List the pages:
//! ```sh
//! slidehook --list talk.md
//! ```
//!
//! Drive the presentation from a script:
//! ```sh
//! printf 'next\ngoto 4\nquit\n' | slidehook --headless talk.md
//! ```

mod cli;

use std::io::{self, BufReader, Write};

use clap::Parser as ClapParser;
use cli::{Cli, OutputFormat};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use serde::Serialize;
use slidehook::config::SyncFragment;
use slidehook::hooks::{Bindings, HookName, Variable, interpolate};
use slidehook::parser::{PageOutput, PresentationOutput};
use slidehook::{App, Config, ConfigFragment, Controller, Document, PageBreak, SystemRunner, headless};
use slidehook::{logging, signals, sync, tui};
use tracing::debug;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();
    let _log_guard = logging::init(args.verbose, args.log_file.as_deref(), args.is_interactive());

    let document = Document::load(&args.file)?;
    let config = resolve_config(&args, &document)?;
    debug!(?config, "resolved configuration");

    if args.count {
        println!("{}", document.pages(&config.page_break).count());
        return Ok(());
    }
    if args.list {
        return print_pages(&document, &config, args.output);
    }
    if args.check {
        return check(&document, &config, args.output);
    }

    signals::install().wrap_err("failed to install signal handlers")?;
    let channel = sync::open(&config.sync)?;
    let controller = Controller::start(&document, config, SystemRunner, channel)?;

    if args.headless {
        let mut controller = controller;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        headless::run(
            &mut controller,
            BufReader::new(io::stdin()),
            &mut out,
            signals::flag(),
        )?;
        return Ok(());
    }

    let mut terminal = tui::init_terminal().wrap_err("failed to initialize the terminal")?;
    let result = tui::run(&mut terminal, App::new(controller));
    tui::restore_terminal();
    result
}

/// Layers the user configuration, the front matter and command-line overrides.
fn resolve_config(args: &Cli, document: &Document) -> Result<Config> {
    let user = ConfigFragment::load_user()?;
    let front_matter = document.front_matter().cloned().unwrap_or_default();
    let overrides = ConfigFragment {
        title: args.title.clone(),
        sync: SyncFragment {
            path: args.sync.clone(),
            ..Default::default()
        },
        ..Default::default()
    };
    Ok(Config::layered([user, front_matter, overrides]))
}

fn print_pages(document: &Document, config: &Config, format: OutputFormat) -> Result<()> {
    let pages: Vec<PageOutput> = document
        .pages(&config.page_break)
        .map(|page| PageOutput::from(&page))
        .collect();

    match format {
        OutputFormat::Plain => {
            let mut out = io::stdout().lock();
            for page in &pages {
                let headline = if page.headline.is_empty() {
                    "(empty)"
                } else {
                    page.headline.as_str()
                };
                writeln!(out, "{:>3}  line {:<5} {}", page.number, page.line, headline)?;
            }
        }
        OutputFormat::Json => {
            let output = PresentationOutput {
                title: config.title.clone(),
                source: document.path.display().to_string(),
                page_count: pages.len(),
                pages,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Result of `--check`.
#[derive(Serialize)]
struct CheckOutput {
    source: String,
    title: String,
    #[serde(rename = "pageCount")]
    page_count: usize,
    #[serde(rename = "pageBreak")]
    page_break: String,
    hooks: Vec<HookCheck>,
    sync: Option<String>,
    valid: bool,
}

#[derive(Serialize)]
struct HookCheck {
    hook: HookName,
    binary: String,
    /// Arguments as they would be passed on page 1.
    arguments: Vec<String>,
    error: Option<String>,
}

fn check(document: &Document, config: &Config, format: OutputFormat) -> Result<()> {
    let page_count = document.pages(&config.page_break).count();
    let path = document
        .path
        .canonicalize()
        .unwrap_or_else(|_| document.path.clone());
    let directory = path.parent().map(|p| p.display().to_string()).unwrap_or_default();
    let bindings = Bindings::new()
        .with(Variable::PresentationPath, path.display())
        .with(Variable::PresentationDirectory, directory)
        .with(Variable::PresentationTitle, &config.title)
        .with(Variable::PageCurrent, 1)
        .with(Variable::PageCount, page_count);

    let hooks: Vec<HookCheck> = HookName::ALL
        .into_iter()
        .filter_map(|hook| config.commands.get(hook).map(|command| (hook, command)))
        .map(|(hook, command)| {
            let resolved: Result<Vec<String>, String> = command
                .arguments
                .iter()
                .map(|template| interpolate(template, &bindings))
                .collect();
            let (arguments, error) = match resolved {
                Ok(arguments) => (arguments, None),
                Err(token) => (
                    command.arguments.clone(),
                    Some(format!("unbound variable `${{{}}}`", token)),
                ),
            };
            HookCheck {
                hook,
                binary: command.binary.clone(),
                arguments,
                error,
            }
        })
        .collect();

    let output = CheckOutput {
        source: path.display().to_string(),
        title: config.title.clone(),
        page_count,
        page_break: describe_page_break(&config.page_break),
        valid: hooks.iter().all(|hook| hook.error.is_none()),
        hooks,
        sync: config.sync.path.as_ref().map(|p| {
            let timeout = config
                .sync
                .timeout
                .map(|t| format!(", timeout {}ms", t.as_millis()))
                .unwrap_or_default();
            format!("{} ({:?}{})", p.display(), config.sync.subscriber, timeout)
        }),
    };

    match format {
        OutputFormat::Plain => print_check(&output)?,
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }

    if output.valid {
        Ok(())
    } else {
        Err(eyre!("{} has invalid hook arguments", output.source))
    }
}

fn print_check(output: &CheckOutput) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", output.source)?;
    writeln!(out, "  title:      {}", output.title)?;
    writeln!(out, "  pages:      {}", output.page_count)?;
    writeln!(out, "  page break: {}", output.page_break)?;
    if output.hooks.is_empty() {
        writeln!(out, "  hooks:      none")?;
    }
    for hook in &output.hooks {
        let status = match &hook.error {
            Some(error) => format!("✗ {}", error),
            None => "✓".to_string(),
        };
        writeln!(
            out,
            "  {:<11} {} {} {}",
            format!("{}:", hook.hook),
            hook.binary,
            hook.arguments.join(" "),
            status
        )?;
    }
    writeln!(
        out,
        "  sync:       {}",
        output.sync.as_deref().unwrap_or("none")
    )?;
    Ok(())
}

fn describe_page_break(page_break: &PageBreak) -> String {
    match page_break {
        PageBreak::ThematicBreak => "thematic break".to_string(),
        PageBreak::Heading { level } => format!("heading level {}", level),
    }
}
