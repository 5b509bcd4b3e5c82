//! The presentation controller.
//!
//! The controller owns the navigation state and sequences everything else:
//! it splits the document into pages, runs the lifecycle hooks and announces
//! page changes on the sync channel. Front ends (the TUI and headless mode)
//! only translate input into [`Command`]s.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{HookError, LoadError, NavigationError, ParseCommandError, SyncError};
use crate::hooks::{
    Bindings, Dispatcher, ExitStatus, HookFailurePolicy, HookName, ProcessRunner, Variable,
};
use crate::parser::{Document, Page};
use crate::sync::PageSync;

/// Lifecycle of a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Loading,
    Ready,
    Terminating,
    Terminated,
}

/// A navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    First,
    Last,
    /// Go to a 1-based page number.
    Goto(usize),
    Quit,
}

impl FromStr for Command {
    type Err = ParseCommandError;

    /// Parses the textual form used by headless mode.
    ///
    /// Accepted: `next`/`n`, `previous`/`prev`/`p`, `first`, `last`,
    /// `goto N`/`g N`, a bare page number, `quit`/`q`. Case is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = || ParseCommandError(input.to_string());
        let words: Vec<String> = input
            .split_whitespace()
            .map(str::to_ascii_lowercase)
            .collect();

        match words.as_slice() {
            [word] => match word.as_str() {
                "next" | "n" => Ok(Command::Next),
                "previous" | "prev" | "p" => Ok(Command::Previous),
                "first" => Ok(Command::First),
                "last" => Ok(Command::Last),
                "quit" | "q" => Ok(Command::Quit),
                number => number.parse().map(Command::Goto).map_err(|_| invalid()),
            },
            [word, number] if word == "goto" || word == "g" => {
                number.parse().map(Command::Goto).map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Next => f.write_str("next"),
            Command::Previous => f.write_str("previous"),
            Command::First => f.write_str("first"),
            Command::Last => f.write_str("last"),
            Command::Goto(page) => write!(f, "goto {}", page),
            Command::Quit => f.write_str("quit"),
        }
    }
}

/// The result of an accepted command.
#[derive(Debug)]
pub struct Transition {
    /// The current page after the command.
    pub page: usize,
    /// Whether the current page changed.
    pub moved: bool,
    /// Outcome of the hook run by this command, if a configured hook ran.
    pub hook: Option<Result<ExitStatus, HookError>>,
    /// Outcome of the page announcement, if one was attempted.
    pub sync: Option<Result<(), SyncError>>,
}

impl Transition {
    fn unchanged(page: usize) -> Self {
        Self {
            page,
            moved: false,
            hook: None,
            sync: None,
        }
    }

    /// Returns true if the hook failed or the announcement did not reach a viewer.
    pub fn has_warnings(&self) -> bool {
        let hook_failed = match &self.hook {
            Some(Ok(status)) => !status.success(),
            Some(Err(_)) => true,
            None => false,
        };
        hook_failed || matches!(self.sync, Some(Err(_)))
    }
}

/// Owns the presentation state and sequences hooks and page sync.
///
/// Dropping a controller that is still [`State::Ready`] finalizes it.
pub struct Controller<R: ProcessRunner, S: PageSync> {
    state: State,
    current: usize,
    pages: Vec<Page>,
    path: PathBuf,
    directory: PathBuf,
    title: String,
    dispatcher: Dispatcher<R>,
    sync: S,
    on_failure: HookFailurePolicy,
}

impl<R: ProcessRunner, S: PageSync> Controller<R, S> {
    /// Splits the document, runs the `initialize` hook and enters [`State::Ready`]
    /// on page 1.
    ///
    /// The sync channel is expected to be open already; nothing is published
    /// until the first page change.
    ///
    /// # Errors
    ///
    /// Fails if the document path cannot be resolved, or if `initialize`
    /// fails under the `abort` policy. Finalize does not run in that case.
    pub fn start(document: &Document, config: Config, runner: R, sync: S) -> Result<Self, LoadError> {
        let path = resolve_path(&document.path)?;
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        let pages: Vec<Page> = document.pages(&config.page_break).collect();

        let mut controller = Self {
            state: State::Loading,
            current: 1,
            pages,
            path,
            title: config.title,
            dispatcher: Dispatcher::new(
                config.commands,
                directory.clone(),
                config.hooks.output,
                runner,
            ),
            directory,
            sync,
            on_failure: config.hooks.on_failure,
        };
        info!(
            path = %controller.path.display(),
            pages = controller.pages.len(),
            "presentation loaded"
        );

        let outcome = controller.dispatch(HookName::Initialize);
        if let Some(reason) = controller.escalate(HookName::Initialize, outcome.as_ref()) {
            controller.sync.close();
            controller.state = State::Terminated;
            return Err(LoadError::HookFailed {
                hook: HookName::Initialize,
                reason,
            });
        }

        controller.state = State::Ready;
        Ok(controller)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == State::Terminated
    }

    /// The current 1-based page number.
    pub fn current(&self) -> usize {
        self.current
    }

    /// The current page.
    pub fn page(&self) -> &Page {
        &self.pages[self.current - 1]
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The canonical path of the presentation.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs a navigation command.
    pub fn execute(&mut self, command: Command) -> Result<Transition, NavigationError> {
        debug!(%command, page = self.current, "command");
        match command {
            Command::Next => self.next(),
            Command::Previous => self.previous(),
            Command::First => self.first(),
            Command::Last => self.last(),
            Command::Goto(page) => self.goto(page),
            Command::Quit => {
                let hook = self.quit().ok_or(NavigationError::Terminated)?;
                Ok(Transition {
                    page: self.current,
                    moved: false,
                    hook: self
                        .dispatcher
                        .is_configured(HookName::Finalize)
                        .then_some(hook),
                    sync: None,
                })
            }
        }
    }

    /// Moves to the following page. Stays put on the last page.
    pub fn next(&mut self) -> Result<Transition, NavigationError> {
        self.ensure_ready()?;
        if self.current == self.pages.len() {
            return Ok(Transition::unchanged(self.current));
        }
        self.goto(self.current + 1)
    }

    /// Moves to the preceding page. Stays put on the first page.
    pub fn previous(&mut self) -> Result<Transition, NavigationError> {
        self.ensure_ready()?;
        if self.current == 1 {
            return Ok(Transition::unchanged(self.current));
        }
        self.goto(self.current - 1)
    }

    pub fn first(&mut self) -> Result<Transition, NavigationError> {
        self.goto(1)
    }

    pub fn last(&mut self) -> Result<Transition, NavigationError> {
        self.goto(self.pages.len())
    }

    /// Moves to `page`, runs `update` and announces the new page.
    ///
    /// # Errors
    ///
    /// [`NavigationError::OutOfRange`] leaves the state untouched and runs
    /// nothing. [`NavigationError::HookFailed`] means `update` failed under
    /// the `abort` policy; the presentation has been finalized.
    pub fn goto(&mut self, page: usize) -> Result<Transition, NavigationError> {
        self.ensure_ready()?;
        if page == 0 || page > self.pages.len() {
            return Err(NavigationError::OutOfRange {
                requested: page,
                page_count: self.pages.len(),
            });
        }
        if page == self.current {
            return Ok(Transition::unchanged(page));
        }

        self.current = page;
        let hook = self.dispatch(HookName::Update);
        if let Some(reason) = self.escalate(HookName::Update, hook.as_ref()) {
            self.quit();
            return Err(NavigationError::HookFailed {
                hook: HookName::Update,
                reason,
            });
        }

        let sync = self.sync.publish(page);
        if let Err(e) = &sync {
            warn!(page, "page sync skipped: {}", e);
        }

        Ok(Transition {
            page,
            moved: true,
            hook: self.dispatcher.is_configured(HookName::Update).then_some(hook),
            sync: Some(sync),
        })
    }

    /// Ends the presentation: runs `finalize` and closes the sync channel.
    ///
    /// Returns `None` if the presentation was not running, so `finalize`
    /// runs at most once.
    pub fn quit(&mut self) -> Option<Result<ExitStatus, HookError>> {
        if self.state != State::Ready {
            return None;
        }
        self.state = State::Terminating;
        info!(page = self.current, "finalizing presentation");

        let outcome = self.dispatch(HookName::Finalize);
        // Nothing left to abort; the failure is only logged.
        self.escalate(HookName::Finalize, outcome.as_ref());
        self.sync.close();

        self.state = State::Terminated;
        Some(outcome)
    }

    fn ensure_ready(&self) -> Result<(), NavigationError> {
        match self.state {
            State::Ready => Ok(()),
            _ => Err(NavigationError::Terminated),
        }
    }

    fn bindings(&self) -> Bindings {
        Bindings::new()
            .with(Variable::PresentationPath, self.path.display())
            .with(Variable::PresentationDirectory, self.directory.display())
            .with(Variable::PresentationTitle, &self.title)
            .with(Variable::PageCurrent, self.current)
            .with(Variable::PageCount, self.pages.len())
    }

    fn dispatch(&self, hook: HookName) -> Result<ExitStatus, HookError> {
        self.dispatcher.dispatch(hook, &self.bindings())
    }

    /// Logs a failed hook and decides whether the failure stops the presentation.
    ///
    /// Returns the failure reason when it does. Unbound variables never do.
    fn escalate(
        &self,
        hook: HookName,
        outcome: Result<&ExitStatus, &HookError>,
    ) -> Option<String> {
        let reason = match outcome {
            Ok(status) if status.success() => return None,
            Ok(status) => {
                warn!(%hook, %status, "hook exited unsuccessfully");
                status.to_string()
            }
            Err(e) if matches!(e, HookError::UnboundVariable { .. }) => {
                warn!(%hook, "hook skipped: {}", e);
                return None;
            }
            Err(e) => {
                warn!(%hook, "hook failed: {}", e);
                e.to_string()
            }
        };
        (self.on_failure == HookFailurePolicy::Abort).then_some(reason)
    }
}

impl<R: ProcessRunner, S: PageSync> Drop for Controller<R, S> {
    fn drop(&mut self) {
        if self.state == State::Ready {
            debug!("controller dropped while running");
            self.quit();
        }
    }
}

/// Canonicalizes the document path, falling back to an absolute path for
/// documents that were never read from disk.
fn resolve_path(path: &Path) -> Result<PathBuf, LoadError> {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFragment;
    use crate::hooks::testing::RecordingRunner;
    use crate::parser::parse_presentation;
    use crate::sync::testing::MemorySync;

    const THREE_PAGES: &str = "A\n---\nB\n---\nC";

    const HOOKS: &str = r#"
title = "Demo"

[commands.initialize]
binary = "init"
arguments = ["${page.count}"]

[commands.update]
binary = "viewer"
arguments = ["update", "${page.current}"]

[commands.finalize]
binary = "done"
"#;

    fn config(toml: &str) -> Config {
        ConfigFragment::from_toml(toml, "test", 0).unwrap().into()
    }

    fn start_with(
        toml: &str,
        runner: RecordingRunner,
        sync: MemorySync,
    ) -> Result<Controller<RecordingRunner, MemorySync>, LoadError> {
        let document = parse_presentation("talk.md", THREE_PAGES).unwrap();
        Controller::start(&document, config(toml), runner, sync)
    }

    fn start(toml: &str) -> (Controller<RecordingRunner, MemorySync>, RecordingRunner, MemorySync) {
        let runner = RecordingRunner::default();
        let sync = MemorySync::default();
        let controller = start_with(toml, runner.clone(), sync.clone()).unwrap();
        (controller, runner, sync)
    }

    #[test]
    fn test_start_runs_initialize_on_first_page() {
        let (controller, runner, sync) = start(HOOKS);

        assert_eq!(controller.state(), State::Ready);
        assert_eq!(controller.current(), 1);
        assert_eq!(controller.page_count(), 3);
        assert_eq!(controller.page().source(), "A");
        assert_eq!(controller.title(), "Demo");
        assert!(controller.path().is_absolute());

        assert_eq!(runner.hooks(), [HookName::Initialize]);
        assert_eq!(runner.invocations.borrow()[0].arguments, ["3"]);
        assert!(sync.published.borrow().is_empty());
    }

    #[test]
    fn test_navigation_updates_and_publishes() {
        let (mut controller, runner, sync) = start(HOOKS);

        let transition = controller.next().unwrap();
        assert!(transition.moved);
        assert_eq!(transition.page, 2);
        assert!(matches!(transition.hook, Some(Ok(status)) if status.success()));
        assert!(matches!(transition.sync, Some(Ok(()))));
        assert!(!transition.has_warnings());

        controller.goto(3).unwrap();
        controller.previous().unwrap();

        assert_eq!(controller.current(), 2);
        assert_eq!(*sync.published.borrow(), [2, 3, 2]);
        let updates: Vec<Vec<String>> = runner
            .invocations
            .borrow()
            .iter()
            .filter(|i| i.hook == HookName::Update)
            .map(|i| i.arguments.clone())
            .collect();
        assert_eq!(updates, [["update", "2"], ["update", "3"], ["update", "2"]]);
    }

    #[test]
    fn test_hooks_run_in_presentation_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talk.md");
        std::fs::write(&path, THREE_PAGES).unwrap();
        let document = Document::load(&path).unwrap();
        let runner = RecordingRunner::default();

        let controller =
            Controller::start(&document, config(HOOKS), runner.clone(), MemorySync::default())
                .unwrap();

        let canonical = path.canonicalize().unwrap();
        assert_eq!(controller.path(), canonical);
        assert_eq!(
            runner.invocations.borrow()[0].working_dir,
            canonical.parent().unwrap()
        );
    }

    #[test]
    fn test_boundaries_are_unchanged_without_dispatch() {
        let (mut controller, runner, sync) = start(HOOKS);

        let transition = controller.previous().unwrap();
        assert!(!transition.moved);
        assert_eq!(transition.page, 1);

        controller.last().unwrap();
        let transition = controller.next().unwrap();
        assert!(!transition.moved);
        assert_eq!(transition.page, 3);

        assert_eq!(runner.count(HookName::Update), 1);
        assert_eq!(*sync.published.borrow(), [3]);
    }

    #[test]
    fn test_goto_out_of_range_leaves_state() {
        let (mut controller, runner, sync) = start(HOOKS);
        controller.goto(2).unwrap();

        for requested in [0, 4] {
            match controller.goto(requested) {
                Err(NavigationError::OutOfRange {
                    requested: r,
                    page_count,
                }) => {
                    assert_eq!(r, requested);
                    assert_eq!(page_count, 3);
                }
                other => panic!("unexpected result {other:?}"),
            }
            assert_eq!(controller.current(), 2);
        }

        assert_eq!(runner.count(HookName::Update), 1);
        assert_eq!(*sync.published.borrow(), [2]);
    }

    #[test]
    fn test_first_and_last() {
        let (mut controller, _, sync) = start("");
        controller.last().unwrap();
        assert_eq!(controller.current(), 3);
        controller.first().unwrap();
        assert_eq!(controller.current(), 1);
        assert_eq!(*sync.published.borrow(), [3, 1]);
    }

    #[test]
    fn test_initialize_and_finalize_run_exactly_once() {
        let (mut controller, runner, sync) = start(HOOKS);

        for command in [
            Command::Next,
            Command::Goto(9),
            Command::Last,
            Command::Next,
            Command::First,
            Command::Previous,
        ] {
            let _ = controller.execute(command);
        }
        assert!(controller.quit().is_some());
        assert!(controller.quit().is_none());
        assert!(matches!(
            controller.execute(Command::Quit),
            Err(NavigationError::Terminated)
        ));
        drop(controller);

        assert_eq!(runner.count(HookName::Initialize), 1);
        assert_eq!(runner.count(HookName::Finalize), 1);
        assert_eq!(runner.hooks().last(), Some(&HookName::Finalize));
        assert!(*sync.closed.borrow());
    }

    #[test]
    fn test_navigation_rejected_after_quit() {
        let (mut controller, runner, _) = start(HOOKS);
        controller.execute(Command::Quit).unwrap();

        assert_eq!(controller.state(), State::Terminated);
        assert!(matches!(controller.next(), Err(NavigationError::Terminated)));
        assert!(matches!(controller.goto(2), Err(NavigationError::Terminated)));
        assert_eq!(runner.count(HookName::Update), 0);
    }

    #[test]
    fn test_drop_finalizes_running_presentation() {
        let (controller, runner, sync) = start(HOOKS);
        drop(controller);

        assert_eq!(runner.count(HookName::Finalize), 1);
        assert!(*sync.closed.borrow());
    }

    #[test]
    fn test_nonzero_exit_warns_by_default() {
        let runner =
            RecordingRunner::default().exit_with(HookName::Update, ExitStatus::from_code(1));
        let mut controller = start_with(HOOKS, runner, MemorySync::default()).unwrap();

        let transition = controller.next().unwrap();
        assert!(transition.moved);
        assert!(transition.has_warnings());
        assert_eq!(controller.state(), State::Ready);
    }

    #[test]
    fn test_abort_policy_quits_on_failed_update() {
        let toml = format!("{HOOKS}\n[hooks]\non_failure = \"abort\"\n");
        let runner =
            RecordingRunner::default().exit_with(HookName::Update, ExitStatus::from_code(2));
        let mut controller = start_with(&toml, runner.clone(), MemorySync::default()).unwrap();

        match controller.next() {
            Err(NavigationError::HookFailed { hook, reason }) => {
                assert_eq!(hook, HookName::Update);
                assert_eq!(reason, "exit code 2");
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(controller.is_terminated());
        assert_eq!(runner.count(HookName::Finalize), 1);
    }

    #[test]
    fn test_abort_policy_fails_startup_on_failed_initialize() {
        let toml = format!("{HOOKS}\n[hooks]\non_failure = \"abort\"\n");
        let runner =
            RecordingRunner::default().exit_with(HookName::Initialize, ExitStatus::from_code(1));
        let sync = MemorySync::default();

        let result = start_with(&toml, runner.clone(), sync.clone());
        assert!(matches!(
            result,
            Err(LoadError::HookFailed {
                hook: HookName::Initialize,
                ..
            })
        ));
        assert_eq!(runner.count(HookName::Finalize), 0);
        assert!(*sync.closed.borrow());
    }

    #[test]
    fn test_unbound_variable_is_not_fatal() {
        let toml = r#"
[hooks]
on_failure = "abort"

[commands.update]
binary = "viewer"
arguments = ["${slide.number}"]
"#;
        let (mut controller, runner, sync) = start(toml);

        let transition = controller.next().unwrap();
        assert!(matches!(
            transition.hook,
            Some(Err(HookError::UnboundVariable { .. }))
        ));
        assert_eq!(controller.current(), 2);
        assert_eq!(controller.state(), State::Ready);
        assert!(runner.invocations.borrow().is_empty());
        assert_eq!(*sync.published.borrow(), [2]);
    }

    #[test]
    fn test_missing_viewer_is_reported_but_page_changes() {
        let sync = MemorySync {
            no_subscriber: true,
            ..Default::default()
        };
        let mut controller = start_with("", RecordingRunner::default(), sync).unwrap();

        let transition = controller.next().unwrap();
        assert!(matches!(
            transition.sync,
            Some(Err(SyncError::NoSubscriber { .. }))
        ));
        assert!(transition.hook.is_none());
        assert_eq!(controller.current(), 2);
    }

    #[test]
    fn test_single_page_document() {
        let document = parse_presentation("one.md", "Only page").unwrap();
        let mut controller = Controller::start(
            &document,
            Config::default(),
            RecordingRunner::default(),
            MemorySync::default(),
        )
        .unwrap();

        assert_eq!(controller.page_count(), 1);
        assert!(!controller.next().unwrap().moved);
        assert!(matches!(
            controller.goto(2),
            Err(NavigationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_commands() {
        let cases = [
            ("next", Command::Next),
            ("n", Command::Next),
            ("  Previous ", Command::Previous),
            ("prev", Command::Previous),
            ("p", Command::Previous),
            ("first", Command::First),
            ("last", Command::Last),
            ("goto 4", Command::Goto(4)),
            ("g 2", Command::Goto(2)),
            ("7", Command::Goto(7)),
            ("0", Command::Goto(0)),
            ("QUIT", Command::Quit),
            ("q", Command::Quit),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<Command>(), Ok(expected), "input {input:?}");
        }
    }

    #[test]
    fn test_parse_invalid_commands() {
        for input in ["", "jump", "goto", "goto x", "goto 1 2", "-1", "next please"] {
            assert!(input.parse::<Command>().is_err(), "input {input:?}");
        }
        assert_eq!(
            "jump".parse::<Command>(),
            Err(ParseCommandError("jump".to_string()))
        );
    }
}
