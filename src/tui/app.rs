use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::controller::{Command, Controller, Transition};
use crate::error::NavigationError;
use crate::hooks::ProcessRunner;
use crate::sync::PageSync;
use crate::tui::syntax::SyntaxHighlighter;
use crate::tui::theme::Theme;

/// Interactive presentation state on top of the controller.
pub struct App<R: ProcessRunner, S: PageSync> {
    pub controller: Controller<R, S>,
    pub highlighter: SyntaxHighlighter,
    pub theme: Theme,
    pub content_scroll: u16,
    /// Digits typed so far for a page jump.
    pub pending_page: String,
    pub status_message: Option<String>, // Shown until the next command
    /// Set when a hook failure ended the presentation.
    pub failure: Option<NavigationError>,
}

impl<R: ProcessRunner, S: PageSync> App<R, S> {
    pub fn new(controller: Controller<R, S>) -> Self {
        Self {
            controller,
            highlighter: SyntaxHighlighter::new(),
            theme: Theme::default(),
            content_scroll: 0,
            pending_page: String::new(),
            status_message: None,
            failure: None,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.controller.is_terminated()
    }

    /// Maps a key press to a command or a view change.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.pending_page.push(c);
            }
            KeyCode::Enter if !self.pending_page.is_empty() => self.goto_pending(),
            KeyCode::Backspace if !self.pending_page.is_empty() => {
                self.pending_page.pop();
            }
            KeyCode::Esc if !self.pending_page.is_empty() => self.pending_page.clear(),

            KeyCode::Right
            | KeyCode::Enter
            | KeyCode::PageDown
            | KeyCode::Char(' ')
            | KeyCode::Char('l')
            | KeyCode::Char('n') => self.execute(Command::Next),
            KeyCode::Left
            | KeyCode::Backspace
            | KeyCode::PageUp
            | KeyCode::Char('h')
            | KeyCode::Char('p') => self.execute(Command::Previous),
            KeyCode::Home | KeyCode::Char('g') => self.execute(Command::First),
            KeyCode::End | KeyCode::Char('G') => self.execute(Command::Last),

            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(),

            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            _ => {}
        }
    }

    /// Runs a command and records its outcome for the status bar.
    pub fn execute(&mut self, command: Command) {
        self.pending_page.clear();
        match self.controller.execute(command) {
            Ok(transition) => {
                if transition.moved {
                    self.content_scroll = 0;
                }
                self.status_message = describe(&transition);
            }
            Err(e @ NavigationError::OutOfRange { .. }) => {
                self.status_message = Some(format!("✗ {}", e));
            }
            Err(NavigationError::Terminated) => {}
            Err(e) => {
                self.status_message = Some(format!("✗ {}", e));
                self.failure = Some(e);
            }
        }
    }

    fn goto_pending(&mut self) {
        // Digits only, so parsing fails only on overflow.
        let page = self.pending_page.parse().unwrap_or(usize::MAX);
        self.execute(Command::Goto(page));
    }

    pub fn scroll_down(&mut self) {
        self.content_scroll = self.content_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.content_scroll = self.content_scroll.saturating_sub(1);
    }

    /// Ends the presentation through the controller, running `finalize`.
    pub fn quit(&mut self) {
        self.pending_page.clear();
        if self.controller.is_terminated() {
            return;
        }
        self.execute(Command::Quit);
    }
}

/// Summarizes hook and sync problems of a transition, if any.
fn describe(transition: &Transition) -> Option<String> {
    let mut warnings = Vec::new();
    match &transition.hook {
        Some(Ok(status)) if !status.success() => {
            warnings.push(format!("hook exited with {}", status))
        }
        Some(Err(e)) => warnings.push(e.to_string()),
        _ => {}
    }
    if let Some(Err(e)) = &transition.sync {
        warnings.push(e.to_string());
    }
    if warnings.is_empty() {
        None
    } else {
        Some(format!("⚠ {}", warnings.join("; ")))
    }
}
