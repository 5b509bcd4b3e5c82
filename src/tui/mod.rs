mod app;
mod syntax;
pub mod theme;
mod ui;

pub use app::App;
pub use syntax::SyntaxHighlighter;
pub use theme::Theme;

use std::io::{self, Stdout, stdout};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;

use crate::hooks::ProcessRunner;
use crate::signals;
use crate::sync::PageSync;

pub type PresentationTerminal = Terminal<CrosstermBackend<Stdout>>;

/// How long to wait for a key before checking for termination signals.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Switches to raw mode and the alternate screen.
pub fn init_terminal() -> io::Result<PresentationTerminal> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen).inspect_err(|_| {
        disable_raw_mode().ok();
    })?;
    Terminal::new(CrosstermBackend::new(stdout())).inspect_err(|_| {
        restore_terminal();
    })
}

/// Leaves the alternate screen and raw mode. Safe to call more than once.
pub fn restore_terminal() {
    stdout().execute(LeaveAlternateScreen).ok();
    disable_raw_mode().ok();
}

/// Run the presentation until the user quits, a termination signal arrives,
/// or a hook failure ends it.
///
/// The presentation is always finalized before this returns.
pub fn run<R, S>(terminal: &mut PresentationTerminal, mut app: App<R, S>) -> Result<()>
where
    R: ProcessRunner,
    S: PageSync,
{
    let result = event_loop(terminal, &mut app);
    app.quit();
    result?;

    match app.failure.take() {
        Some(failure) => Err(eyre!(failure)),
        None => Ok(()),
    }
}

fn event_loop<R, S>(terminal: &mut PresentationTerminal, app: &mut App<R, S>) -> Result<()>
where
    R: ProcessRunner,
    S: PageSync,
{
    while !app.should_quit() {
        terminal.draw(|frame| ui::render(frame, app))?;

        if signals::termination_requested() {
            info!("termination requested");
            break;
        }

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        // Resizes are picked up by the next draw
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key);
        }
    }
    Ok(())
}
