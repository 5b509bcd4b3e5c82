//! Line-oriented front end.
//!
//! Reads one navigation command per line and prints the state after each.
//! Useful for scripting a presentation or driving it over a pipe.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::controller::{Command, Controller, Transition};
use crate::error::{HookError, NavigationError};
use crate::hooks::{ExitStatus, ProcessRunner};
use crate::sync::PageSync;

/// How often the loop checks the termination flag while waiting for input.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Describes the current page, e.g. `page 2/5: Agenda`.
pub fn status_line<R: ProcessRunner, S: PageSync>(controller: &Controller<R, S>) -> String {
    let headline = match controller.page().headline() {
        "" => "(empty)",
        headline => headline,
    };
    format!(
        "page {}/{}: {}",
        controller.current(),
        controller.page_count(),
        headline
    )
}

/// Parses and runs one input line, writing the outcome to `out`.
pub fn execute_line<R, S, W>(
    controller: &mut Controller<R, S>,
    line: &str,
    out: &mut W,
) -> io::Result<Flow>
where
    R: ProcessRunner,
    S: PageSync,
    W: Write,
{
    if line.trim().is_empty() {
        return Ok(Flow::Continue);
    }
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            writeln!(out, "error: {}", e)?;
            return Ok(Flow::Continue);
        }
    };

    match controller.execute(command) {
        Ok(transition) if command == Command::Quit => {
            report_warnings(out, &transition)?;
            writeln!(out, "finalized")?;
            Ok(Flow::Quit)
        }
        Ok(transition) => {
            report_warnings(out, &transition)?;
            if transition.moved {
                writeln!(out, "{}", status_line(controller))?;
            } else {
                writeln!(out, "{} (unchanged)", status_line(controller))?;
            }
            Ok(Flow::Continue)
        }
        Err(e @ NavigationError::OutOfRange { .. }) => {
            writeln!(out, "error: {}", e)?;
            Ok(Flow::Continue)
        }
        Err(e) => {
            writeln!(out, "error: {}", e)?;
            Ok(Flow::Quit)
        }
    }
}

/// Runs commands from `input` until `quit`, end of input, or `stop` is raised.
///
/// The presentation is finalized before returning.
pub fn run<R, S, I, W>(
    controller: &mut Controller<R, S>,
    input: I,
    out: &mut W,
    stop: &AtomicBool,
) -> io::Result<()>
where
    R: ProcessRunner,
    S: PageSync,
    I: BufRead + Send + 'static,
    W: Write,
{
    // Reading happens on its own thread so the loop can keep polling `stop`.
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in input.lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    writeln!(out, "{}", status_line(controller))?;
    out.flush()?;

    loop {
        if stop.load(Ordering::SeqCst) {
            info!("termination requested");
            break;
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(line)) => {
                let flow = execute_line(controller, &line, out)?;
                out.flush()?;
                if flow == Flow::Quit {
                    return Ok(());
                }
            }
            Ok(Err(e)) => {
                controller.quit();
                return Err(e);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("end of input");
                break;
            }
        }
    }

    if let Some(outcome) = controller.quit() {
        report_hook(out, &outcome)?;
        writeln!(out, "finalized")?;
    }
    out.flush()
}

fn report_warnings<W: Write>(out: &mut W, transition: &Transition) -> io::Result<()> {
    if let Some(outcome) = &transition.hook {
        report_hook(out, outcome)?;
    }
    if let Some(Err(e)) = &transition.sync {
        writeln!(out, "warning: {}", e)?;
    }
    Ok(())
}

fn report_hook<W: Write>(out: &mut W, outcome: &Result<ExitStatus, HookError>) -> io::Result<()> {
    match outcome {
        Ok(status) if !status.success() => writeln!(out, "warning: hook exited with {}", status),
        Err(e) => writeln!(out, "warning: {}", e),
        Ok(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigFragment};
    use crate::hooks::HookName;
    use crate::hooks::testing::RecordingRunner;
    use crate::parser::parse_presentation;
    use crate::sync::testing::MemorySync;

    const DECK: &str = "# Intro\n---\n# Agenda\n---\n\n---\n# Thanks";

    fn controller(toml: &str, runner: RecordingRunner) -> Controller<RecordingRunner, MemorySync> {
        let document = parse_presentation("deck.md", DECK).unwrap();
        let config: Config = ConfigFragment::from_toml(toml, "test", 0).unwrap().into();
        Controller::start(&document, config, runner, MemorySync::default()).unwrap()
    }

    fn lines(out: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(out).lines().map(str::to_string).collect()
    }

    #[test]
    fn test_execute_lines() {
        let mut controller = controller("", RecordingRunner::default());
        let mut out = Vec::new();

        for line in ["next", "", "goto 9", "jump", "3", "p", "p", "p"] {
            assert_eq!(
                execute_line(&mut controller, line, &mut out).unwrap(),
                Flow::Continue
            );
        }
        assert_eq!(
            execute_line(&mut controller, "q", &mut out).unwrap(),
            Flow::Quit
        );

        assert_eq!(
            lines(&out),
            [
                "page 2/4: Agenda",
                "error: page 9 is out of range (1-4)",
                "error: unknown command `jump` (try next, previous, first, last, goto N, quit)",
                "page 3/4: (empty)",
                "page 2/4: Agenda",
                "page 1/4: Intro",
                "page 1/4: Intro (unchanged)",
                "finalized",
            ]
        );
    }

    #[test]
    fn test_hook_failure_is_reported() {
        let runner =
            RecordingRunner::default().exit_with(HookName::Update, ExitStatus::from_code(5));
        let mut controller = controller("[commands.update]\nbinary = \"x\"\n", runner);
        let mut out = Vec::new();

        execute_line(&mut controller, "last", &mut out).unwrap();
        assert_eq!(
            lines(&out),
            ["warning: hook exited with exit code 5", "page 4/4: Thanks"]
        );
    }

    #[test]
    fn test_abort_policy_ends_loop() {
        let runner =
            RecordingRunner::default().exit_with(HookName::Update, ExitStatus::from_code(1));
        let mut controller = controller(
            "[hooks]\non_failure = \"abort\"\n[commands.update]\nbinary = \"x\"\n",
            runner,
        );
        let mut out = Vec::new();

        assert_eq!(
            execute_line(&mut controller, "n", &mut out).unwrap(),
            Flow::Quit
        );
        assert!(controller.is_terminated());
    }

    #[test]
    fn test_run_until_end_of_input() {
        let runner = RecordingRunner::default();
        let mut controller = controller("[commands.finalize]\nbinary = \"done\"\n", runner.clone());
        let mut out = Vec::new();
        let stop = AtomicBool::new(false);

        run(&mut controller, &b"n\nn\n"[..], &mut out, &stop).unwrap();

        assert_eq!(
            lines(&out),
            ["page 1/4: Intro", "page 2/4: Agenda", "page 3/4: (empty)", "finalized"]
        );
        assert!(controller.is_terminated());
        drop(controller);
        assert_eq!(runner.count(HookName::Finalize), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_stops_when_flag_is_raised() {
        let runner = RecordingRunner::default();
        let mut controller = controller("[commands.finalize]\nbinary = \"done\"\n", runner.clone());
        let mut out = Vec::new();
        let stop = AtomicBool::new(true);

        // Input that never ends would block forever without the flag.
        let (reader, _writer) = std::os::unix::net::UnixStream::pair().unwrap();
        run(&mut controller, io::BufReader::new(reader), &mut out, &stop).unwrap();

        assert_eq!(lines(&out), ["page 1/4: Intro", "finalized"]);
        assert_eq!(runner.count(HookName::Finalize), 1);
    }

    #[test]
    fn test_quit_command_in_run() {
        let mut controller = controller("", RecordingRunner::default());
        let mut out = Vec::new();

        run(
            &mut controller,
            &b"last\nquit\nnext\n"[..],
            &mut out,
            &AtomicBool::new(false),
        )
        .unwrap();

        assert_eq!(
            lines(&out),
            ["page 1/4: Intro", "page 4/4: Thanks", "finalized"]
        );
    }
}
