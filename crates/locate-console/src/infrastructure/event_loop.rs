//! The console's single event loop.
//!
//! One `select!` drives everything that touches application state:
//!
//! | Source            | Action                                        |
//! |-------------------|-----------------------------------------------|
//! | shutdown future   | return [`ExitReason::Interrupted`]            |
//! | transport events  | [`Console::handle_transport_event`]           |
//! | operator lines    | parse, then [`Console::handle_command`]       |
//! | frame ticker      | [`Console::on_frame`], only while a drag waits |
//!
//! Because all of these run on the same task, no store is ever touched
//! concurrently.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::application::{CommandResult, Console, OperatorCommand};
use crate::domain::TransportEvent;

/// Why [`run_event_loop`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The operator typed `quit`.
    Quit,
    /// The shutdown future completed (Ctrl+C).
    Interrupted,
    /// The transport dropped its event sender.
    TransportClosed,
}

/// Runs until `quit`, `shutdown`, or the transport goes away.
///
/// Command output and errors are written to `out`.  End of input is not an
/// exit condition: the console keeps following the server until shut down.
pub async fn run_event_loop<R, W, F>(
    console: &mut Console,
    events: &mut UnboundedReceiver<TransportEvent>,
    input: R,
    out: &mut W,
    frame_interval: Duration,
    shutdown: F,
) -> ExitReason
where
    R: AsyncBufRead + Unpin,
    W: Write,
    F: Future<Output = ()>,
{
    let mut lines = input.lines();
    let mut input_open = true;

    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => return ExitReason::Interrupted,

            event = events.recv() => match event {
                Some(event) => console.handle_transport_event(event),
                None => return ExitReason::TransportClosed,
            },

            line = lines.next_line(), if input_open => match line {
                Ok(Some(line)) => {
                    if handle_line(console, &line, out) {
                        return ExitReason::Quit;
                    }
                }
                Ok(None) => {
                    debug!("operator input closed");
                    input_open = false;
                }
                Err(e) => {
                    warn!("operator input failed: {e}");
                    input_open = false;
                }
            },

            _ = ticker.tick(), if console.wants_frame() => {
                console.on_frame();
            }
        }
    }
}

/// Runs one operator line.  Returns `true` when the operator asked to quit.
fn handle_line<W: Write>(console: &mut Console, line: &str, out: &mut W) -> bool {
    let command = match OperatorCommand::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return false,
        Err(e) => {
            emit(out, &format!("error: {e}"));
            return false;
        }
    };

    match console.handle_command(command) {
        Ok(CommandResult::Done) => false,
        Ok(CommandResult::Output(text)) => {
            emit(out, &text);
            false
        }
        Ok(CommandResult::Quit) => true,
        Err(e) => {
            emit(out, &format!("error: {e}"));
            false
        }
    }
}

fn emit<W: Write>(out: &mut W, text: &str) {
    if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
        warn!("could not write output: {e}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
