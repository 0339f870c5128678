//! Input loop driving an [`App`] from lines arriving on a channel.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use crate::app::App;

pub const PROMPT: &str = "> ";

/// Reads stdin on a background thread; the channel closes at EOF.
pub fn spawn_stdin_reader() -> io::Result<Receiver<io::Result<String>>> {
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("branch-chat-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if sender.send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(receiver)
}

/// Runs until `/quit`, the input closes, or reading fails, then flushes
/// pending state.
///
/// While waiting for input the loop wakes when the next debounced write is
/// due, so idle edits still reach the store.
pub fn run<W: Write>(
    app: &mut App,
    input: &Receiver<io::Result<String>>,
    out: &mut W,
) -> io::Result<()> {
    write!(out, "{PROMPT}")?;
    out.flush()?;

    while !app.should_exit {
        let received = match app.controller().flush_due_in(Instant::now()) {
            Some(timeout) => input.recv_timeout(timeout),
            None => input.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Err(error)) => {
                app.controller_mut().shutdown();
                return Err(error);
            }
            Ok(Ok(line)) => {
                let output = app.handle_line(&line);
                if !output.is_empty() {
                    write!(out, "{output}")?;
                    if !output.ends_with('\n') {
                        writeln!(out)?;
                    }
                }
                if !app.should_exit {
                    write!(out, "{PROMPT}")?;
                    out.flush()?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        app.controller_mut().tick(Instant::now());
    }

    app.controller_mut().shutdown();
    Ok(())
}
