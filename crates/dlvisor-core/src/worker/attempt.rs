//! One engine run: spawn, read both streams, feed the parser and detector,
//! kill on a restart cause, reap.

use std::sync::mpsc::{self, RecvTimeoutError};

use super::WorkerContext;
use crate::detector::RestartCause;
use crate::engine::{forward_lines, EngineCommand, Stream};
use crate::parser::OutputParser;

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptEnd {
    /// The engine finished the job (exit 0 or target already present).
    Completed,
    Restart(RestartCause),
}

pub fn run_attempt(
    ctx: &WorkerContext,
    command: &EngineCommand,
    parser: &mut OutputParser,
) -> AttemptEnd {
    parser.begin_attempt();
    let mut process = match ctx.launcher.spawn(command) {
        Ok(process) => process,
        Err(e) => {
            tracing::warn!(error = %e, "engine spawn failed");
            return AttemptEnd::Restart(RestartCause::SpawnFailed);
        }
    };

    let (tx, rx) = mpsc::channel();
    let mut readers = Vec::with_capacity(2);
    if let Some(reader) = process.take_output() {
        readers.push(forward_lines(reader, Stream::Output, tx.clone()));
    }
    if let Some(reader) = process.take_diagnostics() {
        readers.push(forward_lines(reader, Stream::Diagnostic, tx.clone()));
    }
    drop(tx);

    let mut cause = None;
    loop {
        match rx.recv_timeout(ctx.poll) {
            Ok(line) => {
                // After a kill the remaining output is drained unread.
                if cause.is_some() {
                    continue;
                }
                parser.feed_line(&line);
                for observation in parser.take_observations() {
                    if let Some(found) = ctx.detector.observe(parser.state_mut(), observation) {
                        tracing::info!(cause = %found, "abandoning attempt");
                        if let Err(e) = process.kill() {
                            tracing::warn!(error = %e, "failed to kill engine");
                        }
                        cause = Some(found);
                        break;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for reader in readers {
        if reader.join().is_err() {
            tracing::warn!("engine reader thread panicked");
        }
    }
    let code = match process.wait() {
        Ok(code) => code,
        Err(e) => {
            tracing::warn!(error = %e, "failed to reap engine");
            -1
        }
    };
    tracing::debug!(code, "engine exited");

    if let Some(cause) = cause {
        return AttemptEnd::Restart(cause);
    }
    if parser.state().already_complete() || code == 0 {
        return AttemptEnd::Completed;
    }
    AttemptEnd::Restart(RestartCause::ExitCode(code))
}
