//! Invocation of the external download engine.
//!
//! The engine is an opaque child process observed through two line streams
//! and an exit code. `EngineLauncher` is the seam: `SystemLauncher` starts
//! real processes, `scripted::ScriptedLauncher` replays canned output.

mod command;
mod lines;
pub mod scripted;
mod system;

use std::io::{self, Read};
use std::thread;

use thiserror::Error;

pub use command::{EngineCommand, PROGRESS_PREFIX};
pub use lines::{forward_lines, EngineLine, Stream};
pub use system::SystemLauncher;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("engine i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("{program} exited with status {code}: {stderr}")]
    Exit {
        program: String,
        code: i32,
        stderr: String,
    },
}

/// Readable end of one engine output stream.
pub type EngineReader = Box<dyn Read + Send>;

/// One running engine instance. Owned by exactly one worker.
pub trait EngineProcess: Send {
    /// Primary output stream; `None` once taken.
    fn take_output(&mut self) -> Option<EngineReader>;
    /// Diagnostic stream; `None` once taken.
    fn take_diagnostics(&mut self) -> Option<EngineReader>;
    /// Kill the process. Killing an already exited process is not an error.
    fn kill(&mut self) -> Result<(), EngineError>;
    /// Wait for exit. Termination by signal reports `-1`.
    fn wait(&mut self) -> Result<i32, EngineError>;
}

pub trait EngineLauncher: Send + Sync {
    fn spawn(&self, command: &EngineCommand) -> Result<Box<dyn EngineProcess>, EngineError>;

    /// Run `command` to completion and return its primary output.
    /// A non-zero exit is an error carrying the diagnostic output.
    fn capture(&self, command: &EngineCommand) -> Result<String, EngineError> {
        let mut process = self.spawn(command)?;
        let diagnostics = process.take_diagnostics().map(|mut reader| {
            thread::spawn(move || {
                let mut text = String::new();
                let _ = reader.read_to_string(&mut text);
                text
            })
        });
        let mut output = String::new();
        if let Some(mut reader) = process.take_output() {
            reader.read_to_string(&mut output)?;
        }
        let code = process.wait()?;
        let stderr = diagnostics
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if code != 0 {
            return Err(EngineError::Exit {
                program: command.program.clone(),
                code,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}
