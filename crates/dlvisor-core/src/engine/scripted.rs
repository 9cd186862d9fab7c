//! In-memory engine for tests and dry runs: replays scripted output lines and
//! exit codes, one script entry per attempt.

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{EngineCommand, EngineError, EngineLauncher, EngineProcess, EngineReader};

/// Output and exit code of one scripted engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedAttempt {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub exit_code: i32,
    /// Fail at spawn time, as if the program were missing.
    pub spawn_error: bool,
}

impl ScriptedAttempt {
    /// Successful run printing `stdout`.
    pub fn ok<S: Into<String>>(stdout: impl IntoIterator<Item = S>) -> Self {
        Self::exit(0, stdout)
    }

    pub fn exit<S: Into<String>>(code: i32, stdout: impl IntoIterator<Item = S>) -> Self {
        Self {
            stdout: stdout.into_iter().map(Into::into).collect(),
            exit_code: code,
            ..Self::default()
        }
    }

    pub fn spawn_failure() -> Self {
        Self {
            spawn_error: true,
            ..Self::default()
        }
    }

    pub fn with_stderr<S: Into<String>>(mut self, stderr: impl IntoIterator<Item = S>) -> Self {
        self.stderr = stderr.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Default)]
struct Script {
    attempts: Vec<ScriptedAttempt>,
    next: usize,
}

/// Launcher whose processes replay scripts chosen by a key that must occur in
/// one of the command's arguments (a video id, a playlist uri).
///
/// When a key's script is used up its last attempt repeats. Commands matching
/// no key exit 0 with no output.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLauncher {
    scripts: Arc<Mutex<Vec<(String, Script)>>>,
    spawned: Arc<Mutex<Vec<EngineCommand>>>,
    kills: Arc<AtomicUsize>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, key: impl Into<String>, attempts: Vec<ScriptedAttempt>) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((
                key.into(),
                Script {
                    attempts,
                    next: 0,
                },
            ));
        self
    }

    /// Every command spawned so far, in order.
    pub fn spawned(&self) -> Vec<EngineCommand> {
        self.spawned
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Number of spawns per script key.
    pub fn spawn_counts(&self) -> HashMap<String, usize> {
        self.scripts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(|(key, script)| (key.clone(), script.next))
            .collect()
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    fn next_attempt(&self, command: &EngineCommand) -> ScriptedAttempt {
        let mut scripts = self.scripts.lock().unwrap_or_else(|p| p.into_inner());
        let found = scripts
            .iter_mut()
            .find(|(key, _)| command.args.iter().any(|arg| arg.contains(key.as_str())));
        match found {
            Some((_, script)) => {
                let index = script.next.min(script.attempts.len().saturating_sub(1));
                script.next += 1;
                script.attempts.get(index).cloned().unwrap_or_default()
            }
            None => ScriptedAttempt::default(),
        }
    }
}

impl EngineLauncher for ScriptedLauncher {
    fn spawn(&self, command: &EngineCommand) -> Result<Box<dyn EngineProcess>, EngineError> {
        self.spawned
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(command.clone());
        let attempt = self.next_attempt(command);
        if attempt.spawn_error {
            return Err(EngineError::Spawn {
                program: command.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            });
        }
        Ok(Box::new(ScriptedProcess {
            stdout: Some(joined(&attempt.stdout)),
            stderr: Some(joined(&attempt.stderr)),
            exit_code: attempt.exit_code,
            killed: false,
            kills: Arc::clone(&self.kills),
        }))
    }
}

fn joined(lines: &[String]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for line in lines {
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
    }
    bytes
}

struct ScriptedProcess {
    stdout: Option<Vec<u8>>,
    stderr: Option<Vec<u8>>,
    exit_code: i32,
    killed: bool,
    kills: Arc<AtomicUsize>,
}

impl EngineProcess for ScriptedProcess {
    fn take_output(&mut self) -> Option<EngineReader> {
        self.stdout
            .take()
            .map(|b| Box::new(Cursor::new(b)) as EngineReader)
    }

    fn take_diagnostics(&mut self) -> Option<EngineReader> {
        self.stderr
            .take()
            .map(|b| Box::new(Cursor::new(b)) as EngineReader)
    }

    fn kill(&mut self) -> Result<(), EngineError> {
        if !self.killed {
            self.killed = true;
            self.kills.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<i32, EngineError> {
        Ok(if self.killed { -1 } else { self.exit_code })
    }
}
