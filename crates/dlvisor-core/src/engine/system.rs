use std::io;
use std::process::{Child, Command, Stdio};

use super::{EngineCommand, EngineError, EngineLauncher, EngineProcess, EngineReader};

/// Starts the engine as a real child process with piped output streams.
///
/// On unix the engine leads its own process group, so helpers it starts
/// (ffmpeg and the like) inherit the group and die with it on a kill.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl EngineLauncher for SystemLauncher {
    fn spawn(&self, command: &EngineCommand) -> Result<Box<dyn EngineProcess>, EngineError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let child = cmd.spawn().map_err(|source| EngineError::Spawn {
            program: command.program.clone(),
            source,
        })?;
        tracing::debug!(pid = child.id(), "engine started");
        Ok(Box::new(SystemProcess {
            child,
            reaped: false,
        }))
    }
}

struct SystemProcess {
    child: Child,
    /// Set once `wait` returned; the pid may be reused after that.
    reaped: bool,
}

impl EngineProcess for SystemProcess {
    fn take_output(&mut self) -> Option<EngineReader> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as EngineReader)
    }

    fn take_diagnostics(&mut self) -> Option<EngineReader> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as EngineReader)
    }

    fn kill(&mut self) -> Result<(), EngineError> {
        if self.reaped {
            return Ok(());
        }
        #[cfg(unix)]
        kill_group(self.child.id())?;
        match self.child.kill() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn wait(&mut self) -> Result<i32, EngineError> {
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status.code().unwrap_or(-1))
    }
}

/// SIGKILL every process in the group led by `pid`. A group that is already
/// gone is not an error.
#[cfg(unix)]
fn kill_group(pid: u32) -> io::Result<()> {
    let pgid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    if pgid <= 1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to signal process group {pgid}"),
        ));
    }
    // SAFETY: killpg only sends a signal; `pgid` is the group created for
    // our own unreaped child, so it cannot name an unrelated group.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read};
    use std::time::{Duration, Instant};

    fn sh(script: &str) -> EngineCommand {
        EngineCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[test]
    fn capture_returns_stdout() {
        let out = SystemLauncher.capture(&sh("echo hello")).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn capture_reports_nonzero_exit_with_stderr() {
        let err = SystemLauncher
            .capture(&sh("echo broken >&2; exit 3"))
            .unwrap_err();
        match err {
            EngineError::Exit { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn kill_reaches_background_helpers_holding_the_pipes() {
        let mut process = SystemLauncher
            .spawn(&sh("sleep 5 & echo started; wait"))
            .unwrap();
        let mut output = BufReader::new(process.take_output().unwrap());
        let mut first = String::new();
        output.read_line(&mut first).unwrap();
        assert_eq!(first.trim(), "started");

        let started = Instant::now();
        process.kill().unwrap();
        let mut rest = String::new();
        output.read_to_string(&mut rest).unwrap();
        assert!(
            started.elapsed() < Duration::from_secs(3),
            "pipe stayed open for {:?}",
            started.elapsed()
        );
        assert_eq!(process.wait().unwrap(), -1);
        process.kill().unwrap();
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let cmd = EngineCommand {
            program: "dlvisor-no-such-engine".to_string(),
            args: Vec::new(),
        };
        assert!(matches!(
            SystemLauncher.spawn(&cmd),
            Err(EngineError::Spawn { .. })
        ));
    }
}
