use std::fmt;

use crate::config::{EngineConfig, EngineMode};
use crate::job::{Job, JobTarget};

/// Prefix of structured progress records on the engine's stdout.
pub const PROGRESS_PREFIX: &str = "dlvisor-progress ";

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Program plus argument vector for one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EngineCommand {
    /// Invocation that downloads `job`. Re-running the same command resumes the
    /// same target, including the same playlist position.
    pub fn for_job(config: &EngineConfig, job: &Job) -> Self {
        let mut args = vec!["--newline".to_string()];
        if config.force_ipv4 {
            args.push("--force-ipv4".to_string());
        }
        if config.geo_bypass {
            args.push("--geo-bypass".to_string());
        }
        if config.mode == EngineMode::Structured {
            args.push("--progress-template".to_string());
            args.push(format!("download:{PROGRESS_PREFIX}%(progress)j"));
        }
        args.push("--retries".to_string());
        args.push(config.retries.to_string());
        args.push("--format".to_string());
        args.push(config.format.clone());
        args.push("--merge-output-format".to_string());
        args.push(config.merge_output_format.clone());
        args.push("--output".to_string());
        args.push(
            job.output_template
                .clone()
                .unwrap_or_else(|| config.output_template.clone()),
        );
        args.extend(config.extra_args.iter().cloned());
        match &job.target {
            JobTarget::Single(target) => args.push(target_url(target)),
            JobTarget::PlaylistEntry {
                playlist_uri,
                position,
            } => {
                args.push("--playlist-items".to_string());
                args.push(position.index.to_string());
                args.push(playlist_uri.clone());
            }
        }
        Self {
            program: config.program.clone(),
            args,
        }
    }

    /// Metadata query listing a playlist's entries as one JSON document.
    pub fn flat_playlist(config: &EngineConfig, uri: &str) -> Self {
        let mut args = vec!["--flat-playlist".to_string(), "-J".to_string()];
        args.extend(config.extra_args.iter().cloned());
        args.push(uri.to_string());
        Self {
            program: config.program.clone(),
            args,
        }
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Bare ids become watch links; anything that already looks like a link is
/// passed through.
fn target_url(target: &str) -> String {
    if target.contains("://") {
        target.to_string()
    } else {
        format!("{WATCH_URL}{target}")
    }
}
