//! `dlvisor links | ids | playlist` – resolve jobs and supervise their downloads.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use dlvisor_core::config::SupervisorConfig;
use dlvisor_core::engine::{EngineLauncher, SystemLauncher};
use dlvisor_core::job::RunSummary;
use dlvisor_core::resolve::{self, IdList, Playlist, Resolver};
use dlvisor_core::status::{StatusLine, Symbol};
use dlvisor_core::{Screen, Supervisor};

/// Exit status when at least one video could not be downloaded.
const SOME_FAILED: u8 = 2;

/// Where the jobs of a run come from.
#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    Ids(Vec<String>),
    Playlist(String),
}

impl Source {
    fn resolver(self, cfg: &SupervisorConfig, launcher: Arc<dyn EngineLauncher>) -> Box<dyn Resolver> {
        match self {
            Source::File(path) => resolve::for_path(&path),
            Source::Ids(ids) => Box::new(IdList::new(ids)),
            Source::Playlist(uri) => Box::new(Playlist::new(uri, cfg.engine.clone(), launcher)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Source::File(path) => path.display().to_string(),
            Source::Ids(ids) => format!("{} command-line id(s)", ids.len()),
            Source::Playlist(uri) => uri.clone(),
        }
    }
}

pub async fn run_download(source: Source, cfg: SupervisorConfig) -> Result<ExitCode> {
    let launcher: Arc<dyn EngineLauncher> = Arc::new(SystemLauncher);
    // Resolution may run the engine and the supervisor blocks on worker threads.
    let summary = tokio::task::spawn_blocking(move || download(source, cfg, launcher))
        .await
        .context("download task panicked")??;

    if summary.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(SOME_FAILED))
    }
}

fn download(
    source: Source,
    cfg: SupervisorConfig,
    launcher: Arc<dyn EngineLauncher>,
) -> Result<RunSummary> {
    let what = source.describe();
    let resolution = source
        .resolver(&cfg, Arc::clone(&launcher))
        .resolve()
        .with_context(|| format!("reading videos from {what}"))?;
    tracing::info!(
        source = %what,
        jobs = resolution.jobs.len(),
        malformed = resolution.malformed,
        "resolved jobs"
    );
    if let Some(warning) = resolution.warning() {
        tracing::warn!("{warning}");
        println!("{}", StatusLine::notice(Symbol::Warn, warning).render());
    }

    let mut screen = Screen::new(io::stdout());
    if let Some(width) = cfg.display.width {
        screen.set_width(width);
    }
    let supervisor = Supervisor::new(cfg, launcher);
    let (summary, _screen) = supervisor.run(resolution.jobs, screen)?;
    Ok(summary)
}
