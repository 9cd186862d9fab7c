//! CLI for the dlvisor download supervisor.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use dlvisor_core::config::{self, EngineMode, SupervisorConfig};

use commands::{run_completions, run_config, run_download, run_man, Source};

/// Top-level CLI for the dlvisor download supervisor.
#[derive(Debug, Parser)]
#[command(name = "dlvisor")]
#[command(about = "Supervise parallel video downloads with stall detection and restarts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every video listed in a link file (plain text, .yaml, .toml or .json).
    Links {
        /// Path to the link file.
        file: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },

    /// Download videos given as ids or links on the command line.
    Ids {
        /// Video ids or links.
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
        #[command(flatten)]
        run: RunArgs,
    },

    /// Download every entry of a playlist.
    Playlist {
        /// Playlist URL.
        uri: String,
        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the config file path and the effective configuration.
    Config,

    /// Print a shell completion script to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

/// Flags shared by every download command. Each one overrides the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Number of parallel workers (clamped to the host's limit).
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// How engine progress is read.
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<ModeArg>,

    /// Restarts allowed per video before it is marked failed.
    #[arg(long, value_name = "N")]
    pub restart_limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Text,
    Structured,
}

impl From<ModeArg> for EngineMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Text => EngineMode::Text,
            ModeArg::Structured => EngineMode::Structured,
        }
    }
}

impl RunArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, cfg: &mut SupervisorConfig) {
        if let Some(jobs) = self.jobs {
            cfg.pool_size = Some(jobs);
        }
        if let Some(mode) = self.mode {
            cfg.engine.mode = mode.into();
        }
        if let Some(limit) = self.restart_limit {
            cfg.restart.restart_limit = limit;
        }
    }
}

impl CliCommand {
    /// Parse arguments and run the selected command. The exit code reflects
    /// whether every download succeeded.
    pub async fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();
        cli.command.run().await
    }

    async fn run(self) -> Result<ExitCode> {
        match self {
            CliCommand::Links { file, run } => {
                run_download(Source::File(file), load_config(&run)?).await
            }
            CliCommand::Ids { ids, run } => run_download(Source::Ids(ids), load_config(&run)?).await,
            CliCommand::Playlist { uri, run } => {
                run_download(Source::Playlist(uri), load_config(&run)?).await
            }
            CliCommand::Config => {
                let cfg = config::load_or_init()?;
                run_config(&cfg)?;
                Ok(ExitCode::SUCCESS)
            }
            CliCommand::Completions { shell } => {
                run_completions(shell);
                Ok(ExitCode::SUCCESS)
            }
            CliCommand::Man => {
                run_man()?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn load_config(run: &RunArgs) -> Result<SupervisorConfig> {
    let mut cfg = config::load_or_init()?;
    run.apply(&mut cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests;
