//! Tests for links, ids and playlist subcommands and their shared flags.

use super::parse;
use crate::cli::{CliCommand, ModeArg, RunArgs};
use clap::Parser;
use dlvisor_core::config::{EngineMode, SupervisorConfig};

#[test]
fn cli_parse_links() {
    match parse(&["dlvisor", "links", "videos.txt"]) {
        CliCommand::Links { file, run } => {
            assert_eq!(file, std::path::PathBuf::from("videos.txt"));
            assert!(run.jobs.is_none());
            assert!(run.mode.is_none());
            assert!(run.restart_limit.is_none());
        }
        _ => panic!("expected Links"),
    }
}

#[test]
fn cli_parse_ids_multiple() {
    match parse(&["dlvisor", "ids", "dQw4w9WgXcQ", "https://youtu.be/aaaaaaaaaaa"]) {
        CliCommand::Ids { ids, .. } => {
            assert_eq!(ids, vec!["dQw4w9WgXcQ", "https://youtu.be/aaaaaaaaaaa"]);
        }
        _ => panic!("expected Ids"),
    }
}

#[test]
fn cli_parse_ids_requires_one() {
    assert!(crate::cli::Cli::try_parse_from(["dlvisor", "ids"]).is_err());
}

#[test]
fn cli_parse_playlist_with_flags() {
    match parse(&[
        "dlvisor",
        "playlist",
        "https://www.youtube.com/playlist?list=PL123",
        "--jobs",
        "4",
        "--mode",
        "structured",
        "--restart-limit",
        "3",
    ]) {
        CliCommand::Playlist { uri, run } => {
            assert_eq!(uri, "https://www.youtube.com/playlist?list=PL123");
            assert_eq!(run.jobs, Some(4));
            assert_eq!(run.mode, Some(ModeArg::Structured));
            assert_eq!(run.restart_limit, Some(3));
        }
        _ => panic!("expected Playlist"),
    }
}

#[test]
fn cli_parse_short_jobs_flag() {
    match parse(&["dlvisor", "links", "a.toml", "-j", "2"]) {
        CliCommand::Links { run, .. } => assert_eq!(run.jobs, Some(2)),
        _ => panic!("expected Links with -j"),
    }
}

#[test]
fn cli_rejects_unknown_mode() {
    assert!(
        crate::cli::Cli::try_parse_from(["dlvisor", "links", "a.txt", "--mode", "json"]).is_err()
    );
}

#[test]
fn run_args_override_config() {
    let mut cfg = SupervisorConfig::default();
    let run = RunArgs {
        jobs: Some(6),
        mode: Some(ModeArg::Structured),
        restart_limit: Some(1),
    };
    run.apply(&mut cfg);
    assert_eq!(cfg.pool_size, Some(6));
    assert_eq!(cfg.engine.mode, EngineMode::Structured);
    assert_eq!(cfg.restart.restart_limit, 1);
}

#[test]
fn run_args_without_flags_keep_config() {
    let expected = SupervisorConfig {
        pool_size: Some(3),
        ..SupervisorConfig::default()
    };
    let mut cfg = expected.clone();
    RunArgs::default().apply(&mut cfg);
    assert_eq!(cfg, expected);
}
