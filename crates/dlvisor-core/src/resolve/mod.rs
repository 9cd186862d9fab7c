//! Turning user input (link files, id lists, playlists) into jobs.

mod grouped;
mod links;
mod playlist;

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use grouped::GroupedLinkFile;
pub use links::{extract_id, is_video_id, parse_link_lines, IdList, TextLinkFile};
pub use playlist::{jobs_from_metadata, Playlist};

use crate::engine::EngineError;
use crate::job::Job;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unexpected input data format in {path}: group `{group}` is not a list of links")]
    Format { path: PathBuf, group: String },
    #[error("playlist query failed: {0}")]
    Engine(#[from] EngineError),
    #[error("unreadable playlist metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Jobs found in an input, plus how many entries could not be identified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub jobs: Vec<Job>,
    pub malformed: usize,
}

impl Resolution {
    /// Jobs for plain video ids. Duplicates are kept once, first wins.
    pub fn from_ids(ids: impl IntoIterator<Item = String>, malformed: usize) -> Self {
        Self::from_jobs(ids.into_iter().map(Job::single).collect(), malformed)
    }

    pub fn from_jobs(jobs: Vec<Job>, malformed: usize) -> Self {
        let mut seen = HashSet::new();
        let jobs = jobs
            .into_iter()
            .filter(|job| seen.insert(job.id.clone()))
            .collect();
        Self { jobs, malformed }
    }

    /// Warning text when some entries could not be identified.
    pub fn warning(&self) -> Option<String> {
        match self.malformed {
            0 => None,
            1 => Some("1 link could not be identified".to_string()),
            n => Some(format!("{n} links could not be identified")),
        }
    }
}

pub trait Resolver {
    fn resolve(&self) -> Result<Resolution, ResolveError>;
}

/// Pick the resolver for a link file by extension: `.yaml`/`.yml`, `.toml`
/// and `.json` are grouped files, anything else is one link per line.
pub fn for_path(path: &Path) -> Box<dyn Resolver> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") | Some("toml") | Some("json") => {
            Box::new(GroupedLinkFile::new(path))
        }
        _ => Box::new(TextLinkFile::new(path)),
    }
}

fn read(path: &Path) -> Result<String, ResolveError> {
    std::fs::read_to_string(path).map_err(|source| ResolveError::Read {
        path: path.to_path_buf(),
        source,
    })
}
