//! Job model: what to download, its per-attempt runtime state, and run results.
//!
//! A `Job` is immutable once queued. `JobRuntimeState` is owned by the one
//! worker executing the job; `JobOutcome`s are collected into a `RunSummary`.

mod state;
mod summary;

pub use state::{JobRuntimeState, Stage};
pub use summary::{JobOutcome, RunSummary};

/// Position of an entry within an ordered batch (playlist).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistPosition {
    /// 1-based index of the entry within the playlist.
    pub index: usize,
    /// Total entries in the playlist.
    pub count: usize,
}

/// What the engine is pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTarget {
    /// A single video id or link.
    Single(String),
    /// One entry of a playlist, addressed by its position so a respawn resumes
    /// at the same entry instead of the start of the batch.
    PlaylistEntry {
        playlist_uri: String,
        position: PlaylistPosition,
    },
}

/// One unit of download work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Stable identity (video id, or playlist entry id).
    pub id: String,
    /// Text shown in the job's status line.
    pub label: String,
    pub target: JobTarget,
    /// Output template overriding the engine default (e.g. playlist folder + index prefix).
    pub output_template: Option<String>,
}

impl Job {
    /// Job for a single video id or link; the id doubles as its label.
    pub fn single(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            target: JobTarget::Single(id.clone()),
            id,
            output_template: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = Some(template.into());
        self
    }

    pub fn playlist_position(&self) -> Option<PlaylistPosition> {
        match &self.target {
            JobTarget::PlaylistEntry { position, .. } => Some(*position),
            JobTarget::Single(_) => None,
        }
    }
}
