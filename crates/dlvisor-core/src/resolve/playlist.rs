use std::sync::Arc;

use serde::Deserialize;

use super::{Resolution, ResolveError, Resolver};
use crate::config::EngineConfig;
use crate::engine::{EngineCommand, EngineLauncher};
use crate::job::{Job, JobTarget, PlaylistPosition};

#[derive(Debug, Deserialize)]
struct PlaylistInfo {
    title: Option<String>,
    #[serde(default)]
    entries: Vec<Option<PlaylistEntry>>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    id: Option<String>,
}

/// Playlist expanded into one job per entry by asking the engine for its
/// flat metadata.
pub struct Playlist {
    uri: String,
    engine: EngineConfig,
    launcher: Arc<dyn EngineLauncher>,
}

impl Playlist {
    pub fn new(uri: impl Into<String>, engine: EngineConfig, launcher: Arc<dyn EngineLauncher>) -> Self {
        Self {
            uri: uri.into(),
            engine,
            launcher,
        }
    }
}

impl Resolver for Playlist {
    fn resolve(&self) -> Result<Resolution, ResolveError> {
        let command = EngineCommand::flat_playlist(&self.engine, &self.uri);
        tracing::debug!(%command, "querying playlist");
        let json = self.launcher.capture(&command)?;
        jobs_from_metadata(&self.uri, &json)
    }
}

/// Build playlist jobs from the engine's `-J` output.
///
/// Entry `k` of `n` is labelled `k / n` and written to
/// `%(uploader)s/<playlist title>/<k zero-padded>__%(title)s.%(ext)s`.
/// Entries without an id still take their position and count as malformed.
pub fn jobs_from_metadata(uri: &str, json: &str) -> Result<Resolution, ResolveError> {
    let info: PlaylistInfo = serde_json::from_str(json)?;
    let count = info.entries.len();
    let width = count.to_string().len();
    let folder = template_safe(info.title.as_deref().unwrap_or("Playlist"));

    let mut jobs = Vec::with_capacity(count);
    let mut malformed = 0;
    for (offset, entry) in info.entries.into_iter().enumerate() {
        let index = offset + 1;
        let Some(id) = entry.and_then(|e| e.id).filter(|id| !id.is_empty()) else {
            malformed += 1;
            continue;
        };
        jobs.push(Job {
            id,
            label: format!("{index:>width$} / {count}"),
            target: JobTarget::PlaylistEntry {
                playlist_uri: uri.to_string(),
                position: PlaylistPosition { index, count },
            },
            output_template: Some(format!(
                "%(uploader)s/{folder}/{index:0width$}__%(title)s.%(ext)s"
            )),
        });
    }
    Ok(Resolution::from_jobs(jobs, malformed))
}

/// Playlist titles become a directory name inside an output template.
fn template_safe(title: &str) -> String {
    title.replace('/', "_").replace('%', "%%")
}
