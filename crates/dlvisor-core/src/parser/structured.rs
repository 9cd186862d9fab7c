//! JSON progress records requested with `--progress-template`.

use serde::Deserialize;

use super::event::{EngineEvent, ProgressSample};

/// Subset of the engine's progress dictionary. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressRecord {
    pub status: Option<String>,
    pub downloaded_bytes: Option<f64>,
    pub total_bytes: Option<f64>,
    pub total_bytes_estimate: Option<f64>,
    pub fragment_index: Option<u64>,
    pub fragment_count: Option<u64>,
    pub speed: Option<f64>,
}

impl ProgressRecord {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Progress event for this record. Error records and records without any
    /// usable denominator yield nothing.
    pub fn to_event(&self) -> Option<EngineEvent> {
        if self.status.as_deref() == Some("error") {
            return None;
        }
        let sample = match (self.fragment_index, self.fragment_count) {
            (Some(index), Some(count)) if count > 0 => ProgressSample::Fragments { index, count },
            _ => {
                let done = self.downloaded_bytes?;
                let total = self.total_bytes.or(self.total_bytes_estimate)?;
                ProgressSample::Bytes { done, total }
            }
        };
        Some(EngineEvent::Progress {
            sample,
            speed: self.speed,
        })
    }
}
