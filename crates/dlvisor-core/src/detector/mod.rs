//! Stall and error detection: turns speed samples and failure signatures into
//! restart requests, and bounds how often a job may be restarted.

mod classify;
mod policy;

pub use classify::{classify_failure, FailureKind};
pub use policy::{RestartCause, RestartDecision, RestartPolicy};

use crate::config::RestartConfig;
use crate::job::JobRuntimeState;

/// What the output parser forwards to the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// Instantaneous throughput. `fragmented` selects the lower floor.
    Speed { bytes_per_sec: f64, fragmented: bool },
    Failure(FailureKind),
}

/// Counts consecutive slow samples per job and flags terminal failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StallDetector {
    pub slow_threshold: u32,
    pub slow_floor: f64,
    pub fragmented_floor: f64,
}

impl StallDetector {
    pub fn from_config(config: &RestartConfig) -> Self {
        Self {
            slow_threshold: config.slow_threshold,
            slow_floor: config.slow_floor_bytes_per_sec as f64,
            fragmented_floor: config.fragmented_floor_bytes_per_sec as f64,
        }
    }

    /// Feed one observation. Returns the cause when the attempt should be
    /// abandoned.
    pub fn observe(&self, state: &mut JobRuntimeState, observation: Observation) -> Option<RestartCause> {
        match observation {
            Observation::Speed {
                bytes_per_sec,
                fragmented,
            } => self.observe_speed(state, bytes_per_sec, fragmented),
            Observation::Failure(kind) => Some(RestartCause::Failure(kind)),
        }
    }

    pub fn observe_speed(
        &self,
        state: &mut JobRuntimeState,
        bytes_per_sec: f64,
        fragmented: bool,
    ) -> Option<RestartCause> {
        let floor = if fragmented {
            self.fragmented_floor
        } else {
            self.slow_floor
        };
        if bytes_per_sec < floor {
            state.slow_sample_count = state.slow_sample_count.saturating_add(1);
        } else {
            state.slow_sample_count = 0;
        }
        (state.slow_sample_count > self.slow_threshold).then_some(RestartCause::Slow)
    }
}
