//! Output parser: turns one engine's output into stage transitions, progress
//! milestones and observations for the stall detector.
//!
//! Text lines and structured progress records converge on the same
//! `EngineEvent`s. The parser updates the job's status line but has no say
//! over the process: failures and speed samples are queued as
//! `Observation`s for the worker to hand to the detector.

mod event;
mod patterns;
mod structured;
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Instant;

pub use event::{parse_speed, EngineEvent, ProgressSample};
pub use patterns::TextPatterns;
pub use structured::ProgressRecord;

use crate::detector::{classify_failure, Observation};
use crate::engine::{EngineLine, Stream, PROGRESS_PREFIX};
use crate::job::{JobRuntimeState, Stage};
use crate::status::{JobReporter, Symbol};

/// Severity-split sink for engine log messages.
pub trait EngineLog {
    fn debug(&mut self, message: &str);
    fn info(&mut self, message: &str);
    fn warning(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Parser and state machine for one job, kept across all of its attempts.
pub struct OutputParser {
    patterns: Arc<TextPatterns>,
    reporter: JobReporter,
    state: JobRuntimeState,
    started: Instant,
    /// Destinations seen in the current attempt.
    destinations: u32,
    fragmented: bool,
    dash_announced: bool,
    observations: Vec<Observation>,
}

impl OutputParser {
    pub fn new(patterns: Arc<TextPatterns>, reporter: JobReporter, started: Instant) -> Self {
        Self {
            patterns,
            reporter,
            state: JobRuntimeState::new(),
            started,
            destinations: 0,
            fragmented: false,
            dash_announced: false,
            observations: Vec::new(),
        }
    }

    pub fn state(&self) -> &JobRuntimeState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut JobRuntimeState {
        &mut self.state
    }

    pub fn reporter_mut(&mut self) -> &mut JobReporter {
        &mut self.reporter
    }

    /// Reset per-attempt bookkeeping before a (re)spawn.
    pub fn begin_attempt(&mut self) {
        self.destinations = 0;
        self.observations.clear();
    }

    /// Observations gathered since the last call, in output order.
    pub fn take_observations(&mut self) -> Vec<Observation> {
        std::mem::take(&mut self.observations)
    }

    /// Route one raw line by stream and prefix.
    pub fn feed_line(&mut self, line: &EngineLine) {
        let text = line.text.trim();
        match line.stream {
            Stream::Output => match text.strip_prefix(PROGRESS_PREFIX.trim_end()) {
                Some(json) => self.on_progress_json(json.trim()),
                None if text.starts_with("[info]") => self.info(text),
                None => self.debug(text),
            },
            Stream::Diagnostic => {
                if text.starts_with("ERROR:") {
                    self.error(text);
                } else if text.starts_with("WARNING:") {
                    self.warning(text);
                } else {
                    self.debug(text);
                }
            }
        }
    }

    /// Structured progress callback.
    pub fn on_progress(&mut self, record: &ProgressRecord) {
        if let Some(event) = record.to_event() {
            self.apply(event);
        }
    }

    fn on_progress_json(&mut self, json: &str) {
        match ProgressRecord::parse(json) {
            Ok(record) => self.on_progress(&record),
            Err(e) => tracing::debug!(error = %e, "unreadable progress record"),
        }
    }

    pub fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Destination => self.on_destination(),
            EngineEvent::Merging => {
                if self.state.advance_to(Stage::Merging) {
                    self.reporter.set(Symbol::Info, "Merging data");
                }
            }
            EngineEvent::AlreadyComplete => self.state.mark_already_complete(),
            EngineEvent::Progress { sample, speed } => self.on_sample(sample, speed),
            EngineEvent::RetryNotice { attempt, limit } => {
                // Pad the count so the suffix keeps its width while it climbs.
                let width = limit.to_string().len();
                self.reporter
                    .set_suffix(format!("[!] Retry {attempt:>width$} / {limit}"));
            }
        }
    }

    fn on_destination(&mut self) {
        if self.state.stage() >= Stage::Merging {
            return;
        }
        self.destinations += 1;
        let implied = if self.destinations == 1 {
            Stage::Primary
        } else {
            Stage::Secondary
        };
        let advanced = self.state.advance_to(implied);
        // A respawn re-announces the stage it resumes in.
        if advanced || self.destinations == 1 {
            self.announce_stage();
        }
    }

    fn announce_stage(&mut self) {
        let body = format!("Downloading {}", self.state.stage().stream_name());
        self.reporter.set(Symbol::Info, body);
    }

    fn on_sample(&mut self, sample: ProgressSample, speed: Option<f64>) {
        if self.state.stage() == Stage::Pending {
            self.state.advance_to(Stage::Primary);
            self.announce_stage();
        }
        if self.state.stage() >= Stage::Merging {
            return;
        }
        let fragments = sample.fragments();
        if fragments.is_some() {
            self.fragmented = true;
            if !self.dash_announced {
                self.dash_announced = true;
                self.reporter.set_suffix("[!] DASH video");
            }
        }
        if let Some(milestone) = sample.percent().and_then(|p| self.state.record_progress(p)) {
            let stream = capitalize(self.state.stage().stream_name());
            let secs = self.started.elapsed().as_secs_f64();
            let body = match fragments {
                Some((index, count)) => format!(
                    "{stream} download reached {milestone}% (frag {index} / {count}, {secs:.1}s)"
                ),
                None => format!("{stream} download reached {milestone}% ({secs:.1}s)"),
            };
            self.reporter.set(Symbol::Info, body);
        }
        if let Some(bytes_per_sec) = speed {
            self.observations.push(Observation::Speed {
                bytes_per_sec,
                fragmented: self.fragmented,
            });
        }
    }

    fn record_failure(&mut self, message: &str) {
        if let Some(kind) = classify_failure(message) {
            self.observations.push(Observation::Failure(kind));
        }
    }
}

impl EngineLog for OutputParser {
    fn debug(&mut self, message: &str) {
        tracing::trace!(line = message, "engine");
        if let Some(event) = self.patterns.parse(message) {
            self.apply(event);
        }
    }

    fn info(&mut self, message: &str) {
        tracing::debug!(line = message, "engine info");
    }

    fn warning(&mut self, message: &str) {
        tracing::debug!(line = message, "engine warning");
        // The engine recovers from warnings it is retrying itself.
        if let Some(event) = self.patterns.parse(message) {
            self.apply(event);
        }
        if !patterns::is_engine_retry(message) {
            self.record_failure(message);
        }
    }

    fn error(&mut self, message: &str) {
        tracing::warn!(line = message, "engine error");
        self.record_failure(message);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
