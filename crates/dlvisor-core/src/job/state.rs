//! Mutable per-job state owned by the executing worker.

/// Discrete phase of a job. Ordering follows the lifecycle; `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Pending,
    /// First component stream (video).
    Primary,
    /// Second component stream (audio).
    Secondary,
    Merging,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    /// Lowercase noun used in status text ("Downloading video").
    pub fn stream_name(self) -> &'static str {
        match self {
            Stage::Primary => "video",
            Stage::Secondary => "audio",
            Stage::Pending => "data",
            Stage::Merging => "merge",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

/// Runtime state of one job across all of its attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRuntimeState {
    stage: Stage,
    progress_percent: u8,
    announced_milestone: u8,
    pub slow_sample_count: u32,
    restart_count: u32,
    already_complete: bool,
}

impl Default for JobRuntimeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress is announced at multiples of this many percent.
pub const MILESTONE_STEP: u8 = 20;

impl JobRuntimeState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Pending,
            progress_percent: 0,
            announced_milestone: 0,
            slow_sample_count: 0,
            restart_count: 0,
            already_complete: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn restart_count(&self) -> u32 {
        self.restart_count
    }

    pub fn already_complete(&self) -> bool {
        self.already_complete
    }

    /// Move forward to `stage`. Returns false (and changes nothing) when that
    /// would not be a forward move or the job is already terminal.
    pub fn advance_to(&mut self, stage: Stage) -> bool {
        if self.stage.is_terminal() || stage <= self.stage {
            return false;
        }
        self.stage = stage;
        self.progress_percent = 0;
        self.announced_milestone = 0;
        true
    }

    /// Record a progress percentage for the current stage.
    ///
    /// Progress never decreases within a stage. Returns the milestone (a
    /// multiple of 20, floored) when this sample crosses one that has not been
    /// announced yet in this stage.
    pub fn record_progress(&mut self, percent: u8) -> Option<u8> {
        let percent = percent.min(100);
        if percent > self.progress_percent {
            self.progress_percent = percent;
        }
        let milestone = self.progress_percent / MILESTONE_STEP * MILESTONE_STEP;
        if milestone > self.announced_milestone {
            self.announced_milestone = milestone;
            return Some(milestone);
        }
        None
    }

    /// The engine reported the target as already present; the job is done.
    pub fn mark_already_complete(&mut self) {
        if self.stage.is_terminal() {
            return;
        }
        self.already_complete = true;
        self.stage = Stage::Done;
    }

    pub fn mark_done(&mut self) {
        if self.stage != Stage::Failed {
            self.stage = Stage::Done;
        }
    }

    /// Count one restart. Progress restarts from zero; the stage is kept.
    /// Returns the new restart count.
    pub fn begin_restart(&mut self) -> u32 {
        self.restart_count = self.restart_count.saturating_add(1);
        self.progress_percent = 0;
        self.announced_milestone = 0;
        self.slow_sample_count = 0;
        self.restart_count
    }

    /// Permanent failure: no further restarts.
    pub fn mark_failed(&mut self) {
        self.stage = Stage::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_only_advance_forward() {
        let mut s = JobRuntimeState::new();
        assert!(s.advance_to(Stage::Primary));
        assert!(s.advance_to(Stage::Secondary));
        assert!(!s.advance_to(Stage::Primary));
        assert!(!s.advance_to(Stage::Secondary));
        assert_eq!(s.stage(), Stage::Secondary);
        assert!(s.advance_to(Stage::Merging));
        s.mark_done();
        assert!(!s.advance_to(Stage::Merging));
        assert_eq!(s.stage(), Stage::Done);
    }

    #[test]
    fn advancing_resets_progress() {
        let mut s = JobRuntimeState::new();
        s.advance_to(Stage::Primary);
        assert_eq!(s.record_progress(55), Some(40));
        assert!(s.advance_to(Stage::Secondary));
        assert_eq!(s.progress_percent(), 0);
        assert_eq!(s.record_progress(20), Some(20));
    }

    #[test]
    fn milestones_are_floored_and_announced_once() {
        let mut s = JobRuntimeState::new();
        s.advance_to(Stage::Primary);
        assert_eq!(s.record_progress(0), None);
        assert_eq!(s.record_progress(19), None);
        assert_eq!(s.record_progress(20), Some(20));
        assert_eq!(s.record_progress(21), None);
        assert_eq!(s.record_progress(39), None);
        assert_eq!(s.record_progress(79), Some(60));
        assert_eq!(s.record_progress(80), Some(80));
        assert_eq!(s.record_progress(100), Some(100));
        assert_eq!(s.record_progress(100), None);
    }

    #[test]
    fn progress_never_decreases_within_a_stage() {
        let mut s = JobRuntimeState::new();
        s.advance_to(Stage::Primary);
        s.record_progress(50);
        assert_eq!(s.record_progress(10), None);
        assert_eq!(s.progress_percent(), 50);
        assert_eq!(s.record_progress(250), Some(100));
        assert_eq!(s.progress_percent(), 100);
    }

    #[test]
    fn restart_keeps_stage_and_resets_progress() {
        let mut s = JobRuntimeState::new();
        s.advance_to(Stage::Primary);
        s.advance_to(Stage::Secondary);
        s.record_progress(70);
        s.slow_sample_count = 12;
        assert_eq!(s.begin_restart(), 1);
        assert_eq!(s.stage(), Stage::Secondary);
        assert_eq!(s.progress_percent(), 0);
        assert_eq!(s.slow_sample_count, 0);
        assert_eq!(s.begin_restart(), 2);
        assert_eq!(s.restart_count(), 2);
        assert_eq!(s.record_progress(20), Some(20));
    }

    #[test]
    fn already_complete_short_circuits_to_done() {
        let mut s = JobRuntimeState::new();
        s.mark_already_complete();
        assert!(s.already_complete());
        assert_eq!(s.stage(), Stage::Done);
        assert_eq!(s.restart_count(), 0);
    }

    #[test]
    fn failed_is_sticky() {
        let mut s = JobRuntimeState::new();
        s.advance_to(Stage::Primary);
        s.mark_failed();
        s.mark_done();
        s.mark_already_complete();
        assert_eq!(s.stage(), Stage::Failed);
        assert!(!s.advance_to(Stage::Merging));
    }
}
