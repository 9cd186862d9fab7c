//! Terminal results: one `JobOutcome` per job, folded into a `RunSummary`.

use std::time::Duration;

use super::Stage;

/// Final result of one job, produced by the worker that ran it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    /// Status line index of the job.
    pub line: usize,
    pub label: String,
    /// Either `Stage::Done` or `Stage::Failed`.
    pub stage: Stage,
    pub restarts: u32,
    pub already_complete: bool,
    pub elapsed: Duration,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.stage == Stage::Done
    }
}

/// Counts and failures of a whole supervisor run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
    /// Labels of failed jobs, in status line order.
    pub failed_labels: Vec<String>,
}

impl RunSummary {
    /// Build the summary from terminal job outcomes (any order).
    pub fn from_outcomes(outcomes: &[JobOutcome], elapsed: Duration) -> Self {
        let mut failed: Vec<&JobOutcome> = outcomes.iter().filter(|o| !o.succeeded()).collect();
        failed.sort_by_key(|o| o.line);
        Self {
            total: outcomes.len(),
            succeeded: outcomes.len() - failed.len(),
            failed: failed.len(),
            elapsed,
            failed_labels: failed.into_iter().map(|o| o.label.clone()).collect(),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(line: usize, label: &str, stage: Stage) -> JobOutcome {
        JobOutcome {
            line,
            label: label.to_string(),
            stage,
            restarts: 0,
            already_complete: false,
            elapsed: Duration::from_secs(1),
        }
    }

    #[test]
    fn summary_counts_and_orders_failures() {
        let outcomes = vec![
            outcome(3, "c", Stage::Failed),
            outcome(1, "a", Stage::Done),
            outcome(2, "b", Stage::Failed),
        ];
        let summary = RunSummary::from_outcomes(&outcomes, Duration::from_secs(5));
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.failed_labels, vec!["b", "c"]);
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn empty_run_has_no_failures() {
        let summary = RunSummary::from_outcomes(&[], Duration::ZERO);
        assert_eq!(summary, RunSummary::default());
        assert!(summary.all_succeeded());
    }
}
