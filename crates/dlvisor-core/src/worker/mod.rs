//! Worker: owns one job from first spawn to its terminal state.
//!
//! Each attempt runs the engine to completion or until the detector asks for
//! a restart. Restarts are counted against the job's budget; the worker
//! always returns a `Done` or `Failed` outcome.

mod attempt;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub use attempt::{run_attempt, AttemptEnd};

use crate::config::{EngineConfig, SupervisorConfig};
use crate::detector::{RestartDecision, RestartPolicy, StallDetector};
use crate::engine::{EngineCommand, EngineLauncher};
use crate::job::{Job, JobOutcome, Stage};
use crate::parser::{OutputParser, TextPatterns};
use crate::status::{JobReporter, StatusLine, StatusSink, Symbol};

/// Everything a worker needs, shared read-only by all workers of a run.
pub struct WorkerContext {
    pub launcher: Arc<dyn EngineLauncher>,
    pub sink: Arc<dyn StatusSink>,
    pub patterns: Arc<TextPatterns>,
    pub engine: EngineConfig,
    pub detector: StallDetector,
    pub policy: RestartPolicy,
    /// Bound on every blocking wait.
    pub poll: Duration,
    /// Width that job labels are padded to.
    pub label_width: usize,
}

impl WorkerContext {
    pub fn new(
        config: &SupervisorConfig,
        launcher: Arc<dyn EngineLauncher>,
        sink: Arc<dyn StatusSink>,
        patterns: Arc<TextPatterns>,
        label_width: usize,
    ) -> Self {
        Self {
            launcher,
            sink,
            patterns,
            engine: config.engine.clone(),
            detector: StallDetector::from_config(&config.restart),
            policy: RestartPolicy::from_config(&config.restart),
            poll: config.display.poll_interval(),
            label_width,
        }
    }
}

/// Run `job` shown on status line `line` until it is done or failed.
pub fn run_job(ctx: &WorkerContext, job: &Job, line: usize) -> JobOutcome {
    let span = tracing::info_span!("job", job = %job.label, line);
    let _guard = span.enter();

    let started = Instant::now();
    let mut reporter = JobReporter::new(
        line,
        StatusLine::new(job.label.clone(), ctx.label_width),
        Arc::clone(&ctx.sink),
    );
    reporter.set(Symbol::Active, "Starting download");
    let mut parser = OutputParser::new(Arc::clone(&ctx.patterns), reporter, started);
    let command = EngineCommand::for_job(&ctx.engine, job);
    tracing::debug!(%command, "engine command");

    let mut attempt = 1u32;
    loop {
        tracing::debug!(attempt, "starting attempt");
        let cause = match run_attempt(ctx, &command, &mut parser) {
            AttemptEnd::Completed => {
                parser.state_mut().mark_done();
                break;
            }
            AttemptEnd::Restart(cause) => cause,
        };
        let decision = ctx.policy.restart(parser.state_mut());
        let text = decision.describe(cause);
        tracing::warn!(%cause, restarts = parser.state().restart_count(), "{text}");
        parser.reporter_mut().set(Symbol::Warn, text);
        match decision {
            RestartDecision::GiveUp => break,
            RestartDecision::Respawn { delay, .. } => {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                attempt += 1;
            }
        }
    }

    let elapsed = started.elapsed();
    let state = parser.state().clone();
    let secs = elapsed.as_secs_f64();
    let reporter = parser.reporter_mut();
    reporter.clear_suffix();
    if state.stage() == Stage::Done {
        if state.already_complete() {
            reporter.set(Symbol::Ok, "Already downloaded");
        } else {
            reporter.set(Symbol::Ok, format!("Downloaded and merged in {secs:.1}s"));
        }
        tracing::info!(restarts = state.restart_count(), secs, "job done");
    } else {
        let restarts = state.restart_count();
        let plural = if restarts == 1 { "" } else { "s" };
        reporter.set(
            Symbol::Failed,
            format!("Failed after {restarts} restart{plural} ({secs:.1}s)"),
        );
        tracing::warn!(restarts, secs, "job failed");
    }

    JobOutcome {
        line,
        label: job.label.clone(),
        stage: state.stage(),
        restarts: state.restart_count(),
        already_complete: state.already_complete(),
        elapsed,
    }
}
