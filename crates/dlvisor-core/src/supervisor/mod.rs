//! Supervisor: builds the job queue, starts the renderer and a bounded pool of
//! workers, waits for the queue to drain and produces the run summary.

mod pool;
mod queue;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};

pub use pool::PoolSize;
pub use queue::{JobQueue, TaskGuard};

use crate::config::SupervisorConfig;
use crate::engine::EngineLauncher;
use crate::job::{Job, JobOutcome, RunSummary};
use crate::parser::TextPatterns;
use crate::render::{visible_width, Renderer, Screen};
use crate::status::{status_channel, StatusLine, StatusMessage, StatusSink, Symbol};
use crate::worker::{run_job, WorkerContext};

/// Status line index of the run header.
pub const HEADER_LINE: usize = 0;

pub struct Supervisor {
    config: SupervisorConfig,
    launcher: Arc<dyn EngineLauncher>,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, launcher: Arc<dyn EngineLauncher>) -> Self {
        Self { config, launcher }
    }

    /// Download every job, drawing progress onto `screen`. Returns the
    /// summary and the screen once the renderer has applied every message.
    ///
    /// Individual job failures are reported in the summary; `Err` means the
    /// supervisor itself could not run (thread spawn, terminal output).
    pub fn run<W: Write + Send + 'static>(
        &self,
        jobs: Vec<Job>,
        screen: Screen<W>,
    ) -> Result<(RunSummary, Screen<W>)> {
        let started = Instant::now();
        let patterns = Arc::new(TextPatterns::new().context("compiling engine output patterns")?);
        let (tx, rx) = status_channel(self.config.display.status_channel_capacity);
        let renderer = Renderer::spawn(screen, rx, self.config.display.poll_interval());

        if jobs.is_empty() {
            tracing::info!("no jobs to run");
            tx.emit(StatusMessage::append(
                StatusLine::notice(Symbol::Info, "No videos to download").render(),
            ));
            drop(tx);
            let screen = renderer.stop().context("status renderer failed")?;
            return Ok((RunSummary::from_outcomes(&[], started.elapsed()), screen));
        }

        let total = jobs.len();
        let pool = PoolSize::for_host(self.config.pool_size);
        let workers = pool.workers.min(total);
        tracing::info!(jobs = total, workers, "starting run");

        tx.emit(StatusMessage::append(header_line(total).render()));
        let label_width = jobs
            .iter()
            .map(|job| visible_width(&job.label))
            .max()
            .unwrap_or(0);
        for job in &jobs {
            tx.emit(StatusMessage::append(
                StatusLine::new(job.label.clone(), label_width).render(),
            ));
        }
        if let Some(warning) = pool.warning() {
            tracing::warn!("{warning}");
            tx.emit(StatusMessage::append(
                StatusLine::notice(Symbol::Warn, warning).render(),
            ));
        }

        let sink: Arc<dyn StatusSink> = Arc::new(tx.clone());
        let ctx = Arc::new(WorkerContext::new(
            &self.config,
            Arc::clone(&self.launcher),
            sink,
            patterns,
            label_width,
        ));
        let queue = Arc::new(JobQueue::new(
            jobs.into_iter()
                .enumerate()
                .map(|(index, job)| (index + 1, job)),
        ));
        let stop = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(workers);
        for n in 0..workers {
            let ctx = Arc::clone(&ctx);
            let queue = Arc::clone(&queue);
            let worker_stop = Arc::clone(&stop);
            let spawned = thread::Builder::new()
                .name(format!("dlvisor-worker-{n}"))
                .spawn(move || worker_loop(&ctx, &queue, &worker_stop));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Workers already running finish the queue and exit.
                    stop.store(true, Ordering::SeqCst);
                    return Err(e).context("spawning worker thread");
                }
            }
        }

        queue.join();
        stop.store(true, Ordering::SeqCst);

        let mut outcomes = Vec::with_capacity(total);
        let mut panicked = 0usize;
        for handle in handles {
            match handle.join() {
                Ok(done) => outcomes.extend(done),
                Err(_) => panicked += 1,
            }
        }
        drop(ctx);

        let summary = RunSummary::from_outcomes(&outcomes, started.elapsed());
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            secs = summary.elapsed.as_secs_f64(),
            "run finished"
        );
        tx.emit(StatusMessage::replace(
            HEADER_LINE,
            summary_line(&summary).render(),
        ));
        drop(tx);
        let screen = renderer.stop().context("status renderer failed")?;

        if panicked > 0 {
            return Err(anyhow!("{panicked} worker thread(s) panicked"));
        }
        Ok((summary, screen))
    }
}

/// Pull jobs until the queue is empty and the stop flag is raised.
fn worker_loop(
    ctx: &WorkerContext,
    queue: &JobQueue<(usize, Job)>,
    stop: &AtomicBool,
) -> Vec<JobOutcome> {
    let mut outcomes = Vec::new();
    loop {
        match queue.pop(ctx.poll) {
            Some((line, job)) => {
                let _ack = TaskGuard::new(queue);
                outcomes.push(run_job(ctx, &job, line));
            }
            None => {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
            }
        }
    }
    outcomes
}

fn videos(n: usize) -> String {
    format!("{n} video{}", if n == 1 { "" } else { "s" })
}

fn header_line(total: usize) -> StatusLine {
    StatusLine::notice(Symbol::Header, format!("Downloading {}", videos(total)))
}

fn summary_line(summary: &RunSummary) -> StatusLine {
    let mut text = format!(
        "Downloaded {} of {} in {:.1}s",
        summary.succeeded,
        videos(summary.total),
        summary.elapsed.as_secs_f64()
    );
    if summary.failed > 0 {
        text.push_str(&format!(
            ", {} failed: {}",
            summary.failed,
            summary.failed_labels.join(", ")
        ));
    }
    StatusLine::notice(Symbol::Header, text)
}
