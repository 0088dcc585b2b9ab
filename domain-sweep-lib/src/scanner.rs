//! Sweep orchestration.
//!
//! The [`Scanner`] wires the generator, the worker pool and the two sinks
//! together and owns shutdown. Every queue has a [`PendingCounter`]; the
//! coordinator only cancels the sinks after the generator has returned and
//! each counter has been observed at zero in pipeline order (tasks, then
//! results, then progress), so no accepted item is ever lost.

use crate::concurrent::{PendingCounter, ScanStats};
use crate::error::SweepError;
use crate::generate::{CandidateSpace, Candidates};
use crate::pool::ResolverPool;
use crate::sinks::{load_recorded, read_checkpoint, Checkpointer, ResultWriter};
use crate::types::{ScanConfig, ScanSummary};
use crate::worker::{run_worker, WorkerContext};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs one sweep over a candidate space.
///
/// # Example
///
/// ```rust,no_run
/// use domain_sweep_lib::{ScanConfig, Scanner};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ScanConfig::default().with_tld("io").with_length(3);
///     let scanner = Scanner::new(config)?;
///     let summary = scanner.run(CancellationToken::new()).await?;
///     println!("{} available out of {}", summary.available, summary.checked);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Scanner {
    config: ScanConfig,
    pool: Arc<ResolverPool>,
}

impl Scanner {
    /// Validate `config` and build a DNS resolver pool from it.
    pub fn new(config: ScanConfig) -> Result<Self, SweepError> {
        let config = config.validate()?;
        let pool = ResolverPool::from_config(&config)?;
        Ok(Self {
            config,
            pool: Arc::new(pool),
        })
    }

    /// Validate `config` but look names up through a caller-supplied pool.
    ///
    /// The resolver list in `config` is ignored.
    pub fn with_pool(config: ScanConfig, pool: ResolverPool) -> Result<Self, SweepError> {
        Ok(Self {
            config: config.validate()?,
            pool: Arc::new(pool),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run the sweep to completion or until `interrupt` fires.
    ///
    /// Every startup failure (unreadable checkpoint, marker outside the
    /// space, unwritable output) is returned before any lookup is made. An
    /// interrupt stops dispatching new candidates; work already queued is
    /// still finished and the final checkpoint is written.
    pub async fn run(&self, interrupt: CancellationToken) -> Result<ScanSummary, SweepError> {
        let started = Instant::now();
        let config = &self.config;

        let space = CandidateSpace::from_config(config)?;
        let resumed_from = self.resume_marker(&space).await?;
        let candidates = match &resumed_from {
            Some(marker) => space.resume_from(marker)?,
            None => space.iter(),
        };

        let recorded = if config.skip_recorded && resumed_from.is_some() {
            let recorded = load_recorded(&config.output_path).await?;
            debug!(count = recorded.len(), "loaded previously recorded domains");
            recorded
        } else {
            HashSet::new()
        };

        let writer = ResultWriter::open(&config.output_path).await?;
        let checkpointer = Checkpointer::open(&config.checkpoint_path, config.sample_rate).await?;

        info!(
            tld = %space.tld(),
            length = config.length,
            space_size = ?space.size(),
            resumed_from = ?resumed_from,
            resolvers = self.pool.len(),
            concurrency = config.concurrency,
            "starting sweep"
        );

        let (task_tx, task_rx) = mpsc::channel::<String>(config.queue_capacity);
        let (result_tx, result_rx) = mpsc::unbounded_channel::<String>();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel::<String>();

        let pending_tasks = Arc::new(PendingCounter::new());
        let pending_results = Arc::new(PendingCounter::new());
        let pending_progress = Arc::new(PendingCounter::new());
        let stats = Arc::new(ScanStats::default());
        let shutdown = CancellationToken::new();

        let writer_handle = tokio::spawn(writer.run(
            result_rx,
            Arc::clone(&pending_results),
            shutdown.clone(),
        ));
        let checkpoint_handle = tokio::spawn(checkpointer.run(
            progress_rx,
            Arc::clone(&pending_progress),
            shutdown.clone(),
        ));

        let ctx = WorkerContext {
            tasks: Arc::new(Mutex::new(task_rx)),
            results: result_tx,
            progress: progress_tx,
            pool: Arc::clone(&self.pool),
            pending_tasks: Arc::clone(&pending_tasks),
            pending_results: Arc::clone(&pending_results),
            pending_progress: Arc::clone(&pending_progress),
            stats: Arc::clone(&stats),
            cancel: shutdown.clone(),
        };
        let workers: Vec<JoinHandle<()>> = (0..config.concurrency)
            .map(|id| tokio::spawn(run_worker(id, ctx.clone())))
            .collect();
        // Workers hold their own clones; the sinks see EOF once all of them exit.
        drop(ctx);

        let reporter = config.report_interval.map(|interval| {
            spawn_reporter(Arc::clone(&stats), interval, space.size(), shutdown.clone())
        });

        let interrupted = dispatch(
            candidates,
            task_tx,
            &recorded,
            &pending_tasks,
            &stats,
            &interrupt,
        )
        .await;
        if interrupted {
            info!("interrupt received, draining in-flight work");
        }

        pending_tasks.wait_idle().await;
        pending_results.wait_idle().await;
        pending_progress.wait_idle().await;
        shutdown.cancel();

        for (id, handle) in workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                warn!(worker = id, error = %e, "worker task failed");
            }
        }
        if let Err(e) = writer_handle.await {
            warn!(error = %e, "result writer task failed");
        }
        let checkpoint = checkpoint_handle
            .await
            .map_err(|e| SweepError::internal(format!("Checkpoint writer task failed: {}", e)))?;
        if let Some(reporter) = reporter {
            let _ = reporter.await;
        }

        let summary = ScanSummary {
            space_size: space.size(),
            resumed_from,
            interrupted,
            checkpoint,
            elapsed_secs: started.elapsed().as_secs_f64(),
            ..stats.snapshot()
        };

        info!(
            checked = summary.checked,
            available = summary.available,
            failures = summary.failures,
            faults = summary.faults,
            elapsed_secs = summary.elapsed_secs,
            "sweep finished"
        );
        Ok(summary)
    }

    /// Read and validate the resume marker, if resuming.
    async fn resume_marker(&self, space: &CandidateSpace) -> Result<Option<String>, SweepError> {
        if !self.config.resume {
            return Ok(None);
        }

        let path = self.config.effective_resume_path();
        let Some(marker) = read_checkpoint(path).await? else {
            debug!(path = %path.display(), "no checkpoint found, starting from the beginning");
            return Ok(None);
        };

        space.resume_from(&marker)?;
        info!(marker = %marker, path = %path.display(), "resuming from checkpoint");
        Ok(Some(marker))
    }
}

/// Feed candidates into the task queue. Returns whether `interrupt` fired.
///
/// The pending count is raised before each send so the coordinator can never
/// observe zero while a candidate is between the generator and a worker.
async fn dispatch(
    candidates: Candidates<'_>,
    tasks: mpsc::Sender<String>,
    recorded: &HashSet<String>,
    pending: &PendingCounter,
    stats: &ScanStats,
    interrupt: &CancellationToken,
) -> bool {
    for domain in candidates {
        if recorded.contains(&domain) {
            ScanStats::incr(&stats.skipped);
            continue;
        }

        pending.add();
        tokio::select! {
            biased;
            _ = interrupt.cancelled() => {
                pending.done();
                return true;
            }
            sent = tasks.send(domain) => {
                if let Err(mpsc::error::SendError(domain)) = sent {
                    pending.done();
                    warn!(domain, "task queue closed early, stopping dispatch");
                    return false;
                }
            }
        }
        ScanStats::incr(&stats.dispatched);
    }
    debug!("candidate space exhausted");
    false
}

/// Periodically log throughput until `cancel` fires.
fn spawn_reporter(
    stats: Arc<ScanStats>,
    interval: Duration,
    space_size: Option<u128>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately.
        ticker.tick().await;
        let mut last_checked = 0u64;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let snapshot = stats.snapshot();
                    let rate = snapshot.checked.saturating_sub(last_checked) as f64
                        / interval.as_secs_f64();
                    last_checked = snapshot.checked;
                    let percent = space_size
                        .filter(|&size| size > 0)
                        .map(|size| snapshot.checked as f64 * 100.0 / size as f64);

                    info!(
                        checked = snapshot.checked,
                        available = snapshot.available,
                        failures = snapshot.failures,
                        rate = format!("{:.0}/s", rate),
                        percent = percent.map(|p| format!("{:.2}%", p)),
                        "progress"
                    );
                }
            }
        }
    })
}
