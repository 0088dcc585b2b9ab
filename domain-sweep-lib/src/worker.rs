//! Worker loop: dequeue, look up, classify, fan out.
//!
//! Workers share one task receiver behind an async mutex. A worker never
//! leaves the pool because of a single bad candidate: lookup errors are
//! classified, and panics inside a lookup are caught and logged.

use crate::classify::classify;
use crate::concurrent::{PendingCounter, ScanStats};
use crate::error::SweepError;
use crate::pool::ResolverPool;
use crate::types::{Availability, LookupOutcome};
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::{Receiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Queue endpoints and counters shared by every worker.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub tasks: Arc<Mutex<Receiver<String>>>,
    pub results: UnboundedSender<String>,
    pub progress: UnboundedSender<String>,
    pub pool: Arc<ResolverPool>,
    pub pending_tasks: Arc<PendingCounter>,
    pub pending_results: Arc<PendingCounter>,
    pub pending_progress: Arc<PendingCounter>,
    pub stats: Arc<ScanStats>,
    pub cancel: CancellationToken,
}

/// Run one worker until the task queue closes or the coordinator cancels.
pub(crate) async fn run_worker(id: usize, ctx: WorkerContext) {
    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            next = async { ctx.tasks.lock().await.recv().await } => next,
        };

        let Some(domain) = next else { break };

        let outcome = AssertUnwindSafe(check_candidate(&ctx, &domain))
            .catch_unwind()
            .await;

        match outcome {
            Ok(availability) => {
                if availability.is_available() {
                    info!(domain, "AVAILABLE");
                    ctx.pending_results.add();
                    if ctx.results.send(domain.clone()).is_err() {
                        ctx.pending_results.done();
                        ScanStats::incr(&ctx.stats.faults);
                        warn!(worker = id, domain, "result writer is gone");
                    }
                }
            }
            Err(panic) => {
                ScanStats::incr(&ctx.stats.faults);
                warn!(
                    worker = id,
                    domain,
                    panic = panic_message(&panic),
                    "unexpected fault while checking candidate"
                );
            }
        }

        ctx.pending_progress.add();
        if ctx.progress.send(domain).is_err() {
            ctx.pending_progress.done();
            ScanStats::incr(&ctx.stats.faults);
            warn!(worker = id, "checkpointer is gone, progress not recorded");
        }

        ScanStats::incr(&ctx.stats.checked);
        ctx.pending_tasks.done();
    }
    debug!(worker = id, "worker stopped");
}

/// Look up one candidate on the next endpoint and classify the result.
async fn check_candidate(ctx: &WorkerContext, domain: &str) -> Availability {
    let resolver = ctx.pool.next();
    let deadline = ctx.pool.deadline();

    let outcome = match tokio::time::timeout(deadline, resolver.lookup(domain)).await {
        Ok(outcome) => outcome,
        Err(_) => LookupOutcome::TransientFailure(
            SweepError::timeout(format!("lookup of {}", domain), deadline).to_string(),
        ),
    };

    if let LookupOutcome::TransientFailure(reason) = &outcome {
        ScanStats::incr(&ctx.stats.failures);
        debug!(domain, server = %resolver.endpoint(), reason, "transient lookup failure");
    }

    let availability = classify(&outcome);
    if availability.is_available() {
        ScanStats::incr(&ctx.stats.available);
    }
    availability
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
