//! Parallel chunk dispatch and order-independent aggregation.
//!
//! Every chunk task is submitted up front to a fixed-size worker pool;
//! results are drained from a channel in whatever order workers finish.
//! Accumulation is a pair of per-grid-index running sums, so the emitted
//! curve is identical for any completion order. The first chunk failure is
//! fatal to the whole sweep: in-flight chunks still run to completion, but
//! no partial curve is returned.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tracing::{debug, info};

use crate::detector::{DetectorModel, run_chunk};
use crate::error::SweepError;
use crate::response::{EfficiencyCurve, EfficiencyPoint};
use crate::sweep::SweepPlan;
use crate::transport::TransportEngine;

/// Default worker count: `ceil((logical_cpus + 1) / 2)`, leaving headroom
/// for the host
#[must_use]
pub fn default_worker_count() -> usize {
    let cpus = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
    (cpus + 1).div_ceil(2)
}

/// Chunk-completion counters a caller can poll from another thread
#[derive(Debug, Clone, Default)]
pub struct SweepProgress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl SweepProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }
}

/// Executes a sweep plan on a bounded worker pool and aggregates the
/// per-point efficiency sums
#[derive(Debug)]
pub struct SweepRunner {
    workers: usize,
    progress: SweepProgress,
}

impl Default for SweepRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepRunner {
    /// Runner with the default worker policy
    #[must_use]
    pub fn new() -> Self {
        Self::with_workers(default_worker_count())
    }

    /// Runner with an explicit worker count (at least 1)
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            progress: SweepProgress::new(0),
        }
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Handle onto this runner's completion counters
    #[must_use]
    pub fn progress(&self) -> SweepProgress {
        self.progress.clone()
    }

    /// Execute every chunk of `plan` and emit the efficiency curve in grid
    /// order
    pub fn run<E: TransportEngine + Sync>(
        &self,
        engine: &E,
        model: &DetectorModel,
        plan: &SweepPlan,
    ) -> Result<EfficiencyCurve, SweepError> {
        self.progress.reset(plan.tasks().len());
        debug!(
            tasks = plan.tasks().len(),
            points = plan.grid().len(),
            workers = self.workers,
            "dispatching sweep chunks"
        );

        let (detected, samples) = self.execute(engine, model, plan)?;

        let points = plan
            .grid()
            .iter()
            .zip(detected.iter().zip(&samples))
            .map(|(&point, (&d, &s))| EfficiencyPoint::from_counts(point, d, s))
            .collect();

        info!(points = plan.grid().len(), "sweep complete");
        Ok(EfficiencyCurve::new(points))
    }

    #[cfg(feature = "parallel")]
    fn execute<E: TransportEngine + Sync>(
        &self,
        engine: &E,
        model: &DetectorModel,
        plan: &SweepPlan,
    ) -> Result<(Vec<u64>, Vec<u64>), SweepError> {
        use std::sync::mpsc;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| SweepError::Pool(e.to_string()))?;

        let mut detected = vec![0u64; plan.grid().len()];
        let mut samples = vec![0u64; plan.grid().len()];
        let mut failure = None;
        let progress = &self.progress;

        // in_place_scope keeps this thread out of the pool: workers run the
        // chunks while the submitting thread drains the channel
        pool.in_place_scope(|scope| {
            let (tx, rx) = mpsc::channel();
            for task in plan.tasks() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let _ = tx.send(run_chunk(engine, model, task));
                });
            }
            drop(tx);

            for outcome in rx {
                match outcome {
                    Ok(chunk) => {
                        detected[chunk.grid_index] += chunk.detected;
                        samples[chunk.grid_index] += chunk.samples;
                        progress.increment();
                    }
                    Err(err) => {
                        failure.get_or_insert(err);
                    }
                }
            }
        });

        match failure {
            Some(err) => Err(err.into()),
            None => Ok((detected, samples)),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn execute<E: TransportEngine + Sync>(
        &self,
        engine: &E,
        model: &DetectorModel,
        plan: &SweepPlan,
    ) -> Result<(Vec<u64>, Vec<u64>), SweepError> {
        let mut detected = vec![0u64; plan.grid().len()];
        let mut samples = vec![0u64; plan.grid().len()];

        for task in plan.tasks() {
            let chunk = run_chunk(engine, model, task)?;
            detected[chunk.grid_index] += chunk.detected;
            samples[chunk.grid_index] += chunk.samples;
            self.progress.increment();
        }

        Ok((detected, samples))
    }
}
