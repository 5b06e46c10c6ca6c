//! Parallel grid execution
//!
//! Every `(dataset, algorithm, proportion, gap width, replicate)` cell is an
//! independent task. A failing imputer is confined to its own cell: errors,
//! panics, timeouts and invalid output all become an [`AlgorithmFailure`]
//! stored in the tensor, and the rest of the grid still runs.

#[cfg(feature = "parallel")]
use std::sync::Arc;
use std::time::Duration;

use crate::algorithm::{AlgorithmFailure, AlgorithmRegistry};
use crate::experiment::{
    map_indexed, CellIndex, ExperimentConfig, ExperimentGrid, GridAxes, ResultTensor,
};
use crate::metrics::{MetricEngine, MetricVector};
use crate::series::Series;
use crate::{Error, Result};

/// Outcome of one imputation cell.
pub type CellOutcome = std::result::Result<Series, AlgorithmFailure>;

/// Outcome of one imputation cell, scored against ground truth.
pub type CellScore = std::result::Result<MetricVector, AlgorithmFailure>;

/// Executes an [`ExperimentGrid`] against an [`AlgorithmRegistry`].
///
/// Without a fixed thread count the global rayon pool is used. With the
/// `parallel` feature disabled every cell runs on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct ParallelRunner {
    #[cfg(feature = "parallel")]
    pool: Option<Arc<rayon::ThreadPool>>,
    threads: Option<usize>,
    call_timeout: Option<Duration>,
}

impl ParallelRunner {
    /// Runner on the global pool with no call timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner configured from an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Other`] if a dedicated thread pool cannot be built.
    pub fn from_config(config: &ExperimentConfig) -> Result<Self> {
        let runner = match config.threads() {
            Some(threads) => Self::new().with_threads(threads)?,
            None => Self::new(),
        };
        Ok(match config.call_timeout() {
            Some(timeout) => runner.with_call_timeout(timeout),
            None => runner,
        })
    }

    /// Use a dedicated pool of `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for zero threads and [`Error::Other`]
    /// if the pool cannot be built.
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(Error::config("thread count must be positive"));
        }

        #[cfg(feature = "parallel")]
        {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("gapbench-{i}"))
                .build()
                .map_err(|e| Error::Other(format!("failed to build thread pool: {e}")))?;
            self.pool = Some(Arc::new(pool));
        }
        #[cfg(not(feature = "parallel"))]
        {
            tracing::debug!(threads, "parallel feature disabled, running sequentially");
        }

        self.threads = Some(threads);
        Ok(self)
    }

    /// Abandon imputer calls that run longer than `timeout`.
    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Fixed worker count, if any.
    #[must_use]
    pub const fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Per-call timeout, if any.
    #[must_use]
    pub const fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    /// Run `op` inside this runner's pool.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        #[cfg(feature = "parallel")]
        {
            if let Some(pool) = &self.pool {
                return pool.install(op);
            }
        }
        op()
    }

    /// Impute every cell of the grid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `registry` is empty. Individual
    /// algorithm failures are recorded in the tensor, not returned.
    pub fn run(
        &self,
        grid: &ExperimentGrid,
        registry: &AlgorithmRegistry,
    ) -> Result<ResultTensor<CellOutcome>> {
        self.execute(grid, registry, "impute", |_, outcome| outcome)
    }

    /// Impute and score every cell, keeping only the metric vectors.
    ///
    /// Scoring happens inside the worker, so imputed series are dropped as
    /// soon as they are measured.
    ///
    /// # Errors
    ///
    /// As [`ParallelRunner::run`].
    pub fn run_scored(
        &self,
        grid: &ExperimentGrid,
        registry: &AlgorithmRegistry,
    ) -> Result<ResultTensor<CellScore>> {
        self.execute(grid, registry, "impute_and_score", |index, outcome| {
            let truth = grid.datasets()[index.dataset].series();
            outcome.and_then(|imputed| {
                MetricEngine::score(truth, &imputed).map_err(|e| AlgorithmFailure::Errored {
                    message: e.to_string(),
                })
            })
        })
    }

    fn execute<T, F>(
        &self,
        grid: &ExperimentGrid,
        registry: &AlgorithmRegistry,
        stage: &'static str,
        finish: F,
    ) -> Result<ResultTensor<std::result::Result<T, AlgorithmFailure>>>
    where
        T: Send,
        F: Fn(CellIndex, CellOutcome) -> std::result::Result<T, AlgorithmFailure> + Sync + Send,
    {
        if registry.is_empty() {
            return Err(Error::config("no algorithms selected"));
        }

        let axes = grid.axes(registry);
        let shape = axes.shape();
        let _span = tracing::info_span!(
            "run_grid",
            stage,
            cells = shape.len(),
            algorithms = shape.algorithms,
            threads = self.threads
        )
        .entered();

        let cells = self.install(|| {
            map_indexed(shape.len(), |offset| {
                let index = shape.index(offset);
                finish(index, self.impute_cell(grid, registry, &axes, index))
            })
        });

        let failures = cells.iter().filter(|cell| cell.is_err()).count();
        tracing::info!(cells = cells.len(), failures, "grid run finished");

        ResultTensor::from_cells(axes, cells)
    }

    fn impute_cell(
        &self,
        grid: &ExperimentGrid,
        registry: &AlgorithmRegistry,
        axes: &GridAxes,
        index: CellIndex,
    ) -> CellOutcome {
        let algorithm = &registry.entries()[index.algorithm];
        let gapped = grid.gapped(
            index.dataset,
            index.proportion,
            index.gap_width,
            index.replicate,
        );

        let outcome = algorithm.invoke(gapped, self.call_timeout);
        if let Err(failure) = &outcome {
            let key = axes.key(index);
            tracing::warn!(
                algorithm = %algorithm.id(),
                cell = %key,
                %failure,
                "imputation cell failed"
            );
        }
        outcome
    }
}
