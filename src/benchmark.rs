//! End-to-end benchmark runs
//!
//! [`Benchmark::run`] chains the whole pipeline:
//!
//! 1. select algorithms from the registry
//! 2. validate the configuration against every dataset (no draws yet)
//! 3. draw the replicate grid
//! 4. impute and score every cell in parallel
//! 5. aggregate, select best per metric, summarize
//!
//! Only configuration problems abort a run. Rounding warnings and per-cell
//! algorithm failures are collected into the [`BenchmarkReport`].

use std::path::Path;

use serde::Serialize;

use crate::algorithm::{AlgorithmFailure, AlgorithmId, AlgorithmRegistry};
use crate::evaluation::{select_best, summarize, Aggregator, BestRow, EvaluationRow, SummaryRow};
use crate::experiment::{
    ExperimentConfig, ExperimentGrid, ExperimentKey, GenerationWarning, ParallelRunner, RunRecord,
};
use crate::metrics::DirectionTable;
use crate::series::Dataset;
use crate::table::{write_parquet, ToRecordBatch};
use crate::{Error, Result};

/// A failed grid cell, for the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    /// Algorithm id
    pub algorithm: AlgorithmId,
    /// Replicate that failed
    pub key: ExperimentKey,
    /// What went wrong
    pub failure: AlgorithmFailure,
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    /// Run metadata
    pub run: RunRecord,
    /// Replicate-averaged metrics per condition and algorithm
    pub evaluations: Vec<EvaluationRow>,
    /// Best algorithm per condition and metric
    pub best: Vec<BestRow>,
    /// Overall verdict per condition
    pub summary: Vec<SummaryRow>,
    /// Missing-count rounding diagnostics
    pub warnings: Vec<GenerationWarning>,
    /// Cells whose algorithm failed
    pub failures: Vec<FailureRecord>,
}

impl BenchmarkReport {
    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `evaluations.parquet`, `best.parquet` and `summary.parquet`
    /// into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`], [`Error::Arrow`] or [`Error::Parquet`] on
    /// failure.
    pub fn write_parquet_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        write_parquet(&self.evaluations.to_record_batch()?, dir.join("evaluations.parquet"))?;
        write_parquet(&self.best.to_record_batch()?, dir.join("best.parquet"))?;
        write_parquet(&self.summary.to_record_batch()?, dir.join("summary.parquet"))?;
        tracing::info!(dir = %dir.display(), "wrote result tables");
        Ok(())
    }
}

/// Imputation benchmark over a fixed algorithm registry.
///
/// # Example
///
/// ```rust
/// use trueno_gapbench::{Benchmark, Dataset, ExperimentConfig};
///
/// # fn main() -> trueno_gapbench::Result<()> {
/// let datasets = vec![Dataset::new("ramp", (0..100).map(f64::from).collect::<Vec<_>>())];
/// let config = ExperimentConfig::builder()
///     .proportions(vec![0.1])
///     .gap_widths(vec![10])
///     .replicates(5)
///     .algorithms(["mean", "linear"])
///     .seed(1)
///     .build()?;
///
/// let report = Benchmark::baseline().run(&datasets, &config)?;
/// let verdict = &report.summary[0];
/// assert_eq!(verdict.winner.as_ref().map(|w| &*w.algorithm), Some("linear"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Benchmark {
    registry: AlgorithmRegistry,
    directions: DirectionTable,
    run_id: Option<String>,
}

impl Benchmark {
    /// Benchmark over `registry` with the default metric directions.
    #[must_use]
    pub fn new(registry: AlgorithmRegistry) -> Self {
        Self {
            registry,
            directions: DirectionTable::default(),
            run_id: None,
        }
    }

    /// Benchmark over the built-in baseline imputers.
    #[must_use]
    pub fn baseline() -> Self {
        Self::new(AlgorithmRegistry::baseline())
    }

    /// Create a builder.
    #[must_use]
    pub fn builder(registry: AlgorithmRegistry) -> BenchmarkBuilder {
        BenchmarkBuilder::new(registry)
    }

    /// Registered algorithms.
    #[must_use]
    pub const fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Metric directions used for best-method selection.
    #[must_use]
    pub const fn directions(&self) -> &DirectionTable {
        &self.directions
    }

    /// Run the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unknown algorithm ids or any
    /// invalid experiment parameter. Such errors are raised before any gap
    /// is drawn.
    pub fn run(&self, datasets: &[Dataset], config: &ExperimentConfig) -> Result<BenchmarkReport> {
        let registry = self.registry.select(config.algorithms())?;
        if registry.is_empty() {
            return Err(Error::config("no algorithms registered"));
        }
        config.validate(datasets)?;
        let runner = ParallelRunner::from_config(config)?;

        let run_id = self
            .run_id
            .clone()
            .unwrap_or_else(|| format!("gapbench-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ")));
        let mut run = RunRecord::new(run_id, config.seed());
        let _span = tracing::info_span!("benchmark", run_id = run.run_id()).entered();
        run.start();
        tracing::info!(
            datasets = datasets.len(),
            algorithms = registry.len(),
            proportions = config.proportions().len(),
            gap_widths = config.gap_widths().len(),
            replicates = config.replicates(),
            "benchmark started"
        );

        let grid = runner.install(|| ExperimentGrid::build(datasets, config))?;
        let scores = runner.run_scored(&grid, &registry)?;

        let failures: Vec<FailureRecord> = scores
            .iter()
            .filter_map(|(index, cell)| {
                cell.as_ref().err().map(|failure| FailureRecord {
                    algorithm: scores.axes().algorithms[index.algorithm].clone(),
                    key: scores.axes().key(index),
                    failure: failure.clone(),
                })
            })
            .collect();

        let evaluations = Aggregator::aggregate(&scores);
        let best = select_best(&evaluations, &self.directions);
        let summary = summarize(&best);
        let warnings = grid.warnings().to_vec();

        run.complete(scores.len(), failures.len(), warnings.len());
        tracing::info!(
            status = ?run.status(),
            cells = run.cells(),
            failed = run.failed_cells(),
            "benchmark finished"
        );

        Ok(BenchmarkReport {
            run,
            evaluations,
            best,
            summary,
            warnings,
            failures,
        })
    }
}

/// Builder for [`Benchmark`].
#[derive(Debug)]
pub struct BenchmarkBuilder {
    registry: AlgorithmRegistry,
    directions: DirectionTable,
    run_id: Option<String>,
}

impl BenchmarkBuilder {
    /// Create a new builder with the required registry.
    #[must_use]
    pub fn new(registry: AlgorithmRegistry) -> Self {
        Self {
            registry,
            directions: DirectionTable::default(),
            run_id: None,
        }
    }

    /// Override metric directions.
    #[must_use]
    pub const fn directions(mut self, directions: DirectionTable) -> Self {
        self.directions = directions;
        self
    }

    /// Fix the run id instead of deriving one from the clock.
    #[must_use]
    pub fn run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Build the `Benchmark`.
    #[must_use]
    pub fn build(self) -> Benchmark {
        Benchmark {
            registry: self.registry,
            directions: self.directions,
            run_id: self.run_id,
        }
    }
}
