//! Run Record - one execution of a benchmark

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is created but not yet started.
    Pending,
    /// Grid generation or imputation is executing.
    Running,
    /// Every cell produced a usable result.
    Completed,
    /// Finished, but some cells recorded an algorithm failure.
    CompletedWithFailures,
}

/// Lifecycle and totals of one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    run_id: String,
    seed: u64,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    cells: usize,
    failed_cells: usize,
    warnings: usize,
}

impl RunRecord {
    /// Create a new run record in Pending status.
    ///
    /// # Arguments
    ///
    /// * `run_id` - Unique identifier for the run
    /// * `seed` - Base seed the grid is drawn with
    #[must_use]
    pub fn new(run_id: impl Into<String>, seed: u64) -> Self {
        Self {
            run_id: run_id.into(),
            seed,
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            cells: 0,
            failed_cells: 0,
            warnings: 0,
        }
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Base seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the current run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the start timestamp, if the run has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the run has completed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Cells evaluated.
    #[must_use]
    pub const fn cells(&self) -> usize {
        self.cells
    }

    /// Cells that recorded an algorithm failure.
    #[must_use]
    pub const fn failed_cells(&self) -> usize {
        self.failed_cells
    }

    /// Missing-count rounding diagnostics emitted.
    #[must_use]
    pub const fn warnings(&self) -> usize {
        self.warnings
    }

    /// Wall-clock duration, once the run has ended.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.ended_at? - self.started_at?)
    }

    /// Start the run, transitioning from Pending to Running.
    ///
    /// Sets the `started_at` timestamp to now.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Record totals and finish the run.
    ///
    /// The final status is [`RunStatus::CompletedWithFailures`] when
    /// `failed_cells` is non-zero. Sets the `ended_at` timestamp to now.
    pub fn complete(&mut self, cells: usize, failed_cells: usize, warnings: usize) {
        self.cells = cells;
        self.failed_cells = failed_cells;
        self.warnings = warnings;
        self.status = if failed_cells == 0 {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithFailures
        };
        self.ended_at = Some(Utc::now());
    }
}
