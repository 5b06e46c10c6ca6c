//! Experiment grid and execution
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentConfig ──validate──> ExperimentGrid (dataset × proportion × gap width × replicate)
//!                                     │
//!                                     │ × AlgorithmRegistry
//!                                     ▼
//!                               ParallelRunner ──> ResultTensor<CellOutcome | CellScore>
//!                                                   axes: dataset, algorithm, proportion,
//!                                                         gap width, replicate
//! ```
//!
//! Every grid cell is independent. Random draws are seeded per
//! [`ExperimentKey`], so the same seed reproduces the same gaps regardless of
//! how many workers run or in which order they finish.
//!
//! ## Usage
//!
//! ```rust
//! use trueno_gapbench::algorithm::AlgorithmRegistry;
//! use trueno_gapbench::experiment::{ExperimentConfig, ExperimentGrid, ParallelRunner};
//! use trueno_gapbench::series::Dataset;
//!
//! # fn main() -> trueno_gapbench::Result<()> {
//! let datasets = vec![Dataset::new("ramp", (0..50).map(f64::from).collect::<Vec<_>>())];
//! let config = ExperimentConfig::builder()
//!     .proportions(vec![0.1])
//!     .gap_widths(vec![1, 5])
//!     .replicates(3)
//!     .seed(42)
//!     .build()?;
//!
//! let registry = AlgorithmRegistry::baseline().select(&["linear", "mean"])?;
//! let grid = ExperimentGrid::build(&datasets, &config)?;
//! let outcomes = ParallelRunner::from_config(&config)?.run(&grid, &registry)?;
//!
//! assert_eq!(outcomes.len(), 1 * 2 * 1 * 2 * 3);
//! # Ok(())
//! # }
//! ```

mod config;
mod grid;
mod key;
mod run_record;
mod runner;
mod tensor;

pub use config::{ExperimentConfig, ExperimentConfigBuilder};
pub use grid::{ExperimentGrid, GenerationWarning};
pub use key::{Condition, ExperimentKey};
pub use run_record::{RunRecord, RunStatus};
pub use runner::{CellOutcome, CellScore, ParallelRunner};
pub use tensor::{Axis, CellIndex, GridAxes, ResultTensor, Shape};

/// Map `f` over `0..len`, in parallel when the `parallel` feature is on.
///
/// Results come back in index order either way.
#[cfg(feature = "parallel")]
pub(crate) fn map_indexed<T, F>(len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    use rayon::prelude::*;
    (0..len).into_par_iter().map(f).collect()
}

/// Map `f` over `0..len`, in parallel when the `parallel` feature is on.
///
/// Results come back in index order either way.
#[cfg(not(feature = "parallel"))]
pub(crate) fn map_indexed<T, F>(len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..len).map(f).collect()
}
