//! # Trueno-GapBench: Imputation Benchmark Harness
//!
//! **Version**: 0.1.0
//!
//! Trueno-GapBench measures how well univariate time-series imputation
//! algorithms reconstruct data that was deliberately removed. For every
//! dataset × proportion missing × gap width it draws reproducible gap
//! patterns, runs every registered imputer on every replicate in parallel,
//! scores the results against ground truth with seventeen metrics, and
//! reports the best algorithm per condition.
//!
//! ## Design Principles
//!
//! - **Reproducible**: each replicate's gaps come from a generator seeded by
//!   its own key, independent of scheduling
//! - **Fail early**: every configuration check runs before the first draw
//! - **Fail locally**: an erroring, panicking or hanging imputer only
//!   invalidates its own cell
//! - **Typed gaps in the data**: undefined metrics are
//!   [`metrics::MetricValue::Undefined`], never a silent NaN
//!
//! ## Example Usage
//!
//! ```rust
//! use trueno_gapbench::{Benchmark, Dataset, ExperimentConfig};
//!
//! # fn main() -> trueno_gapbench::Result<()> {
//! let datasets = vec![Dataset::new(
//!     "wave",
//!     (0..200).map(|i| (f64::from(i) / 10.0).sin() + 5.0).collect::<Vec<_>>(),
//! )];
//!
//! let config = ExperimentConfig::builder()
//!     .proportions(vec![0.05, 0.1, 0.2])
//!     .gap_widths(vec![1, 5])
//!     .replicates(10)
//!     .seed(2024)
//!     .build()?;
//!
//! let report = Benchmark::baseline().run(&datasets, &config)?;
//! for verdict in &report.summary {
//!     println!("{}: {:?}", verdict.condition, verdict.winner);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::cast_precision_loss)]

pub mod algorithm;
pub mod benchmark;
pub mod error;
pub mod evaluation;
pub mod experiment;
pub mod gaps;
pub mod metrics;
pub mod series;
pub mod table;

pub use algorithm::{AlgorithmId, AlgorithmRegistry, ImputeError, Imputer};
pub use benchmark::{Benchmark, BenchmarkBuilder, BenchmarkReport, FailureRecord};
pub use error::{Error, Result};
pub use experiment::ExperimentConfig;
pub use series::{Dataset, GappedSeries, Series};
