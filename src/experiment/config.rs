//! Experiment configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gaps::GapPlan;
use crate::series::Dataset;
use crate::{Error, Result};

/// The enumerated parameters of one benchmark run.
///
/// ## JSON form
///
/// ```json
/// {
///   "proportions": [0.05, 0.1, 0.2],
///   "gap_widths": [1, 5, 10],
///   "replicates": 20,
///   "algorithms": ["linear", "spline", "mean"],
///   "seed": 42,
///   "threads": 8,
///   "call_timeout_ms": 30000
/// }
/// ```
///
/// `algorithms` empty (or absent) selects every registered algorithm.
/// `threads` absent uses every available core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    proportions: Vec<f64>,
    gap_widths: Vec<usize>,
    replicates: usize,
    #[serde(default)]
    algorithms: Vec<String>,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    threads: Option<usize>,
    #[serde(default)]
    call_timeout_ms: Option<u64>,
}

impl ExperimentConfig {
    /// Create a builder.
    #[must_use]
    pub fn builder() -> ExperimentConfigBuilder {
        ExperimentConfigBuilder::default()
    }

    /// Parse and check a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed JSON and
    /// [`Error::Configuration`] for invalid parameters.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check_parameters()?;
        Ok(config)
    }

    /// Read and check a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`ExperimentConfig::from_json_str`].
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Proportions of each series to remove.
    #[must_use]
    pub fn proportions(&self) -> &[f64] {
        &self.proportions
    }

    /// Gap widths (block lengths).
    #[must_use]
    pub fn gap_widths(&self) -> &[usize] {
        &self.gap_widths
    }

    /// Replicates drawn per condition.
    #[must_use]
    pub const fn replicates(&self) -> usize {
        self.replicates
    }

    /// Selected algorithm ids, in evaluation order (empty = all).
    #[must_use]
    pub fn algorithms(&self) -> &[String] {
        &self.algorithms
    }

    /// Base random seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Fixed worker count, if any.
    #[must_use]
    pub const fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Per-call imputer timeout, if any.
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Check every parameter against every dataset.
    ///
    /// Runs the full gap-request validation for each dataset × proportion ×
    /// gap width without drawing any random numbers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] describing the first violation.
    pub fn validate(&self, datasets: &[Dataset]) -> Result<()> {
        self.check_parameters()?;

        if datasets.is_empty() {
            return Err(Error::config("at least one dataset is required"));
        }

        for (i, dataset) in datasets.iter().enumerate() {
            if datasets[..i].iter().any(|d| d.name() == dataset.name()) {
                return Err(Error::config(format!(
                    "duplicate dataset name: {}",
                    dataset.name()
                )));
            }
            if let Some(position) = dataset.series().values().iter().position(|v| !v.is_finite()) {
                return Err(Error::config(format!(
                    "dataset {}: non-finite value at position {position}",
                    dataset.name()
                )));
            }

            for &proportion in &self.proportions {
                for &gap_width in &self.gap_widths {
                    GapPlan::new(dataset.series().len(), proportion, gap_width).map_err(|e| {
                        Error::config(format!("dataset {}: {e}", dataset.name()))
                    })?;
                }
            }
        }

        Ok(())
    }

    /// Dataset-independent checks.
    fn check_parameters(&self) -> Result<()> {
        if self.proportions.is_empty() {
            return Err(Error::config("at least one proportion is required"));
        }
        for (i, &p) in self.proportions.iter().enumerate() {
            if !p.is_finite() || !(0.0..1.0).contains(&p) {
                return Err(Error::config(format!(
                    "proportion {p} must lie within [0, 1)"
                )));
            }
            if self.proportions[..i].contains(&p) {
                return Err(Error::config(format!("duplicate proportion: {p}")));
            }
        }

        if self.gap_widths.is_empty() {
            return Err(Error::config("at least one gap width is required"));
        }
        for (i, &w) in self.gap_widths.iter().enumerate() {
            if w == 0 {
                return Err(Error::config("gap widths must be positive integers"));
            }
            if self.gap_widths[..i].contains(&w) {
                return Err(Error::config(format!("duplicate gap width: {w}")));
            }
        }

        if self.replicates == 0 {
            return Err(Error::config("replicate count must be positive"));
        }
        if self.threads == Some(0) {
            return Err(Error::config("thread count must be positive"));
        }
        if self.call_timeout_ms == Some(0) {
            return Err(Error::config("call timeout must be positive"));
        }

        Ok(())
    }
}

/// Builder for [`ExperimentConfig`].
#[derive(Debug, Default)]
pub struct ExperimentConfigBuilder {
    proportions: Vec<f64>,
    gap_widths: Vec<usize>,
    replicates: usize,
    algorithms: Vec<String>,
    seed: u64,
    threads: Option<usize>,
    call_timeout_ms: Option<u64>,
}

impl ExperimentConfigBuilder {
    /// Proportions of each series to remove.
    #[must_use]
    pub fn proportions(mut self, proportions: Vec<f64>) -> Self {
        self.proportions = proportions;
        self
    }

    /// Gap widths (block lengths).
    #[must_use]
    pub fn gap_widths(mut self, gap_widths: Vec<usize>) -> Self {
        self.gap_widths = gap_widths;
        self
    }

    /// Replicates drawn per condition.
    #[must_use]
    pub const fn replicates(mut self, replicates: usize) -> Self {
        self.replicates = replicates;
        self
    }

    /// Restrict and order the evaluated algorithms.
    #[must_use]
    pub fn algorithms<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.algorithms = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Base random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fixed worker count.
    #[must_use]
    pub const fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Per-call imputer timeout.
    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Build and check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for invalid parameters.
    pub fn build(self) -> Result<ExperimentConfig> {
        let config = ExperimentConfig {
            proportions: self.proportions,
            gap_widths: self.gap_widths,
            replicates: self.replicates,
            algorithms: self.algorithms,
            seed: self.seed,
            threads: self.threads,
            call_timeout_ms: self.call_timeout_ms,
        };
        config.check_parameters()?;
        Ok(config)
    }
}
