//! Materialized replicate grid

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::algorithm::AlgorithmRegistry;
use crate::experiment::{map_indexed, Condition, ExperimentConfig, ExperimentKey, GridAxes};
use crate::gaps::{GapPlan, GapWarning};
use crate::series::{Dataset, GappedSeries};
use crate::Result;

/// A rounding diagnostic attached to the condition that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationWarning {
    /// Condition whose request was rounded
    pub condition: Condition,
    /// Rounding detail
    pub warning: GapWarning,
}

/// Every gapped replicate of every condition, generated up front.
///
/// Replicates are stored in `(dataset, proportion, gap_width, replicate)`
/// order. Each is drawn from a generator seeded by its [`ExperimentKey`], so
/// the grid is identical for a given seed however it is scheduled.
#[derive(Debug, Clone)]
pub struct ExperimentGrid {
    datasets: Vec<Dataset>,
    proportions: Vec<f64>,
    gap_widths: Vec<usize>,
    replicates: usize,
    seed: u64,
    draws: Vec<GappedSeries>,
    warnings: Vec<GenerationWarning>,
}

impl ExperimentGrid {
    /// Validate `config` against `datasets`, then draw every replicate.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] if validation fails. Nothing is
    /// drawn in that case.
    pub fn build(datasets: &[Dataset], config: &ExperimentConfig) -> Result<Self> {
        config.validate(datasets)?;

        let proportions = config.proportions().to_vec();
        let gap_widths = config.gap_widths().to_vec();
        let replicates = config.replicates();

        let mut plans = Vec::with_capacity(datasets.len() * proportions.len() * gap_widths.len());
        let mut warnings = Vec::new();
        for dataset in datasets {
            for &proportion in &proportions {
                for &gap_width in &gap_widths {
                    let plan = GapPlan::new(dataset.series().len(), proportion, gap_width)?;
                    tracing::debug!(
                        dataset = dataset.name(),
                        proportion,
                        gap_width,
                        missing = plan.effective_count(),
                        "planned condition"
                    );
                    if let Some(warning) = plan.warning() {
                        let condition = Condition {
                            dataset: dataset.id(),
                            proportion,
                            gap_width,
                        };
                        tracing::warn!(%condition, %warning, "rounded missing count");
                        warnings.push(GenerationWarning { condition, warning });
                    }
                    plans.push(plan);
                }
            }
        }

        let per_dataset = proportions.len() * gap_widths.len();
        let seed = config.seed();
        let _span = tracing::info_span!(
            "generate_gaps",
            conditions = plans.len(),
            replicates,
            seed
        )
        .entered();

        let draws = map_indexed(plans.len() * replicates, |offset| {
            let condition = offset / replicates;
            let replicate = offset % replicates;
            let dataset = &datasets[condition / per_dataset];
            let plan = &plans[condition];
            let key = ExperimentKey {
                dataset: dataset.id(),
                proportion: plan.proportion(),
                gap_width: plan.gap_width(),
                replicate,
            };
            let mut rng = ChaCha8Rng::seed_from_u64(key.seed(seed));
            GappedSeries::from_missing(dataset.series(), &plan.draw(&mut rng))
        });

        tracing::debug!(replicates = draws.len(), warnings = warnings.len(), "gap grid ready");

        Ok(Self {
            datasets: datasets.to_vec(),
            proportions,
            gap_widths,
            replicates,
            seed,
            draws,
            warnings,
        })
    }

    /// Ground-truth datasets.
    #[must_use]
    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// Proportions missing.
    #[must_use]
    pub fn proportions(&self) -> &[f64] {
        &self.proportions
    }

    /// Gap widths.
    #[must_use]
    pub fn gap_widths(&self) -> &[usize] {
        &self.gap_widths
    }

    /// Replicates per condition.
    #[must_use]
    pub const fn replicates(&self) -> usize {
        self.replicates
    }

    /// Base seed the grid was drawn with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Rounding diagnostics, in condition order.
    #[must_use]
    pub fn warnings(&self) -> &[GenerationWarning] {
        &self.warnings
    }

    /// Number of (dataset, proportion, gap width) conditions.
    #[must_use]
    pub fn condition_count(&self) -> usize {
        self.datasets.len() * self.proportions.len() * self.gap_widths.len()
    }

    /// Total number of gapped replicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// Whether no replicates were drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Gapped replicate at the given coordinates.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is out of bounds.
    #[must_use]
    pub fn gapped(
        &self,
        dataset: usize,
        proportion: usize,
        gap_width: usize,
        replicate: usize,
    ) -> &GappedSeries {
        assert!(replicate < self.replicates, "replicate {replicate} out of bounds");
        assert!(gap_width < self.gap_widths.len(), "gap width {gap_width} out of bounds");
        assert!(proportion < self.proportions.len(), "proportion {proportion} out of bounds");
        let condition = (dataset * self.proportions.len() + proportion) * self.gap_widths.len() + gap_width;
        &self.draws[condition * self.replicates + replicate]
    }

    /// Axis labels for tensors evaluated over `registry`.
    #[must_use]
    pub fn axes(&self, registry: &AlgorithmRegistry) -> Arc<GridAxes> {
        Arc::new(GridAxes {
            datasets: self.datasets.iter().map(Dataset::id).collect(),
            algorithms: registry.ids(),
            proportions: self.proportions.clone(),
            gap_widths: self.gap_widths.clone(),
            replicates: self.replicates,
        })
    }
}
