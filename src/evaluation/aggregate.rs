use serde::Serialize;

use crate::algorithm::AlgorithmId;
use crate::experiment::{CellScore, Condition, ResultTensor};
use crate::metrics::{Metric, MetricValue, MetricVector};

/// Replicate-averaged metrics for one algorithm under one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRow {
    /// Dataset, proportion and gap width
    #[serde(flatten)]
    pub condition: Condition,
    /// Algorithm id
    pub algorithm: AlgorithmId,
    /// Position of the algorithm in the registry
    pub algorithm_rank: usize,
    /// Replicates that produced a metric vector
    pub replicates: usize,
    /// Replicates that recorded an algorithm failure
    pub failures: usize,
    /// Mean of each metric over contributing replicates
    pub metrics: MetricVector,
}

/// Collapses the replicate axis of a scored tensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    /// One row per (dataset, proportion, gap width, algorithm).
    ///
    /// Each metric is the arithmetic mean over replicates where it is
    /// defined. Failed cells and [`MetricValue::Undefined`] entries are
    /// skipped; a metric with no contributing replicate stays undefined.
    /// NaN values are not skipped, so they propagate into the mean.
    ///
    /// Rows are ordered by dataset, proportion, gap width, then registry
    /// order.
    #[must_use]
    pub fn aggregate(scores: &ResultTensor<CellScore>) -> Vec<EvaluationRow> {
        let axes = scores.axes();
        let shape = scores.shape();
        let mut rows = Vec::with_capacity(shape.len() / shape.replicates.max(1));

        for d in 0..shape.datasets {
            for p in 0..shape.proportions {
                for w in 0..shape.gap_widths {
                    let condition = axes.condition(d, p, w);
                    for a in 0..shape.algorithms {
                        let cells = scores.replicates(d, a, p, w);
                        let vectors: Vec<&MetricVector> =
                            cells.iter().filter_map(|cell| cell.as_ref().ok()).collect();

                        rows.push(EvaluationRow {
                            condition: condition.clone(),
                            algorithm: axes.algorithms[a].clone(),
                            algorithm_rank: a,
                            replicates: vectors.len(),
                            failures: cells.len() - vectors.len(),
                            metrics: MetricVector::from_fn(|metric| mean_of(&vectors, metric)),
                        });
                    }
                }
            }
        }

        rows
    }
}

fn mean_of(vectors: &[&MetricVector], metric: Metric) -> MetricValue {
    let (sum, count) = vectors
        .iter()
        .filter_map(|vector| vector.get(metric).value())
        .fold((0.0, 0_usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        MetricValue::Undefined
    } else {
        MetricValue::Value(sum / count as f64)
    }
}
