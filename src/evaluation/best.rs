use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::algorithm::AlgorithmId;
use crate::evaluation::EvaluationRow;
use crate::experiment::Condition;
use crate::metrics::{Direction, DirectionTable, Metric, MetricValue};

/// The algorithm selected for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Winner {
    /// Algorithm id
    pub algorithm: AlgorithmId,
    /// Registry position
    pub rank: usize,
}

/// Best algorithm for one (condition, metric) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestRow {
    /// Dataset, proportion and gap width
    #[serde(flatten)]
    pub condition: Condition,
    /// Criterion
    pub metric: Metric,
    /// Optimization direction applied
    pub direction: Direction,
    /// Selected algorithm, `None` when no algorithm had a usable value
    pub winner: Option<Winner>,
    /// The winner's aggregated value
    pub value: MetricValue,
}

/// Pick, per condition and metric, the algorithm with the best value.
///
/// Undefined and NaN values never win. Ties keep the algorithm that comes
/// first in registry order. Output is grouped by condition in first-seen
/// order, with metrics in reporting order inside each group.
#[must_use]
pub fn select_best(rows: &[EvaluationRow], directions: &DirectionTable) -> Vec<BestRow> {
    let mut groups: Vec<Vec<&EvaluationRow>> = Vec::new();
    let mut group_of = FxHashMap::default();
    for row in rows {
        let slot = *group_of.entry(row.condition.key()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }

    let mut best = Vec::with_capacity(groups.len() * Metric::COUNT);
    for mut group in groups {
        group.sort_by_key(|row| row.algorithm_rank);
        let condition = &group[0].condition;

        for metric in Metric::ALL {
            let direction = directions.get(metric);
            let mut incumbent: Option<(&EvaluationRow, f64)> = None;
            for &row in &group {
                let Some(value) = row.metrics.get(metric).value() else {
                    continue;
                };
                if value.is_nan() {
                    continue;
                }
                match incumbent {
                    Some((_, current)) if !direction.is_better(value, current) => {}
                    _ => incumbent = Some((row, value)),
                }
            }

            best.push(BestRow {
                condition: condition.clone(),
                metric,
                direction,
                winner: incumbent.map(|(row, _)| Winner {
                    algorithm: row.algorithm.clone(),
                    rank: row.algorithm_rank,
                }),
                value: incumbent.map_or(MetricValue::Undefined, |(_, value)| MetricValue::Value(value)),
            });
        }
    }

    best
}
