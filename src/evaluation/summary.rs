use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::evaluation::{BestRow, Winner};
use crate::experiment::Condition;

/// Overall verdict for one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Dataset, proportion and gap width
    #[serde(flatten)]
    pub condition: Condition,
    /// Algorithm selected by the most metrics, `None` if no metric had a winner
    pub winner: Option<Winner>,
    /// Metrics won by the winner
    pub wins: usize,
    /// Metrics that had any winner
    pub decided: usize,
}

/// Collapse [`BestRow`]s into one verdict per condition.
///
/// The winner is the algorithm that won the most metrics. Equal counts go to
/// the algorithm earlier in registry order. Conditions keep first-seen order.
#[must_use]
pub fn summarize(best: &[BestRow]) -> Vec<SummaryRow> {
    let mut groups: Vec<(&Condition, Vec<&Winner>)> = Vec::new();
    let mut group_of = FxHashMap::default();
    for row in best {
        let slot = *group_of.entry(row.condition.key()).or_insert_with(|| {
            groups.push((&row.condition, Vec::new()));
            groups.len() - 1
        });
        if let Some(winner) = &row.winner {
            groups[slot].1.push(winner);
        }
    }

    groups
        .into_iter()
        .map(|(condition, winners)| {
            let mut votes: FxHashMap<usize, (&Winner, usize)> = FxHashMap::default();
            for &winner in &winners {
                votes.entry(winner.rank).or_insert((winner, 0)).1 += 1;
            }

            let top = votes
                .into_values()
                .max_by(|(a, a_wins), (b, b_wins)| a_wins.cmp(b_wins).then(b.rank.cmp(&a.rank)));

            SummaryRow {
                condition: condition.clone(),
                winner: top.map(|(winner, _)| winner.clone()),
                wins: top.map_or(0, |(_, wins)| wins),
                decided: winners.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Direction, Metric, MetricValue};

    fn condition(dataset: &str) -> Condition {
        Condition {
            dataset: dataset.into(),
            proportion: 0.2,
            gap_width: 5,
        }
    }

    fn best(dataset: &str, metric: Metric, winner: Option<(&str, usize)>) -> BestRow {
        BestRow {
            condition: condition(dataset),
            metric,
            direction: Direction::Minimize,
            winner: winner.map(|(algorithm, rank)| Winner {
                algorithm: algorithm.into(),
                rank,
            }),
            value: MetricValue::Value(0.0),
        }
    }

    #[test]
    fn test_majority_wins() {
        let rows = [
            best("d", Metric::Mse, Some(("spline", 3))),
            best("d", Metric::Mae, Some(("spline", 3))),
            best("d", Metric::R, Some(("linear", 2))),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].winner.as_ref().unwrap().algorithm.as_ref(), "spline");
        assert_eq!((summary[0].wins, summary[0].decided), (2, 3));
    }

    #[test]
    fn test_equal_votes_go_to_lower_rank() {
        let rows = [
            best("d", Metric::Mse, Some(("spline", 3))),
            best("d", Metric::R, Some(("linear", 2))),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary[0].winner.as_ref().unwrap().rank, 2);
    }

    #[test]
    fn test_undecided_condition() {
        let rows = [best("d", Metric::Mre, None), best("e", Metric::Mse, Some(("mean", 0)))];
        let summary = summarize(&rows);
        assert_eq!(summary.len(), 2);
        assert!(summary[0].winner.is_none());
        assert_eq!((summary[0].wins, summary[0].decided), (0, 0));
        assert_eq!(summary[1].wins, 1);
    }
}
