//! Reference imputers
//!
//! Simple, dependency-free algorithms covering the usual families:
//! nearest-neighbour copy, linear and spline interpolation, weighted moving
//! average, central-tendency and random substitution. They are registered
//! through the same [`Imputer`] interface as any external algorithm.
//!
//! Positions are used as the time axis (`x = index`). Observed values are
//! returned unchanged; only gapped positions are written.

use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHasher;

use super::{ImputeError, Imputer};
use crate::series::GappedSeries;

/// Seed baked into the `random` entry of [`super::AlgorithmRegistry::baseline`].
pub const BASELINE_RANDOM_SEED: u64 = 0x6761_7062_656e_6368;

type ImputeResult = std::result::Result<Vec<f64>, ImputeError>;

fn observed_points(series: &GappedSeries) -> std::result::Result<Vec<(usize, f64)>, ImputeError> {
    let points: Vec<(usize, f64)> = series.observed().collect();
    if points.is_empty() {
        return Err(ImputeError::NoObservations);
    }
    Ok(points)
}

/// Fill each gapped position with `fill(position)`.
fn fill_missing(series: &GappedSeries, mut fill: impl FnMut(usize) -> f64) -> Vec<f64> {
    series
        .values()
        .iter()
        .enumerate()
        .map(|(i, v)| v.unwrap_or_else(|| fill(i)))
        .collect()
}

/// Last observation carried forward; leading gaps take the first observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Locf;

impl Imputer for Locf {
    fn impute(&self, series: &GappedSeries) -> ImputeResult {
        let first = observed_points(series)?[0].1;
        let mut last = first;
        Ok(series
            .values()
            .iter()
            .map(|v| {
                if let Some(value) = *v {
                    last = value;
                }
                last
            })
            .collect())
    }
}

/// Next observation carried backward; trailing gaps take the last observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nocb;

impl Imputer for Nocb {
    fn impute(&self, series: &GappedSeries) -> ImputeResult {
        let points = observed_points(series)?;
        let mut next = points[points.len() - 1].1;
        let mut filled: Vec<f64> = series
            .values()
            .iter()
            .rev()
            .map(|v| {
                if let Some(value) = *v {
                    next = value;
                }
                next
            })
            .collect();
        filled.reverse();
        Ok(filled)
    }
}

/// Straight line between the neighbouring observations.
///
/// Gaps before the first or after the last observation copy the nearest
/// observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolation;

impl Imputer for LinearInterpolation {
    fn impute(&self, series: &GappedSeries) -> ImputeResult {
        let points = observed_points(series)?;
        // Index of the first observation at or after the current position
        let mut upper = 0;
        Ok(fill_missing(series, |i| {
            while upper < points.len() && points[upper].0 < i {
                upper += 1;
            }
            match (upper.checked_sub(1).map(|k| points[k]), points.get(upper)) {
                (Some((x0, y0)), Some(&(x1, y1))) => {
                    let alpha = (i - x0) as f64 / (x1 - x0) as f64;
                    alpha.mul_add(y1 - y0, y0)
                }
                (Some((_, y)), None) | (None, Some(&(_, y))) => y,
                (None, None) => unreachable!("observed_points is never empty"),
            }
        }))
    }
}

/// Natural cubic spline through the observations.
///
/// Gaps outside the observed range copy the nearest observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplineInterpolation;

impl SplineInterpolation {
    /// Second derivatives at each knot with natural boundary conditions,
    /// solved with the Thomas algorithm.
    fn second_derivatives(points: &[(usize, f64)]) -> Vec<f64> {
        let m = points.len();
        let mut second = vec![0.0; m];
        if m < 3 {
            return second;
        }

        let h: Vec<f64> = points
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) as f64)
            .collect();
        let slope: Vec<f64> = points
            .windows(2)
            .zip(&h)
            .map(|(w, h)| (w[1].1 - w[0].1) / h)
            .collect();

        // Unknowns are the interior knots 1..m-1
        let k = m - 2;
        let mut diag = vec![0.0; k];
        let mut upper = vec![0.0; k];
        let mut rhs = vec![0.0; k];
        for j in 0..k {
            diag[j] = 2.0 * (h[j] + h[j + 1]);
            upper[j] = h[j + 1];
            rhs[j] = 6.0 * (slope[j + 1] - slope[j]);
        }

        // Forward sweep; the sub-diagonal entry of row j is h[j]
        for j in 1..k {
            let factor = h[j] / diag[j - 1];
            diag[j] -= factor * upper[j - 1];
            rhs[j] -= factor * rhs[j - 1];
        }

        // Back substitution
        second[k] = rhs[k - 1] / diag[k - 1];
        for j in (0..k - 1).rev() {
            second[j + 1] = (rhs[j] - upper[j] * second[j + 2]) / diag[j];
        }
        second
    }
}

impl Imputer for SplineInterpolation {
    fn impute(&self, series: &GappedSeries) -> ImputeResult {
        let points = observed_points(series)?;
        let second = Self::second_derivatives(&points);
        let mut upper = 0;

        Ok(fill_missing(series, |i| {
            while upper < points.len() && points[upper].0 < i {
                upper += 1;
            }
            if upper == 0 {
                return points[0].1;
            }
            if upper == points.len() {
                return points[points.len() - 1].1;
            }

            let (x0, y0) = points[upper - 1];
            let (x1, y1) = points[upper];
            let (m0, m1) = (second[upper - 1], second[upper]);
            let h = (x1 - x0) as f64;
            let left = (x1 - i) as f64;
            let right = (i - x0) as f64;

            m0 * left.powi(3) / (6.0 * h)
                + m1 * right.powi(3) / (6.0 * h)
                + (y0 / h - m0 * h / 6.0) * left
                + (y1 / h - m1 * h / 6.0) * right
        }))
    }
}

/// Weighting scheme for [`MovingAverage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weighting {
    /// Every observation in the window counts equally
    Simple,
    /// Weight `1 / (d + 1)` at distance `d`
    Linear,
    /// Weight `1 / 2^d` at distance `d`
    #[default]
    Exponential,
}

impl Weighting {
    fn weight(self, distance: usize) -> f64 {
        match self {
            Self::Simple => 1.0,
            Self::Linear => 1.0 / (distance as f64 + 1.0),
            Self::Exponential => 0.5_f64.powi(i32::try_from(distance).unwrap_or(i32::MAX)),
        }
    }
}

/// Weighted mean of the observations within `half_window` positions on
/// either side.
///
/// The window widens until at least two observations fall inside it (or the
/// whole series is covered).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverage {
    half_window: usize,
    weighting: Weighting,
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(4, Weighting::Exponential)
    }
}

impl MovingAverage {
    /// Create a moving-average imputer; a zero window is widened to 1.
    #[must_use]
    pub fn new(half_window: usize, weighting: Weighting) -> Self {
        Self {
            half_window: half_window.max(1),
            weighting,
        }
    }
}

impl Imputer for MovingAverage {
    fn impute(&self, series: &GappedSeries) -> ImputeResult {
        observed_points(series)?;
        let n = series.len();

        Ok(fill_missing(series, |i| {
            let mut radius = self.half_window;
            loop {
                let lo = i.saturating_sub(radius);
                let hi = (i + radius).min(n - 1);
                let (mut total, mut weights, mut count) = (0.0, 0.0, 0);
                for j in lo..=hi {
                    if let Some(value) = series.get(j) {
                        let w = self.weighting.weight(i.abs_diff(j));
                        total += w * value;
                        weights += w;
                        count += 1;
                    }
                }
                if count >= 2 || (lo == 0 && hi == n - 1 && count > 0) {
                    return total / weights;
                }
                radius += 1;
            }
        }))
    }
}

/// Mean of the observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanFill;

impl Imputer for MeanFill {
    fn impute(&self, series: &GappedSeries) -> ImputeResult {
        let points = observed_points(series)?;
        let mean = points.iter().map(|&(_, v)| v).sum::<f64>() / points.len() as f64;
        Ok(fill_missing(series, |_| mean))
    }
}

/// Median of the observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianFill;

impl Imputer for MedianFill {
    fn impute(&self, series: &GappedSeries) -> ImputeResult {
        let mut values: Vec<f64> = observed_points(series)?.into_iter().map(|(_, v)| v).collect();
        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };
        Ok(fill_missing(series, |_| median))
    }
}

/// Uniform draws between the observed minimum and maximum.
///
/// The generator is seeded from the baked-in seed and the gap pattern, so
/// the same gapped series always receives the same fill regardless of
/// which thread runs it.
#[derive(Debug, Clone, Copy)]
pub struct RandomFill {
    seed: u64,
}

impl RandomFill {
    /// Create a random-substitution imputer.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, series: &GappedSeries) -> ChaCha8Rng {
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        series.len().hash(&mut hasher);
        series.missing_positions().hash(&mut hasher);
        ChaCha8Rng::seed_from_u64(hasher.finish())
    }
}

impl Imputer for RandomFill {
    fn impute(&self, series: &GappedSeries) -> ImputeResult {
        let points = observed_points(series)?;
        let (lo, hi) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| {
                (lo.min(v), hi.max(v))
            });
        let mut rng = self.rng_for(series);
        Ok(fill_missing(series, |_| {
            if lo < hi {
                rng.gen_range(lo..=hi)
            } else {
                lo
            }
        }))
    }
}
