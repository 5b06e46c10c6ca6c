//! Performance metrics
//!
//! Seventeen goodness-of-fit statistics comparing a ground-truth series `x`
//! against an imputed series `X` of the same length `n`.
//!
//! | metric            | formula                          | direction   |
//! |-------------------|----------------------------------|-------------|
//! | `r`               | Pearson correlation              | maximize    |
//! | `r2`              | r²                               | maximize    |
//! | `abs_differences` | Σ\|x − X\|                       | minimize    |
//! | `mbe`             | Σ(X − x) / n                     | toward zero |
//! | `me`              | Σ(x − X) / n                     | toward zero |
//! | `mae`             | \|Σ(x − X)\| / n                 | minimize    |
//! | `mre`             | Σ((x − X) / x)                   | toward zero |
//! | `mare`            | Σ\|(x − X) / x\| / n             | minimize    |
//! | `mape`            | 100 · MARE                       | minimize    |
//! | `sse`             | Σ(x − X)²                        | minimize    |
//! | `mse`             | SSE / n                          | minimize    |
//! | `rms`             | √(Σ((X − x) / x)² / n)           | minimize    |
//! | `nmse`            | SSE / Σ(x − x̄)²                  | minimize    |
//! | `re`              | 1 − NMSE                         | maximize    |
//! | `rmse`            | √MSE                             | minimize    |
//! | `nrmse`           | 100 · RMSE / (max x − min x)     | minimize    |
//! | `rmss`            | √(Σ((X − x) / sd(x))² / n)       | minimize    |
//!
//! `mae` is the absolute value of the summed signed error over `n`, not the
//! mean of absolute differences; `abs_differences` carries the latter's sum.
//!
//! ## Undefined values
//!
//! `mre`, `mare`, `mape` and `rms` divide by `x` and are
//! [`MetricValue::Undefined`] whenever any `x` is exactly zero. `rmss` is
//! undefined whenever the sample standard deviation of `x` is exactly zero.
//! Every other metric is computed unconditionally and may be NaN or infinite.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::series::Series;
use crate::{Error, Result};

/// Performance criteria, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Pearson correlation coefficient
    R,
    /// Coefficient of determination (r²)
    R2,
    /// Sum of absolute differences
    AbsDifferences,
    /// Mean bias error
    Mbe,
    /// Mean error
    Me,
    /// Absolute summed error over n
    Mae,
    /// Summed relative error
    Mre,
    /// Mean absolute relative error
    Mare,
    /// Mean absolute percentage error
    Mape,
    /// Sum of squared errors
    Sse,
    /// Mean squared error
    Mse,
    /// Root mean square of relative errors
    Rms,
    /// Normalized mean squared error
    Nmse,
    /// Reduction of error (Nash–Sutcliffe efficiency)
    Re,
    /// Root mean squared error
    Rmse,
    /// Range-normalized RMSE, in percent
    Nrmse,
    /// Root mean square standardized error
    Rmss,
}

impl Metric {
    /// Number of metrics.
    pub const COUNT: usize = 17;

    /// Every metric in reporting order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::R,
        Self::R2,
        Self::AbsDifferences,
        Self::Mbe,
        Self::Me,
        Self::Mae,
        Self::Mre,
        Self::Mare,
        Self::Mape,
        Self::Sse,
        Self::Mse,
        Self::Rms,
        Self::Nmse,
        Self::Re,
        Self::Rmse,
        Self::Nrmse,
        Self::Rmss,
    ];

    /// Position in [`Metric::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column name used in tables and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::R => "r",
            Self::R2 => "r2",
            Self::AbsDifferences => "abs_differences",
            Self::Mbe => "mbe",
            Self::Me => "me",
            Self::Mae => "mae",
            Self::Mre => "mre",
            Self::Mare => "mare",
            Self::Mape => "mape",
            Self::Sse => "sse",
            Self::Mse => "mse",
            Self::Rms => "rms",
            Self::Nmse => "nmse",
            Self::Re => "re",
            Self::Rmse => "rmse",
            Self::Nrmse => "nrmse",
            Self::Rmss => "rmss",
        }
    }

    /// Parse a column name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Default optimization direction.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::R | Self::R2 | Self::Re => Direction::Maximize,
            Self::Mbe | Self::Me | Self::Mre => Direction::TowardZero,
            _ => Direction::Minimize,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which values of a metric are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Larger is better
    Maximize,
    /// Smaller is better
    Minimize,
    /// Smaller absolute value is better (signed bias metrics)
    TowardZero,
}

impl Direction {
    /// Whether `candidate` strictly beats `incumbent`.
    ///
    /// NaN never beats anything, so ties and incomparable values keep the
    /// incumbent.
    #[must_use]
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Maximize => candidate > incumbent,
            Self::Minimize => candidate < incumbent,
            Self::TowardZero => candidate.abs() < incumbent.abs(),
        }
    }

    /// Label used in tables.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Maximize => "maximize",
            Self::Minimize => "minimize",
            Self::TowardZero => "toward_zero",
        }
    }
}

/// Per-metric optimization directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionTable {
    directions: [Direction; Metric::COUNT],
}

impl Default for DirectionTable {
    fn default() -> Self {
        Self {
            directions: Metric::ALL.map(Metric::direction),
        }
    }
}

impl DirectionTable {
    /// Direction for `metric`.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> Direction {
        self.directions[metric.index()]
    }

    /// Override the direction for one metric.
    #[must_use]
    pub fn with(mut self, metric: Metric, direction: Direction) -> Self {
        self.directions[metric.index()] = direction;
        self
    }
}

/// A metric value, or the typed sentinel for a mathematically undefined one.
///
/// Serializes as a number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum MetricValue {
    /// Computed value (may itself be NaN or infinite)
    Value(f64),
    /// Division by an exact zero was required
    #[default]
    Undefined,
}

impl MetricValue {
    /// The value, `None` when undefined.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Undefined => None,
        }
    }

    /// Whether this is the undefined sentinel.
    #[must_use]
    pub const fn is_undefined(self) -> bool {
        matches!(self, Self::Undefined)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Undefined, Self::Value)
    }
}

impl From<MetricValue> for Option<f64> {
    fn from(value: MetricValue) -> Self {
        value.value()
    }
}

/// One value per [`Metric`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricVector {
    values: [MetricValue; Metric::COUNT],
}

impl MetricVector {
    /// Build a vector by evaluating `f` for every metric.
    pub fn from_fn(mut f: impl FnMut(Metric) -> MetricValue) -> Self {
        Self {
            values: Metric::ALL.map(&mut f),
        }
    }

    /// Value for `metric`.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> MetricValue {
        self.values[metric.index()]
    }

    /// `(metric, value)` pairs in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, MetricValue)> + '_ {
        Metric::ALL.into_iter().zip(self.values.iter().copied())
    }
}

impl Serialize for MetricVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Metric::COUNT))?;
        for (metric, value) in self.iter() {
            map.serialize_entry(metric.name(), &value)?;
        }
        map.end()
    }
}

/// Computes [`MetricVector`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricEngine;

impl MetricEngine {
    /// Compare `imputed` against the ground truth `original`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the series are empty or differ in
    /// length.
    ///
    /// # Example
    ///
    /// ```rust
    /// use trueno_gapbench::metrics::{Metric, MetricEngine, MetricValue};
    /// use trueno_gapbench::series::Series;
    ///
    /// # fn main() -> trueno_gapbench::Result<()> {
    /// let truth = Series::new(vec![1.0, 2.0, 3.0, 4.0]);
    /// let scores = MetricEngine::score(&truth, &truth)?;
    /// assert_eq!(scores.get(Metric::Rmse), MetricValue::Value(0.0));
    /// # Ok(())
    /// # }
    /// ```
    pub fn score(original: &Series, imputed: &Series) -> Result<MetricVector> {
        Self::score_slices(original.values(), imputed.values())
    }

    /// Slice form of [`MetricEngine::score`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the slices are empty or differ in
    /// length.
    #[allow(clippy::many_single_char_names, clippy::similar_names)]
    pub fn score_slices(x: &[f64], y: &[f64]) -> Result<MetricVector> {
        if x.len() != y.len() {
            return Err(Error::InvalidInput(format!(
                "cannot score series of different lengths ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(Error::InvalidInput("cannot score empty series".to_string()));
        }

        let n = x.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_y = y.iter().sum::<f64>() / n;

        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        let (mut abs_diff, mut signed, mut sse) = (0.0, 0.0, 0.0);
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        for (&xi, &yi) in x.iter().zip(y) {
            let (dx, dy) = (xi - mean_x, yi - mean_y);
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;

            let err = xi - yi;
            abs_diff += err.abs();
            signed += err;
            sse += err * err;

            min_x = min_x.min(xi);
            max_x = max_x.max(xi);
        }

        let r = sxy / (sxx * syy).sqrt();
        let mse = sse / n;
        let rmse = mse.sqrt();
        let nmse = sse / sxx;

        let relative = if x.contains(&0.0) {
            None
        } else {
            let (mut sum, mut sum_abs, mut sum_sq) = (0.0, 0.0, 0.0);
            for (&xi, &yi) in x.iter().zip(y) {
                let rel = (xi - yi) / xi;
                sum += rel;
                sum_abs += rel.abs();
                sum_sq += rel * rel;
            }
            Some((sum, sum_abs / n, (sum_sq / n).sqrt()))
        };

        let sd = (sxx / (n - 1.0)).sqrt();
        let rmss = if sd == 0.0 {
            None
        } else {
            let sum_sq: f64 = x
                .iter()
                .zip(y)
                .map(|(&xi, &yi)| ((yi - xi) / sd).powi(2))
                .sum();
            Some((sum_sq / n).sqrt())
        };

        Ok(MetricVector::from_fn(|metric| {
            let value = match metric {
                Metric::R => Some(r),
                Metric::R2 => Some(r * r),
                Metric::AbsDifferences => Some(abs_diff),
                Metric::Mbe => Some(-signed / n),
                Metric::Me => Some(signed / n),
                Metric::Mae => Some(signed.abs() / n),
                Metric::Mre => relative.map(|(sum, _, _)| sum),
                Metric::Mare => relative.map(|(_, mare, _)| mare),
                Metric::Mape => relative.map(|(_, mare, _)| 100.0 * mare),
                Metric::Sse => Some(sse),
                Metric::Mse => Some(mse),
                Metric::Rms => relative.map(|(_, _, rms)| rms),
                Metric::Nmse => Some(nmse),
                Metric::Re => Some(1.0 - nmse),
                Metric::Rmse => Some(rmse),
                Metric::Nrmse => Some(100.0 * rmse / (max_x - min_x)),
                Metric::Rmss => rmss,
            };
            value.into()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(vector: &MetricVector, metric: Metric) -> f64 {
        vector.get(metric).value().unwrap()
    }

    #[test]
    fn test_metric_names_roundtrip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_name(metric.name()), Some(metric));
        }
        assert_eq!(Metric::from_name("kge"), None);
    }

    #[test]
    fn test_known_values() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 2.0, 3.0, 5.0];
        let v = MetricEngine::score_slices(&x, &y).unwrap();

        assert!((value(&v, Metric::AbsDifferences) - 2.0).abs() < 1e-12);
        assert!((value(&v, Metric::Mbe) - 0.5).abs() < 1e-12);
        assert!((value(&v, Metric::Me) + 0.5).abs() < 1e-12);
        assert!((value(&v, Metric::Mae) - 0.5).abs() < 1e-12);
        assert!((value(&v, Metric::Sse) - 2.0).abs() < 1e-12);
        assert!((value(&v, Metric::Mse) - 0.5).abs() < 1e-12);
        // Σ(x - x̄)² = 5
        assert!((value(&v, Metric::Nmse) - 0.4).abs() < 1e-12);
        assert!((value(&v, Metric::Re) - 0.6).abs() < 1e-12);
        // relative errors: -1, 0, 0, -0.25
        assert!((value(&v, Metric::Mre) + 1.25).abs() < 1e-12);
        assert!((value(&v, Metric::Mare) - 0.3125).abs() < 1e-12);
        assert!((value(&v, Metric::Mape) - 31.25).abs() < 1e-9);
        let rms = (1.0625_f64 / 4.0).sqrt();
        assert!((value(&v, Metric::Rms) - rms).abs() < 1e-12);
        let rmse = 0.5_f64.sqrt();
        assert!((value(&v, Metric::Nrmse) - 100.0 * rmse / 3.0).abs() < 1e-9);
        let sd = (5.0_f64 / 3.0).sqrt();
        let rmss = (2.0 / (sd * sd) / 4.0_f64).sqrt();
        assert!((value(&v, Metric::Rmss) - rmss).abs() < 1e-12);
    }

    #[test]
    fn test_mae_is_absolute_summed_error() {
        // Errors cancel: +1 and -1
        let v = MetricEngine::score_slices(&[1.0, 2.0, 3.0], &[0.0, 3.0, 3.0]).unwrap();
        assert_eq!(v.get(Metric::Mae), MetricValue::Value(0.0));
        assert_eq!(v.get(Metric::AbsDifferences), MetricValue::Value(2.0));
    }

    #[test]
    fn test_constant_truth_only_guards_rmss() {
        let v = MetricEngine::score_slices(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!(v.get(Metric::Rmss).is_undefined());
        assert!(!v.get(Metric::Mare).is_undefined());
        // Unguarded metrics are computed even when degenerate
        assert!(value(&v, Metric::R).is_nan());
        assert!(value(&v, Metric::Nmse).is_infinite());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            MetricEngine::score_slices(&[1.0], &[1.0, 2.0]),
            Err(Error::InvalidInput(_))
        ));
        assert!(MetricEngine::score_slices(&[], &[]).is_err());
    }

    #[test]
    fn test_direction_is_better() {
        assert!(Direction::Maximize.is_better(0.9, 0.8));
        assert!(!Direction::Maximize.is_better(0.8, 0.8));
        assert!(Direction::Minimize.is_better(-3.0, 1.0));
        assert!(Direction::TowardZero.is_better(-0.1, 0.2));
        assert!(!Direction::Minimize.is_better(f64::NAN, 1.0));
    }

    #[test]
    fn test_direction_table_override() {
        let table = DirectionTable::default().with(Metric::Mbe, Direction::Minimize);
        assert_eq!(table.get(Metric::Mbe), Direction::Minimize);
        assert_eq!(table.get(Metric::R), Direction::Maximize);
        assert_eq!(table.get(Metric::Mre), Direction::TowardZero);
    }

    #[test]
    fn test_metric_vector_serializes_as_map() {
        let v = MetricEngine::score_slices(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]).unwrap();
        let json = serde_json::to_value(v).unwrap();
        assert_eq!(json["sse"], serde_json::json!(0.0));
        assert_eq!(json["mare"], serde_json::Value::Null);
        assert_eq!(json.as_object().unwrap().len(), Metric::COUNT);
    }
}
