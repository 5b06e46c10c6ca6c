//! Series data model
//!
//! A [`Series`] is immutable ground truth shared across every grid cell, so
//! it is backed by an `Arc<[f64]>` and cheap to clone. A [`GappedSeries`] is
//! the same series with interior positions replaced by `None`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Immutable, ordered sequence of observations.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct Series {
    values: Arc<[f64]>,
}

impl Series {
    /// Create a series from owned values.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the observations.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Copy of the first `len` observations.
    #[must_use]
    pub fn truncated(&self, len: usize) -> Self {
        Self::new(self.values[..len.min(self.len())].to_vec())
    }
}

impl fmt::Debug for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Series").field("len", &self.len()).finish()
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<Series> for Vec<f64> {
    fn from(series: Series) -> Self {
        series.values.to_vec()
    }
}

impl FromIterator<f64> for Series {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A series with some interior positions marked missing.
///
/// Positions `0` and `len - 1` are always observed when produced by
/// [`crate::gaps::GapGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GappedSeries {
    values: Vec<Option<f64>>,
}

impl GappedSeries {
    /// Wrap raw values; `None` marks a missing position.
    #[must_use]
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    /// Gapped copy of `series` with the given positions removed.
    ///
    /// Out-of-range positions are ignored.
    #[must_use]
    pub fn from_missing(series: &Series, missing: &[usize]) -> Self {
        let mut values: Vec<Option<f64>> = series.values().iter().copied().map(Some).collect();
        for &position in missing {
            if let Some(slot) = values.get_mut(position) {
                *slot = None;
            }
        }
        Self { values }
    }

    /// Number of positions (observed and missing).
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no positions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the raw values.
    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value at `position`, `None` when missing or out of range.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<f64> {
        self.values.get(position).copied().flatten()
    }

    /// Whether `position` is missing.
    #[must_use]
    pub fn is_missing(&self, position: usize) -> bool {
        matches!(self.values.get(position), Some(None))
    }

    /// Sorted missing positions.
    #[must_use]
    pub fn missing_positions(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.is_none().then_some(i))
            .collect()
    }

    /// Number of missing positions.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Observed `(position, value)` pairs in order.
    pub fn observed(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|value| (i, value)))
    }
}

/// Stable dataset identifier.
pub type DatasetId = Arc<str>;

/// A named ground-truth series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    name: DatasetId,
    series: Series,
}

impl Dataset {
    /// Create a dataset.
    #[must_use]
    pub fn new(name: impl Into<DatasetId>, series: impl Into<Series>) -> Self {
        Self {
            name: name.into(),
            series: series.into(),
        }
    }

    /// Dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the dataset name.
    #[must_use]
    pub fn id(&self) -> DatasetId {
        Arc::clone(&self.name)
    }

    /// Ground-truth series.
    #[must_use]
    pub const fn series(&self) -> &Series {
        &self.series
    }

    /// Truncate every dataset to the shortest length among them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `datasets` is empty or dataset
    /// names are not unique.
    pub fn truncate_to_common_length(datasets: Vec<Self>) -> Result<Vec<Self>> {
        let common = datasets
            .iter()
            .map(|d| d.series.len())
            .min()
            .ok_or_else(|| Error::InvalidInput("no datasets supplied".to_string()))?;

        for (i, dataset) in datasets.iter().enumerate() {
            if datasets[..i].iter().any(|other| other.name == dataset.name) {
                return Err(Error::InvalidInput(format!(
                    "duplicate dataset name: {}",
                    dataset.name
                )));
            }
        }

        Ok(datasets
            .into_iter()
            .map(|d| Self {
                series: d.series.truncated(common),
                name: d.name,
            })
            .collect())
    }
}
