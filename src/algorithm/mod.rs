//! Algorithm registry
//!
//! Imputation algorithms are opaque callables keyed by a stable identifier.
//! The harness only ever sees the [`Imputer`] trait; nothing downstream of
//! the registry knows which algorithms exist.
//!
//! ## Failure isolation
//!
//! [`RegisteredAlgorithm::invoke`] turns every way a call can go wrong into an
//! [`AlgorithmFailure`] value: returned errors, panics, hung calls (when a
//! timeout is configured), wrong-length output, and output that still has
//! holes at the gapped positions. A failure only ever affects its own cell.
//!
//! ## Usage
//!
//! ```rust
//! use trueno_gapbench::algorithm::{AlgorithmRegistry, ImputeError};
//! use trueno_gapbench::series::GappedSeries;
//!
//! # fn main() -> trueno_gapbench::Result<()> {
//! let mut registry = AlgorithmRegistry::baseline();
//! registry.register("zero", |gapped: &GappedSeries| -> Result<Vec<f64>, ImputeError> {
//!     Ok(gapped.values().iter().map(|v| v.unwrap_or(0.0)).collect())
//! })?;
//!
//! assert!(registry.get("zero").is_some());
//! assert_eq!(registry.ids().first().map(|id| &**id), Some("locf"));
//! # Ok(())
//! # }
//! ```

pub mod baseline;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::series::{GappedSeries, Series};
use crate::{Error, Result};

pub use baseline::{
    LinearInterpolation, Locf, MeanFill, MedianFill, MovingAverage, Nocb, RandomFill,
    SplineInterpolation, Weighting, BASELINE_RANDOM_SEED,
};

/// Stable algorithm identifier.
pub type AlgorithmId = Arc<str>;

/// Error an imputer reports for a single call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImputeError {
    /// Nothing observed to impute from
    #[error("series has no observed values")]
    NoObservations,

    /// Algorithm-specific failure
    #[error("{0}")]
    Failed(String),
}

/// A univariate imputation algorithm.
///
/// Implementations must be pure: the same input yields the same output, and
/// no state is shared between calls. Any parameters are fixed when the
/// imputer is constructed.
pub trait Imputer: Send + Sync {
    /// Fill every missing position of `series`.
    ///
    /// # Errors
    ///
    /// Returns [`ImputeError`] when the algorithm cannot produce a result.
    fn impute(&self, series: &GappedSeries) -> std::result::Result<Vec<f64>, ImputeError>;
}

impl<F> Imputer for F
where
    F: Fn(&GappedSeries) -> std::result::Result<Vec<f64>, ImputeError> + Send + Sync,
{
    fn impute(&self, series: &GappedSeries) -> std::result::Result<Vec<f64>, ImputeError> {
        self(series)
    }
}

/// Why a single (algorithm, replicate) cell produced no usable series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlgorithmFailure {
    /// The imputer returned an error
    Errored {
        /// Error message
        message: String,
    },
    /// The imputer panicked
    Panicked {
        /// Panic payload, when it was a string
        message: String,
    },
    /// The call exceeded the configured timeout
    TimedOut {
        /// Timeout that was exceeded
        timeout_ms: u64,
    },
    /// Output length differs from the input length
    WrongLength {
        /// Input length
        expected: usize,
        /// Output length
        actual: usize,
    },
    /// Output is NaN or infinite at gapped positions
    Unfilled {
        /// Number of gapped positions left non-finite
        count: usize,
    },
}

impl fmt::Display for AlgorithmFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Errored { message } => write!(f, "imputer error: {message}"),
            Self::Panicked { message } => write!(f, "imputer panicked: {message}"),
            Self::TimedOut { timeout_ms } => write!(f, "imputer timed out after {timeout_ms} ms"),
            Self::WrongLength { expected, actual } => {
                write!(f, "imputer returned {actual} values, expected {expected}")
            }
            Self::Unfilled { count } => {
                write!(f, "imputer left {count} gapped positions non-finite")
            }
        }
    }
}

/// A registry entry.
#[derive(Clone)]
pub struct RegisteredAlgorithm {
    id: AlgorithmId,
    imputer: Arc<dyn Imputer>,
}

impl fmt::Debug for RegisteredAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredAlgorithm")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl RegisteredAlgorithm {
    /// Algorithm identifier.
    #[must_use]
    pub fn id(&self) -> &AlgorithmId {
        &self.id
    }

    /// Run the imputer on one gapped series and validate its output.
    ///
    /// With a `timeout`, the call runs on a dedicated thread; a call that
    /// does not return in time is reported as [`AlgorithmFailure::TimedOut`]
    /// and its thread is left to finish in the background.
    ///
    /// # Errors
    ///
    /// Returns the [`AlgorithmFailure`] describing why the cell is unusable.
    pub fn invoke(
        &self,
        gapped: &GappedSeries,
        timeout: Option<Duration>,
    ) -> std::result::Result<Series, AlgorithmFailure> {
        let output = match timeout {
            None => call_guarded(self.imputer.as_ref(), gapped)?,
            Some(limit) => self.call_with_timeout(gapped, limit)?,
        };
        validate_output(gapped, output)
    }

    fn call_with_timeout(
        &self,
        gapped: &GappedSeries,
        limit: Duration,
    ) -> std::result::Result<Vec<f64>, AlgorithmFailure> {
        let imputer = Arc::clone(&self.imputer);
        let input = gapped.clone();
        let (sender, receiver) = mpsc::channel();

        std::thread::Builder::new()
            .name(format!("impute-{}", self.id))
            .spawn(move || {
                // Receiver is gone once the caller has timed out
                let _ = sender.send(call_guarded(imputer.as_ref(), &input));
            })
            .map_err(|e| AlgorithmFailure::Errored {
                message: format!("failed to spawn imputer thread: {e}"),
            })?;

        match receiver.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(AlgorithmFailure::TimedOut {
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }),
            Err(RecvTimeoutError::Disconnected) => Err(AlgorithmFailure::Panicked {
                message: "imputer thread exited without a result".to_string(),
            }),
        }
    }
}

fn call_guarded(
    imputer: &dyn Imputer,
    gapped: &GappedSeries,
) -> std::result::Result<Vec<f64>, AlgorithmFailure> {
    match panic::catch_unwind(AssertUnwindSafe(|| imputer.impute(gapped))) {
        Ok(Ok(values)) => Ok(values),
        Ok(Err(e)) => Err(AlgorithmFailure::Errored {
            message: e.to_string(),
        }),
        Err(payload) => Err(AlgorithmFailure::Panicked {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn validate_output(
    gapped: &GappedSeries,
    output: Vec<f64>,
) -> std::result::Result<Series, AlgorithmFailure> {
    if output.len() != gapped.len() {
        return Err(AlgorithmFailure::WrongLength {
            expected: gapped.len(),
            actual: output.len(),
        });
    }

    let unfilled = gapped
        .values()
        .iter()
        .zip(&output)
        .filter(|(original, imputed)| original.is_none() && !imputed.is_finite())
        .count();
    if unfilled > 0 {
        return Err(AlgorithmFailure::Unfilled { count: unfilled });
    }

    Ok(Series::new(output))
}

/// Ordered catalog of imputation algorithms.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    entries: Vec<RegisteredAlgorithm>,
}

impl AlgorithmRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in reference imputers, in this order:
    /// `locf`, `nocb`, `linear`, `spline`, `moving-average`, `mean`,
    /// `median`, `random`.
    #[must_use]
    pub fn baseline() -> Self {
        let entries: [(&str, Arc<dyn Imputer>); 8] = [
            ("locf", Arc::new(Locf)),
            ("nocb", Arc::new(Nocb)),
            ("linear", Arc::new(LinearInterpolation)),
            ("spline", Arc::new(SplineInterpolation)),
            ("moving-average", Arc::new(MovingAverage::default())),
            ("mean", Arc::new(MeanFill)),
            ("median", Arc::new(MedianFill)),
            ("random", Arc::new(RandomFill::new(BASELINE_RANDOM_SEED))),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(id, imputer)| RegisteredAlgorithm {
                    id: id.into(),
                    imputer,
                })
                .collect(),
        }
    }

    /// Append an algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the id is empty or already taken.
    pub fn register<I>(&mut self, id: impl Into<AlgorithmId>, imputer: I) -> Result<()>
    where
        I: Imputer + 'static,
    {
        self.register_shared(id, Arc::new(imputer))
    }

    /// Append an algorithm that is already behind an `Arc`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the id is empty or already taken.
    pub fn register_shared(
        &mut self,
        id: impl Into<AlgorithmId>,
        imputer: Arc<dyn Imputer>,
    ) -> Result<()> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::config("algorithm id must not be empty"));
        }
        if self.get(&id).is_some() {
            return Err(Error::config(format!("algorithm already registered: {id}")));
        }
        self.entries.push(RegisteredAlgorithm { id, imputer });
        Ok(())
    }

    /// Number of registered algorithms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an algorithm by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RegisteredAlgorithm> {
        self.entries.iter().find(|entry| &*entry.id == id)
    }

    /// Registry position of an algorithm.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| &*entry.id == id)
    }

    /// Identifiers in registry order.
    #[must_use]
    pub fn ids(&self) -> Vec<AlgorithmId> {
        self.entries.iter().map(|entry| Arc::clone(&entry.id)).collect()
    }

    /// Entries in registry order.
    #[must_use]
    pub fn entries(&self) -> &[RegisteredAlgorithm] {
        &self.entries
    }

    /// Ordered sub-registry holding exactly `ids`, in the order given.
    ///
    /// An empty `ids` selects the whole registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unknown or repeated ids.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Result<Self> {
        if ids.is_empty() {
            return Ok(self.clone());
        }

        let mut selected = Self::new();
        for id in ids {
            let id = id.as_ref();
            let entry = self
                .get(id)
                .ok_or_else(|| Error::config(format!("unknown algorithm id: {id}")))?;
            selected.register_shared(Arc::clone(&entry.id), Arc::clone(&entry.imputer))?;
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gapped() -> GappedSeries {
        GappedSeries::new(vec![Some(1.0), None, None, Some(4.0)])
    }

    #[test]
    fn test_baseline_order() {
        let ids: Vec<String> = AlgorithmRegistry::baseline()
            .ids()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            ids,
            ["locf", "nocb", "linear", "spline", "moving-average", "mean", "median", "random"]
        );
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = AlgorithmRegistry::baseline();
        let result = registry.register("linear", LinearInterpolation);
        assert!(matches!(result, Err(Error::Configuration(_))));
        assert!(registry.register(" ", LinearInterpolation).is_err());
    }

    #[test]
    fn test_select_preserves_requested_order() {
        let registry = AlgorithmRegistry::baseline();
        let selected = registry.select(&["mean", "linear"]).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.position("mean"), Some(0));
        assert_eq!(selected.position("linear"), Some(1));
        assert!(registry.select(&["kalman"]).is_err());
        assert!(registry.select(&["mean", "mean"]).is_err());
    }

    #[test]
    fn test_invoke_reports_errors() {
        let mut registry = AlgorithmRegistry::new();
        registry
            .register("fails", |_: &GappedSeries| -> std::result::Result<Vec<f64>, ImputeError> {
                Err(ImputeError::Failed("boom".to_string()))
            })
            .unwrap();
        let failure = registry.get("fails").unwrap().invoke(&gapped(), None).unwrap_err();
        assert_eq!(
            failure,
            AlgorithmFailure::Errored {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_invoke_catches_panics() {
        let mut registry = AlgorithmRegistry::new();
        registry
            .register("panics", |_: &GappedSeries| -> std::result::Result<Vec<f64>, ImputeError> {
                panic!("exploded")
            })
            .unwrap();
        let failure = registry.get("panics").unwrap().invoke(&gapped(), None).unwrap_err();
        assert!(matches!(failure, AlgorithmFailure::Panicked { ref message } if message == "exploded"));
    }

    #[test]
    fn test_invoke_validates_length_and_holes() {
        let mut registry = AlgorithmRegistry::new();
        registry
            .register("short", |_: &GappedSeries| -> std::result::Result<Vec<f64>, ImputeError> {
                Ok(vec![1.0])
            })
            .unwrap();
        registry
            .register("holes", |g: &GappedSeries| -> std::result::Result<Vec<f64>, ImputeError> {
                Ok(g.values().iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            })
            .unwrap();

        let short = registry.get("short").unwrap().invoke(&gapped(), None);
        assert_eq!(
            short.unwrap_err(),
            AlgorithmFailure::WrongLength {
                expected: 4,
                actual: 1
            }
        );
        let holes = registry.get("holes").unwrap().invoke(&gapped(), None);
        assert_eq!(holes.unwrap_err(), AlgorithmFailure::Unfilled { count: 2 });
    }

    #[test]
    fn test_invoke_timeout() {
        let mut registry = AlgorithmRegistry::new();
        registry
            .register("slow", |g: &GappedSeries| -> std::result::Result<Vec<f64>, ImputeError> {
                std::thread::sleep(Duration::from_millis(500));
                Ok(g.values().iter().map(|v| v.unwrap_or(0.0)).collect())
            })
            .unwrap();
        let slow = registry.get("slow").unwrap();

        let failure = slow
            .invoke(&gapped(), Some(Duration::from_millis(20)))
            .unwrap_err();
        assert_eq!(failure, AlgorithmFailure::TimedOut { timeout_ms: 20 });

        let filled = slow.invoke(&gapped(), Some(Duration::from_secs(5))).unwrap();
        assert_eq!(filled.values(), &[1.0, 0.0, 0.0, 4.0]);
    }
}
