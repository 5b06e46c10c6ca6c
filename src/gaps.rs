//! Gap injection
//!
//! Produces reproducible missingness patterns: contiguous blocks of
//! `gap_width` interior positions are removed until the requested share of
//! the series is missing.
//!
//! ## Missing-count rounding
//!
//! The raw request is `proportion * n`. When that is not a whole multiple of
//! the gap width it is rounded to one:
//!
//! ```text
//! q = (proportion * n) / gap_width
//! effective = floor(q) * gap_width   if fract(q) <= 0.5
//!           = ceil(q)  * gap_width   otherwise
//! ```
//!
//! Rounding is reported as a [`GapWarning`], never as an error.
//!
//! ## Placement
//!
//! Free interior positions are tracked as a shrinking list of runs. Each draw
//! picks a start uniformly among every position where a whole block still
//! fits, then splits the run around the block. Blocks therefore never
//! overlap. If no block fits before the target is reached, every interior
//! position is marked missing.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::series::{GappedSeries, Series};
use crate::{Error, Result};

/// Requests closer than this to a whole number of blocks are treated as exact.
const BLOCK_COUNT_EPSILON: f64 = 1e-9;

/// Diagnostic emitted when the requested missing count had to be rounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapWarning {
    /// `proportion * n` before rounding
    pub requested: f64,
    /// Missing count actually targeted
    pub effective: usize,
    /// Block width the count was rounded to
    pub gap_width: usize,
}

impl fmt::Display for GapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requested {} missing values is not a multiple of gap width {}; using {}",
            self.requested, self.gap_width, self.effective
        )
    }
}

/// A validated gap request for a series of known length.
///
/// Building a plan performs every parameter check without touching a random
/// source, so a whole experiment can be validated up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapPlan {
    series_len: usize,
    proportion: f64,
    gap_width: usize,
    requested: f64,
    effective: usize,
}

impl GapPlan {
    /// Validate a request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if:
    /// - `series_len <= 2`
    /// - `proportion` is not within `[0, (n - 2) / n]`
    /// - `gap_width` is zero
    /// - `proportion * gap_width >= n - 2`
    pub fn new(series_len: usize, proportion: f64, gap_width: usize) -> Result<Self> {
        if series_len <= 2 {
            return Err(Error::config(format!(
                "series length must be greater than 2, got {series_len}"
            )));
        }

        let n = series_len as f64;
        let interior = (series_len - 2) as f64;
        if !proportion.is_finite() || proportion < 0.0 || proportion > interior / n {
            return Err(Error::config(format!(
                "proportion missing {proportion} must lie within [0, {}] for a series of length {series_len}",
                interior / n
            )));
        }

        if gap_width == 0 {
            return Err(Error::config("gap width must be a positive integer"));
        }

        if proportion * gap_width as f64 >= interior {
            return Err(Error::config(format!(
                "proportion missing {proportion} times gap width {gap_width} must be less than {interior}"
            )));
        }

        let requested = proportion * n;
        let effective = round_to_block_multiple(requested, gap_width);

        Ok(Self {
            series_len,
            proportion,
            gap_width,
            requested,
            effective,
        })
    }

    /// Series length the plan was validated for.
    #[must_use]
    pub const fn series_len(&self) -> usize {
        self.series_len
    }

    /// Requested proportion missing.
    #[must_use]
    pub const fn proportion(&self) -> f64 {
        self.proportion
    }

    /// Block width.
    #[must_use]
    pub const fn gap_width(&self) -> usize {
        self.gap_width
    }

    /// `proportion * n` before rounding.
    #[must_use]
    pub const fn requested_count(&self) -> f64 {
        self.requested
    }

    /// Missing count after rounding to a multiple of the gap width.
    #[must_use]
    pub const fn effective_count(&self) -> usize {
        self.effective
    }

    /// Rounding diagnostic, if the request was not a whole number of blocks.
    #[must_use]
    pub fn warning(&self) -> Option<GapWarning> {
        let blocks = self.requested / self.gap_width as f64;
        ((blocks - blocks.round()).abs() >= BLOCK_COUNT_EPSILON).then_some(GapWarning {
            requested: self.requested,
            effective: self.effective,
            gap_width: self.gap_width,
        })
    }

    /// Draw sorted missing positions.
    ///
    /// A zero effective count returns immediately without consuming `rng`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        if self.effective == 0 {
            return Vec::new();
        }

        let mut pool = FreeRuns::interior(self.series_len);
        let mut missing = Vec::with_capacity(self.effective);

        while missing.len() < self.effective {
            match pool.take_block(self.gap_width, rng) {
                Some(start) => missing.extend(start..start + self.gap_width),
                None => {
                    tracing::debug!(
                        target = self.effective,
                        placed = missing.len(),
                        "gap pool exhausted, marking every interior position missing"
                    );
                    return (1..self.series_len - 1).collect();
                }
            }
        }

        missing.sort_unstable();
        missing
    }
}

fn round_to_block_multiple(requested: f64, gap_width: usize) -> usize {
    let blocks = requested / gap_width as f64;
    let nearest = blocks.round();
    let whole_blocks = if (blocks - nearest).abs() < BLOCK_COUNT_EPSILON {
        nearest
    } else if blocks.fract() <= 0.5 {
        blocks.floor()
    } else {
        blocks.ceil()
    };
    // Validated inputs keep this non-negative and bounded by the series length
    whole_blocks as usize * gap_width
}

/// Free interior positions as disjoint `(start, len)` runs.
#[derive(Debug)]
struct FreeRuns {
    runs: Vec<(usize, usize)>,
}

impl FreeRuns {
    fn interior(series_len: usize) -> Self {
        Self {
            runs: vec![(1, series_len - 2)],
        }
    }

    /// Remove a uniformly chosen block of `width` free positions, returning
    /// its start, or `None` when no run is wide enough.
    fn take_block<R: Rng + ?Sized>(&mut self, width: usize, rng: &mut R) -> Option<usize> {
        let starts_in = |len: usize| if len >= width { len - width + 1 } else { 0 };
        let eligible: usize = self.runs.iter().map(|&(_, len)| starts_in(len)).sum();
        if eligible == 0 {
            return None;
        }

        let mut pick = rng.gen_range(0..eligible);
        for idx in 0..self.runs.len() {
            let (run_start, run_len) = self.runs[idx];
            let candidates = starts_in(run_len);
            if pick >= candidates {
                pick -= candidates;
                continue;
            }

            let start = run_start + pick;
            let left = (run_start, pick);
            let right = (start + width, run_len - pick - width);
            let remainder = [left, right].into_iter().filter(|&(_, len)| len > 0);
            self.runs.splice(idx..=idx, remainder);
            return Some(start);
        }

        None
    }
}

/// Gap generator entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapGenerator;

impl GapGenerator {
    /// Return a gapped copy of `series`.
    ///
    /// Rounding of the requested count is logged at warn level; use
    /// [`GapPlan`] directly to collect the diagnostic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for any parameter violation listed on
    /// [`GapPlan::new`]. No random draw happens in that case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use trueno_gapbench::gaps::GapGenerator;
    /// use trueno_gapbench::series::Series;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let series: Series = (0..100).map(f64::from).collect();
    /// let mut rng = ChaCha8Rng::seed_from_u64(7);
    /// let gapped = GapGenerator::generate(&series, 0.2, 5, &mut rng)?;
    ///
    /// assert_eq!(gapped.missing_count(), 20);
    /// assert!(!gapped.is_missing(0) && !gapped.is_missing(99));
    /// # Ok(())
    /// # }
    /// ```
    pub fn generate<R: Rng + ?Sized>(
        series: &Series,
        proportion: f64,
        gap_width: usize,
        rng: &mut R,
    ) -> Result<GappedSeries> {
        let plan = GapPlan::new(series.len(), proportion, gap_width)?;
        if let Some(warning) = plan.warning() {
            tracing::warn!(%warning, "rounded missing count");
        }
        Ok(GappedSeries::from_missing(series, &plan.draw(rng)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn linear(n: usize) -> Series {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_rounding_half_goes_down() {
        // 0.15 * 50 = 7.5 blocks of width 1
        let plan = GapPlan::new(50, 0.15, 1).unwrap();
        assert_eq!(plan.effective_count(), 7);
        assert!(plan.warning().is_some());
    }

    #[test]
    fn test_rounding_to_gap_width_multiples() {
        // 15 / 10 = 1.5 -> down
        assert_eq!(GapPlan::new(100, 0.15, 10).unwrap().effective_count(), 10);
        // 16 / 10 = 1.6 -> up
        assert_eq!(GapPlan::new(100, 0.16, 10).unwrap().effective_count(), 20);
        // 14 / 10 = 1.4 -> down
        assert_eq!(GapPlan::new(100, 0.14, 10).unwrap().effective_count(), 10);
    }

    #[test]
    fn test_exact_request_has_no_warning() {
        let plan = GapPlan::new(100, 0.07, 1).unwrap();
        assert_eq!(plan.effective_count(), 7);
        assert!(plan.warning().is_none());
    }

    #[test]
    fn test_invalid_requests() {
        assert!(GapPlan::new(2, 0.0, 1).is_err());
        assert!(GapPlan::new(10, -0.1, 1).is_err());
        assert!(GapPlan::new(10, 0.81, 1).is_err());
        assert!(GapPlan::new(10, f64::NAN, 1).is_err());
        assert!(GapPlan::new(10, 0.1, 0).is_err());
        // 0.5 * 16 = 8 >= 10 - 2
        assert!(matches!(
            GapPlan::new(10, 0.5, 16),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_proportion_is_identity() {
        let series = linear(30);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for width in [1, 3, 9] {
            let gapped = GapGenerator::generate(&series, 0.0, width, &mut rng).unwrap();
            assert_eq!(gapped.missing_count(), 0);
        }
    }

    #[test]
    fn test_blocks_are_whole_and_disjoint() {
        let series = linear(200);
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let gapped = GapGenerator::generate(&series, 0.3, 6, &mut rng).unwrap();
        let missing = gapped.missing_positions();
        assert_eq!(missing.len(), 60);

        // Every maximal run of missing positions is a whole number of blocks
        let mut run = 1;
        for pair in missing.windows(2) {
            if pair[1] == pair[0] + 1 {
                run += 1;
            } else {
                assert_eq!(run % 6, 0);
                run = 1;
            }
        }
        assert_eq!(run % 6, 0);
    }

    #[test]
    fn test_exhaustion_marks_all_interior() {
        // target 8 over width 3 rounds up to 9 > 8 interior positions
        let series = linear(10);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let gapped = GapGenerator::generate(&series, 0.8, 3, &mut rng).unwrap();
        assert_eq!(gapped.missing_positions(), (1..9).collect::<Vec<_>>());
        assert_eq!(gapped.get(0), Some(0.0));
        assert_eq!(gapped.get(9), Some(9.0));
    }

    #[test]
    fn test_free_runs_split() {
        let mut pool = FreeRuns::interior(12);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let start = pool.take_block(4, &mut rng).unwrap();
        let free: usize = pool.runs.iter().map(|&(_, len)| len).sum();
        assert_eq!(free, 6);
        assert!(pool
            .runs
            .iter()
            .all(|&(s, len)| s + len <= start || s >= start + 4));
    }
}
