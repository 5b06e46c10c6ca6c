//! Gap generator integration tests
//!
//! Covers endpoint protection, block multiples, seeding and the
//! fail-before-draw guarantee.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use trueno_gapbench::gaps::{GapGenerator, GapPlan};
use trueno_gapbench::series::Series;
use trueno_gapbench::Error;

/// Wraps a real generator and counts every draw taken from it.
struct CountingRng {
    inner: ChaCha8Rng,
    draws: usize,
}

impl CountingRng {
    fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        self.draws += 1;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws += 1;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws += 1;
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws += 1;
        self.inner.try_fill_bytes(dest)
    }
}

fn ramp(n: usize) -> Series {
    (0..n).map(|i| i as f64).collect()
}

#[test]
fn test_endpoints_never_missing() {
    let series = ramp(120);
    for (proportion, width) in [(0.05, 1), (0.1, 3), (0.25, 7), (0.4, 2), (0.5, 1)] {
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let gapped = GapGenerator::generate(&series, proportion, width, &mut rng).unwrap();
            assert!(!gapped.is_missing(0), "p={proportion} w={width} seed={seed}");
            assert!(!gapped.is_missing(119), "p={proportion} w={width} seed={seed}");
        }
    }
}

#[test]
fn test_missing_count_is_block_multiple() {
    let series = ramp(97);
    for (proportion, width) in [(0.1, 4), (0.13, 5), (0.2, 3), (0.3, 6)] {
        let plan = GapPlan::new(series.len(), proportion, width).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let gapped = GapGenerator::generate(&series, proportion, width, &mut rng).unwrap();
        let missing = gapped.missing_count();
        assert_eq!(missing, plan.effective_count());
        assert!(missing % width == 0 || missing == series.len() - 2);
    }
}

#[test]
fn test_same_seed_same_pattern() {
    let series = ramp(200);
    let draw = |seed| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        GapGenerator::generate(&series, 0.2, 5, &mut rng)
            .unwrap()
            .missing_positions()
    };
    assert_eq!(draw(123), draw(123));
    assert_ne!(draw(123), draw(124));
}

#[test]
fn test_zero_proportion_is_identity() {
    let series = ramp(50);
    for width in [1, 2, 10, 24] {
        let mut rng = ChaCha8Rng::seed_from_u64(width as u64);
        let gapped = GapGenerator::generate(&series, 0.0, width, &mut rng).unwrap();
        assert_eq!(gapped.missing_count(), 0);
        let restored: Vec<f64> = gapped.values().iter().map(|v| v.unwrap()).collect();
        assert_eq!(restored, series.values());
    }
}

#[test]
fn test_oversized_request_fails_before_any_draw() {
    let series = ramp(20);
    let mut rng = CountingRng::new(1);

    // 0.5 * 40 = 20 >= 18
    let result = GapGenerator::generate(&series, 0.5, 40, &mut rng);
    assert!(matches!(result, Err(Error::Configuration(_))));

    // exactly n - 2: 0.9 * 20 = 18
    let result = GapGenerator::generate(&series, 0.9, 20, &mut rng);
    assert!(matches!(result, Err(Error::Configuration(_))));

    assert_eq!(rng.draws, 0);
}

#[test]
fn test_valid_request_does_draw() {
    let series = ramp(20);
    let mut rng = CountingRng::new(1);
    GapGenerator::generate(&series, 0.2, 2, &mut rng).unwrap();
    assert!(rng.draws > 0);
}

#[test]
fn test_rounding_warning_reported_by_plan() {
    let plan = GapPlan::new(100, 0.15, 10).unwrap();
    let warning = plan.warning().unwrap();
    assert_eq!(warning.effective, 10);
    assert!(warning.to_string().contains("gap width 10"));
}
