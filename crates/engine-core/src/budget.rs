//! Page sizing from available memory and an average record size sample.

/// Fraction of the measured headroom a single page may occupy.
pub const SAFETY_FACTOR: f64 = 0.70;

/// Upper bound applied by [`BudgetEstimator::default`].
pub const DEFAULT_MAX_PAGE_SIZE: usize = 50_000;

/// `floor(available * SAFETY_FACTOR / avg)`, never below 1.
///
/// A zero size sample is treated as one byte.
pub fn estimate(available_memory_bytes: u64, avg_record_size_bytes: u64) -> usize {
    BudgetEstimator::unbounded().estimate(available_memory_bytes, avg_record_size_bytes)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetEstimator {
    safety_factor: f64,
    min_page_size: usize,
    max_page_size: Option<usize>,
}

impl BudgetEstimator {
    /// Estimator with the given safety factor, a floor of one record and no
    /// ceiling. Factors outside `(0, 1]` are clamped into that range.
    pub fn new(safety_factor: f64) -> Self {
        let safety_factor = if safety_factor.is_finite() && safety_factor > 0.0 {
            safety_factor.min(1.0)
        } else {
            SAFETY_FACTOR
        };
        BudgetEstimator {
            safety_factor,
            min_page_size: 1,
            max_page_size: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(SAFETY_FACTOR)
    }

    pub fn with_min_page_size(mut self, min: usize) -> Self {
        self.min_page_size = min.max(1);
        self
    }

    pub fn with_max_page_size(mut self, max: Option<usize>) -> Self {
        self.max_page_size = max;
        self
    }

    pub fn safety_factor(&self) -> f64 {
        self.safety_factor
    }

    pub fn estimate(&self, available_memory_bytes: u64, avg_record_size_bytes: u64) -> usize {
        let avg = avg_record_size_bytes.max(1) as f64;
        // float -> int casts saturate
        let raw = (available_memory_bytes as f64 * self.safety_factor / avg).floor() as usize;

        let size = raw.max(self.min_page_size);
        match self.max_page_size {
            Some(max) => size.min(max.max(self.min_page_size)),
            None => size,
        }
    }
}

impl Default for BudgetEstimator {
    fn default() -> Self {
        Self::unbounded().with_max_page_size(Some(DEFAULT_MAX_PAGE_SIZE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_safety_factor() {
        // 1 MiB of headroom, 1 KiB records
        assert_eq!(estimate(1_048_576, 1024), 716);
        assert_eq!(estimate(1000, 7), 100);
    }

    #[test]
    fn never_returns_zero() {
        assert_eq!(estimate(0, 1024), 1);
        assert_eq!(estimate(10, u64::MAX), 1);
        for avail in [0u64, 1, 3, 999, 1 << 40] {
            for avg in [1u64, 2, 512, 1 << 20, u64::MAX] {
                assert!(estimate(avail, avg) >= 1, "avail={avail} avg={avg}");
            }
        }
    }

    #[test]
    fn zero_sample_counts_as_one_byte() {
        assert_eq!(estimate(100, 0), estimate(100, 1));
        assert_eq!(estimate(100, 0), 70);
    }

    #[test]
    fn huge_headroom_saturates() {
        assert!(estimate(u64::MAX, 1) > 0);
    }

    #[test]
    fn default_estimator_is_bounded() {
        let estimator = BudgetEstimator::default();
        assert_eq!(estimator.estimate(u64::MAX, 1), DEFAULT_MAX_PAGE_SIZE);
        assert_eq!(estimator.estimate(1000, 10), 70);
    }

    #[test]
    fn min_wins_over_max() {
        let estimator = BudgetEstimator::new(0.5)
            .with_min_page_size(100)
            .with_max_page_size(Some(10));
        assert_eq!(estimator.estimate(0, 1), 100);
        assert_eq!(estimator.estimate(1 << 30, 1), 100);
    }

    #[test]
    fn out_of_range_factor_is_clamped() {
        assert_eq!(BudgetEstimator::new(3.0).safety_factor(), 1.0);
        assert_eq!(BudgetEstimator::new(-1.0).safety_factor(), SAFETY_FACTOR);
        assert_eq!(BudgetEstimator::new(f64::NAN).safety_factor(), SAFETY_FACTOR);
    }
}
