use num_traits::ToPrimitive;

/// Accumulate the mean and population variance of a stream of observations
/// in a single pass (Welford's algorithm).
///
/// # Example
/// ```rust
/// use stats::MeanVariance;
/// let mv: MeanVariance = [0.2, 0.0, 0.0, 0.5, 0.1].into_iter().collect();
/// assert_eq!(mv.count(), 5);
/// assert!((mv.mean() - 0.16).abs() < 1e-12);
/// assert!((mv.population_variance() - 0.0344).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanVariance {
    count: usize,
    mean: f64,
    // sum of squared deviations from the running mean
    m2: f64,
}

impl MeanVariance {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new observation.
    pub fn record<T: ToPrimitive>(&mut self, value: T) {
        let x = value.to_f64().unwrap_or(f64::NAN);
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Number of observations recorded.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of the observations, 0 when nothing was recorded.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance (divisor n) of the observations, 0 when nothing was recorded.
    pub fn population_variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        // rounding can leave a tiny negative residue for constant input
        (self.m2 / self.count as f64).max(0.0)
    }
}

impl<T: ToPrimitive> FromIterator<T> for MeanVariance {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut acc = MeanVariance::new();
        for x in iter {
            acc.record(x);
        }
        acc
    }
}

/// Compute the mean of some numbers, returning zero on empty input.
pub fn mean<T: ToPrimitive>(items: impl IntoIterator<Item = T>) -> f64 {
    items.into_iter().collect::<MeanVariance>().mean()
}

/// Compute the population variance of some numbers, returning zero on empty input.
pub fn population_variance<T: ToPrimitive>(items: impl IntoIterator<Item = T>) -> f64 {
    items
        .into_iter()
        .collect::<MeanVariance>()
        .population_variance()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::{prop_assert, proptest};

    #[test]
    fn test_empty() {
        let empty: [f64; 0] = [];
        assert_eq!(mean(empty), 0.0);
        assert_eq!(population_variance(empty), 0.0);
    }

    #[test]
    fn test_integers() {
        assert_eq!(mean([1u32, 2, 3, 4]), 2.5);
        assert_eq!(population_variance([1u32, 2, 3, 4]), 1.25);
    }

    #[test]
    fn test_constant_has_zero_variance() {
        assert_eq!(population_variance([0.99; 100]), 0.0);
    }

    proptest! {
        #[test]
        fn prop_test_matches_two_pass(xs in vec(0f64..1f64, 1..200)) {
            let n = xs.len() as f64;
            let m = xs.iter().sum::<f64>() / n;
            let v = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
            let mv: MeanVariance = xs.iter().copied().collect();
            prop_assert!((mv.mean() - m).abs() < 1e-9);
            prop_assert!((mv.population_variance() - v).abs() < 1e-9);
            prop_assert!(mv.population_variance() >= 0.0);
        }
    }
}
