//! Mean and standard deviation over the finite entries of a sample

/// First two moments of the finite values in a sample
///
/// Non-finite values (NaN and infinities) are excluded from both the count
/// and the moments. The standard deviation is the population value
/// (divides by the count, not count - 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteMoments {
    /// Number of finite values seen
    pub count: usize,
    /// Mean of the finite values
    pub mean: f64,
    /// Population standard deviation of the finite values
    pub std_dev: f64,
}

impl FiniteMoments {
    /// Compute moments over the finite values of `values`
    ///
    /// Returns `None` when no finite value is present.
    pub fn of<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a f64>,
        I::IntoIter: Clone,
    {
        let iter = values.into_iter().filter(|v| v.is_finite());

        let (count, sum) = iter
            .clone()
            .fold((0_usize, 0.0_f64), |(n, s), &v| (n + 1, s + v));
        if count == 0 {
            return None;
        }

        let mean = sum / count as f64;
        // Second pass keeps the variance accurate for large offsets
        let sum_squares: f64 = iter.map(|&v| (v - mean).powi(2)).sum();

        Some(Self {
            count,
            mean,
            std_dev: (sum_squares / count as f64).sqrt(),
        })
    }

    /// Map a value onto zero mean and unit standard deviation
    pub fn standardize(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }
}
