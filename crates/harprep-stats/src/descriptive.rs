use crate::percentiles;

/// Descriptive statistics summarizing a dataset.
///
/// This structure contains common measures of central tendency, dispersion,
/// and spread for a dataset of `f64` values. Variance and standard deviation
/// use the population convention (divisor `n`).
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    /// The number of values in the dataset.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The median value of the dataset.
    pub median: f64,
    /// The population variance of the dataset.
    pub variance: f64,
    /// The population standard deviation of the dataset.
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// This method will sort the values internally before computing statistics.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use harprep_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.variance, 2.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted values.
    ///
    /// This is an optimized version that skips the sorting step.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let mean = mean(sorted_values)?;
        let variance = variance(sorted_values)?;

        Some(Self {
            count: sorted_values.len(),
            min,
            max,
            mean,
            median: percentiles::median_sorted(sorted_values),
            variance,
            std_dev: variance.sqrt(),
        })
    }

    /// Difference between the largest and smallest value.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Arithmetic mean, or `None` for an empty slice.
///
/// ```
/// # use harprep_stats::descriptive::mean;
/// assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
/// assert_eq!(mean(&[]), None);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divisor `n`), or `None` for an empty slice.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn variance(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    Some(sum_sq / values.len() as f64)
}

/// Population standard deviation, or `None` for an empty slice.
#[must_use]
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Mean absolute deviation from the mean, or `None` for an empty slice.
///
/// ```
/// # use harprep_stats::descriptive::mean_absolute_deviation;
/// assert_eq!(mean_absolute_deviation(&[1.0, 3.0]), Some(1.0));
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_absolute_deviation(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let sum_abs = values.iter().map(|v| (v - mean).abs()).sum::<f64>();
    Some(sum_abs / values.len() as f64)
}

/// Number of strictly negative values.
#[must_use]
pub fn count_negative(values: &[f64]) -> usize {
    values.iter().filter(|v| **v < 0.0).count()
}

/// Number of strictly positive values.
#[must_use]
pub fn count_positive(values: &[f64]) -> usize {
    values.iter().filter(|v| **v > 0.0).count()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(DescriptiveStats::new(Vec::<f64>::new()).is_none());
        assert_eq!(variance(&[]), None);
        assert_eq!(mean_absolute_deviation(&[]), None);
    }

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::new([4.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min, 4.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.median, 4.0);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.range(), 0.0);
    }

    #[test]
    fn test_population_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(std_dev(&values).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_even_length_median() {
        let stats = DescriptiveStats::new([4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.median, 2.5);
    }

    #[test]
    fn test_sign_counts_ignore_zero() {
        let values = [-1.0, 0.0, 0.0, 2.0, 3.0, -0.5];
        assert_eq!(count_negative(&values), 2);
        assert_eq!(count_positive(&values), 2);
    }

    #[test]
    fn test_mean_absolute_deviation() {
        let values = [1.0, 2.0, 3.0, 4.0, 10.0];
        // mean = 4, |dev| = 3, 2, 1, 0, 6
        assert_abs_diff_eq!(
            mean_absolute_deviation(&values).unwrap(),
            2.4,
            epsilon = 1e-12
        );
    }

    #[test]
    #[should_panic(expected = "values must be sorted")]
    fn test_from_sorted_rejects_unsorted() {
        let _ = DescriptiveStats::from_sorted(&[3.0, 1.0]);
    }
}
