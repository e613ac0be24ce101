//! Numeric kernels for the activity-recognition preprocessing pipeline.
//!
//! This crate provides the pure, allocation-light statistics used by the
//! pipeline stages:
//!
//! - **Descriptive statistics**: mean, population variance and standard deviation,
//!   mean absolute deviation, extrema, sign counts
//! - **Moments**: biased skewness and excess kurtosis
//! - **Percentiles**: linearly interpolated percentiles, median and interquartile range
//! - **Correlation**: Pearson correlation between columns and full correlation matrices
//! - **Rolling**: centered rolling median with shrinking edge windows
//!
//! Every function is deterministic: the same input slice always produces
//! bit-identical output, because values are accumulated in slice order.
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`moments`]: Higher-order standardized moments
//! - [`percentiles`]: Percentile computation and storage
//! - [`correlation`]: Pearson correlation
//! - [`rolling`]: Rolling-window filters
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use harprep_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.median, 3.0);
//! ```
//!
//! ## Computing percentiles
//!
//! ```
//! use harprep_stats::percentiles::Percentiles;
//!
//! let values = [1.0, 2.0, 3.0, 4.0];
//! let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
//! assert_eq!(percentiles.get(50.0), Some(2.5));
//! ```
//!
//! ## Filtering a noisy sequence
//!
//! ```
//! use harprep_stats::rolling::centered_rolling_median;
//!
//! let filtered = centered_rolling_median(&[1.0, 2.0, 100.0, 3.0, 4.0], 3).unwrap();
//! assert_eq!(filtered, vec![1.5, 2.0, 3.0, 4.0, 3.5]);
//! ```

pub mod correlation;
pub mod descriptive;
pub mod moments;
pub mod percentiles;
pub mod rolling;
