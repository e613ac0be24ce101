//! Pipeline configuration
//!
//! Every parameter has a default matching the reference pipeline, and
//! configuration files only need to name the values they change:
//!
//! ```json
//! { "window_duration_secs": 3.0, "undefined_statistic": "fail" }
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    axis::SensorAxis,
    dataset::{DEFAULT_LABEL_VOCABULARY, DEFAULT_TRAINING_FRACTION, LabelEncoder, SplitOptions},
    error::PipelineError,
    features::UndefinedStatisticPolicy,
    filter::DEFAULT_FILTER_WINDOW,
    selection::DEFAULT_CORRELATION_THRESHOLD,
    timing::DEFAULT_IRREGULARITY_FACTOR,
    window::DEFAULT_WINDOW_DURATION_SECS,
};

/// Activity label of readings taken between exercises.
pub const NO_ACTIVITY_LABEL: &str = "No activity";

/// Parameters of every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Samples arriving more than this many average periods after their
    /// predecessor are dropped
    pub irregularity_factor: f64,
    /// Median filter window, in samples
    pub filter_window: usize,
    /// Axes to filter (and to consider for selection)
    pub filter_axes: Vec<SensorAxis>,
    /// Activities removed after filtering
    pub excluded_labels: Vec<String>,
    /// Undersample the sample stream before correlation analysis
    pub balance_samples: bool,
    /// Axes never discarded by correlation pruning
    pub important_axes: Vec<SensorAxis>,
    pub correlation_threshold: f64,
    pub window_duration_secs: f64,
    /// Drop trailing windows shorter than the full window size
    pub drop_partial_windows: bool,
    pub undefined_statistic: UndefinedStatisticPolicy,
    pub training_fraction: f64,
    pub one_hot: bool,
    pub standardize: bool,
    /// Known activities, indexed by encoded label
    pub label_vocabulary: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            irregularity_factor: DEFAULT_IRREGULARITY_FACTOR,
            filter_window: DEFAULT_FILTER_WINDOW,
            filter_axes: SensorAxis::ALL.to_vec(),
            excluded_labels: vec![NO_ACTIVITY_LABEL.to_owned()],
            balance_samples: false,
            important_axes: SensorAxis::ACCELEROMETER.to_vec(),
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
            window_duration_secs: DEFAULT_WINDOW_DURATION_SECS,
            drop_partial_windows: false,
            undefined_statistic: UndefinedStatisticPolicy::default(),
            training_fraction: DEFAULT_TRAINING_FRACTION,
            one_hot: true,
            standardize: true,
            label_vocabulary: DEFAULT_LABEL_VOCABULARY.map(str::to_owned).to_vec(),
        }
    }
}

impl PipelineConfig {
    /// Check every parameter before any stage runs.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] naming the first bad value.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;

        if !positive(self.irregularity_factor) {
            return Err(PipelineError::invalid_parameter(
                "irregularity_factor",
                format!("must be a positive number, got {}", self.irregularity_factor),
            ));
        }
        if self.filter_window == 0 {
            return Err(PipelineError::invalid_parameter(
                "filter_window",
                "must be at least 1 sample",
            ));
        }
        if self.filter_axes.is_empty() {
            return Err(PipelineError::invalid_parameter(
                "filter_axes",
                "at least one axis is required",
            ));
        }
        if !(0.0..=1.0).contains(&self.correlation_threshold) {
            return Err(PipelineError::invalid_parameter(
                "correlation_threshold",
                format!("must be within [0, 1], got {}", self.correlation_threshold),
            ));
        }
        if !positive(self.window_duration_secs) {
            return Err(PipelineError::invalid_parameter(
                "window_duration_secs",
                format!(
                    "must be a positive number of seconds, got {}",
                    self.window_duration_secs
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.training_fraction) {
            return Err(PipelineError::invalid_parameter(
                "training_fraction",
                format!("must be within [0, 1], got {}", self.training_fraction),
            ));
        }
        if self.label_vocabulary.is_empty() {
            return Err(PipelineError::invalid_parameter(
                "label_vocabulary",
                "at least one label is required",
            ));
        }
        if let Some(label) = self
            .label_vocabulary
            .iter()
            .enumerate()
            .find(|(i, label)| self.label_vocabulary[..*i].contains(*label))
            .map(|(_, label)| label)
        {
            return Err(PipelineError::invalid_parameter(
                "label_vocabulary",
                format!("duplicate label '{label}'"),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn label_encoder(&self) -> LabelEncoder {
        LabelEncoder::new(self.label_vocabulary.clone())
    }

    #[must_use]
    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            training_fraction: self.training_fraction,
            one_hot: self.one_hot,
            standardize: self.standardize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.filter_window, 10);
        assert_eq!(config.window_duration_secs, 2.0);
        assert_eq!(config.label_encoder().encode("Walk").unwrap(), 2);
    }

    #[test]
    fn test_partial_json() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "window_duration_secs": 3.0, "undefined_statistic": "fail" }"#)
                .unwrap();
        assert_eq!(config.window_duration_secs, 3.0);
        assert_eq!(config.undefined_statistic, UndefinedStatisticPolicy::Fail);
        assert_eq!(config.training_fraction, 0.8);
        assert_eq!(config.important_axes, SensorAxis::ACCELEROMETER.to_vec());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_json::from_str::<PipelineConfig>(r#"{ "window": 3 }"#).is_err());
    }

    #[test]
    fn test_invalid_values() {
        let cases: [(&str, fn(&mut PipelineConfig)); 6] = [
            ("irregularity_factor", |c| c.irregularity_factor = 0.0),
            ("filter_window", |c| c.filter_window = 0),
            ("correlation_threshold", |c| c.correlation_threshold = -0.1),
            ("window_duration_secs", |c| c.window_duration_secs = f64::NAN),
            ("training_fraction", |c| c.training_fraction = 1.5),
            ("label_vocabulary", |c| {
                c.label_vocabulary.push("Walk".to_owned());
            }),
        ];
        for (expected, mutate) in cases {
            let mut config = PipelineConfig::default();
            mutate(&mut config);
            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, PipelineError::InvalidParameter { name, .. } if name == expected),
                "{expected}: {err}"
            );
        }
    }
}
