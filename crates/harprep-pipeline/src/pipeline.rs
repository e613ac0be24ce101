//! End-to-end pipeline driver
//!
//! [`Pipeline::run`] composes the stages strictly in sequence:
//!
//! 1. Timing analysis and irregular-sample removal
//! 2. Median filtering
//! 3. Label exclusion, then optional sample-level balancing
//! 4. Correlation pruning of redundant axes
//! 5. Window segmentation over the surviving axes
//! 6. Feature extraction
//! 7. Window-level class balancing
//! 8. Label encoding, train/validation split and scaling
//!
//! Steps 1 to 5 are also available on their own through
//! [`Pipeline::analyze`], which `run` builds on.
//!
//! Stages 1, 2, 4, 5 and 6 are memoized in the pipeline's [`StageCache`], so a
//! second run over the same recording only recomputes the stages whose
//! parameters changed. The wall-clock time of every stage is recorded in
//! [`StageTiming`]s.

use std::{collections::BTreeSet, sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    axis::{self, SensorAxis},
    balance::{self, ClassDistribution},
    cache::{CacheKey, CacheStats, StageCache},
    config::PipelineConfig,
    dataset::{self, DatasetSplit, StandardScaler},
    error::{DegenerateReason, PipelineError},
    features::{self, FeatureTable},
    filter::{self, FilteredStream},
    recording::Recording,
    selection::{self, CorrelationMatrix, FeatureSelection},
    timing::{self, RegularizedRecording, StreamSummary},
    window::{self, WindowGeometry, WindowTable},
};

/// Wall-clock time spent in one stage, cache lookups included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: &'static str,
    pub elapsed_secs: f64,
}

fn timed<T, F>(timings: &mut Vec<StageTiming>, stage: &'static str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed();
    tracing::trace!(stage, ?elapsed, "stage finished");
    timings.push(StageTiming {
        stage,
        elapsed_secs: elapsed.as_secs_f64(),
    });
    value
}

/// Summary of one pipeline run, for inspection and archiving.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub generated_at: DateTime<Utc>,
    pub config: PipelineConfig,
    /// Timing of the recording as loaded
    pub raw_stream: StreamSummary,
    /// Timing after irregular samples were dropped
    pub regular_stream: StreamSummary,
    pub irregular_samples: usize,
    /// Longest accepted sampling interval, in seconds
    pub max_interval: f64,
    pub excluded_samples: usize,
    /// Classes of the filtered sample stream entering correlation analysis
    pub sample_distribution: ClassDistribution,
    pub correlation: CorrelationMatrix,
    pub discarded_axes: BTreeSet<SensorAxis>,
    pub surviving_axes: Vec<SensorAxis>,
    pub window_geometry: WindowGeometry,
    /// Classes of the windows before balancing
    pub window_distribution: ClassDistribution,
    /// Classes of the windows after balancing
    pub balanced_distribution: ClassDistribution,
    pub feature_count: usize,
    pub train_rows: usize,
    pub valid_rows: usize,
    pub scaler: Option<StandardScaler>,
    pub cache: CacheStats,
    /// Stages in execution order
    pub stage_timings: Vec<StageTiming>,
}

/// Stream-level results of a run, from the loaded recording to its windows.
#[derive(Debug, Clone)]
pub struct StreamAnalysis {
    pub raw_stream: StreamSummary,
    pub regularized: Arc<RegularizedRecording>,
    pub regular_stream: StreamSummary,
    pub excluded_samples: usize,
    /// Filtered samples left after label exclusion and sample balancing
    pub stream: FilteredStream,
    pub sample_distribution: ClassDistribution,
    pub selection: Arc<FeatureSelection>,
    pub windows: Arc<WindowTable>,
    pub stage_timings: Vec<StageTiming>,
    window_key: CacheKey,
}

/// Output of a pipeline run.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    /// Balanced feature table the split was made from
    pub features: FeatureTable,
    pub split: DatasetSplit,
    pub report: PipelineReport,
}

/// Preprocessing pipeline with a fixed configuration and its stage cache.
#[derive(Debug, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    cache: StageCache,
}

/// Drop excluded labels, then balance the remaining samples if configured.
fn exclude_labels(
    filtered: &FilteredStream,
    config: &PipelineConfig,
) -> Result<(FilteredStream, usize), PipelineError> {
    let mut stream =
        filtered.retain_rows(|row| !config.excluded_labels.contains(&row.sample.activity));
    let excluded_samples = filtered.len() - stream.len();
    if stream.is_empty() {
        return Err(PipelineError::degenerate(DegenerateReason::EmptyTable {
            stage: "label exclusion",
        }));
    }
    if config.balance_samples {
        stream = stream.with_rows(balance::undersample(stream.rows(), "sample balancing")?);
    }
    Ok((stream, excluded_samples))
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] for an invalid configuration.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            cache: StageCache::default(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Replace the configuration, keeping cached stages whose inputs are
    /// unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] for an invalid configuration;
    /// the previous configuration is kept in that case.
    pub fn reconfigure(&mut self, config: PipelineConfig) -> Result<(), PipelineError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Run the stream stages over `recording`: timing analysis, filtering,
    /// label exclusion, feature selection and window segmentation.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage.
    pub fn analyze(&mut self, recording: &Recording) -> Result<StreamAnalysis, PipelineError> {
        let config = &self.config;
        let cache = &mut self.cache;
        let mut stage_timings = vec![];

        let raw_stream = StreamSummary::from_recording(recording)?;
        tracing::info!(
            samples = raw_stream.sample_count,
            measurement_time = raw_stream.measurement_time,
            average_frequency = raw_stream.average_frequency,
            "loaded recording"
        );

        let recording_key = CacheKey::for_recording(recording);
        let regular_key = recording_key
            .stage("irregularity")
            .float(config.irregularity_factor)
            .finish();
        let regularized = timed(&mut stage_timings, "irregularity", || {
            cache
                .regularized
                .get_or_try_insert_with(regular_key, &mut cache.stats, || {
                    timing::drop_irregular_samples(recording, config.irregularity_factor)
                })
        })?;
        let regular_stream = StreamSummary::from_recording(&regularized.recording)?;

        let filter_axes = axis::canonical(&config.filter_axes);
        let filter_key = regular_key
            .stage("median_filter")
            .param(&config.filter_window)
            .param(&filter_axes)
            .finish();
        let filtered = timed(&mut stage_timings, "median_filter", || {
            cache
                .filtered
                .get_or_try_insert_with(filter_key, &mut cache.stats, || {
                    filter::median_filter(
                        &regularized.recording,
                        &filter_axes,
                        config.filter_window,
                    )
                })
        })?;

        let (stream, excluded_samples) = timed(&mut stage_timings, "label_exclusion", || {
            exclude_labels(&filtered, config)
        })?;
        let sample_distribution = ClassDistribution::from_rows(stream.rows());
        tracing::debug!(
            excluded = excluded_samples,
            classes = ?sample_distribution.classes,
            "prepared sample stream"
        );

        let selection_key = filter_key
            .stage("selection")
            .param(&config.excluded_labels)
            .param(&config.balance_samples)
            .param(&axis::canonical(&config.important_axes))
            .float(config.correlation_threshold)
            .finish();
        let selection = timed(&mut stage_timings, "selection", || {
            cache
                .selection
                .get_or_try_insert_with(selection_key, &mut cache.stats, || {
                    selection::select_features(
                        &stream,
                        &config.important_axes,
                        config.correlation_threshold,
                    )
                })
        })?;

        let window_key = selection_key
            .stage("windows")
            .float(config.window_duration_secs)
            .param(&config.drop_partial_windows)
            .finish();
        let windows = timed(&mut stage_timings, "windows", || {
            cache
                .windows
                .get_or_try_insert_with(window_key, &mut cache.stats, || {
                    window::segment(
                        &stream.select_axes(&selection.surviving),
                        config.window_duration_secs,
                        config.drop_partial_windows,
                    )
                })
        })?;

        Ok(StreamAnalysis {
            raw_stream,
            regularized,
            regular_stream,
            excluded_samples,
            stream,
            sample_distribution,
            selection,
            windows,
            stage_timings,
            window_key,
        })
    }

    /// Run every stage over `recording`.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage; no partial output is
    /// produced.
    pub fn run(&mut self, recording: &Recording) -> Result<PreparedDataset, PipelineError> {
        let StreamAnalysis {
            raw_stream,
            regularized,
            regular_stream,
            excluded_samples,
            stream: _,
            sample_distribution,
            selection,
            windows,
            mut stage_timings,
            window_key,
        } = self.analyze(recording)?;
        let config = &self.config;
        let cache = &mut self.cache;

        let feature_key = window_key
            .stage("features")
            .param(&config.undefined_statistic)
            .finish();
        let features = timed(&mut stage_timings, "features", || {
            cache
                .features
                .get_or_try_insert_with(feature_key, &mut cache.stats, || {
                    features::extract_features(&windows, config.undefined_statistic)
                })
        })?;

        let window_distribution = ClassDistribution::from_rows(&features.rows);
        let balanced = timed(&mut stage_timings, "class_balancing", || {
            balance::undersample(&features.rows, "class balancing")
                .map(|rows| features.with_rows(rows))
        })?;
        let balanced_distribution = ClassDistribution::from_rows(&balanced.rows);
        tracing::info!(
            windows = features.len(),
            balanced = balanced.len(),
            classes = balanced_distribution.classes.len(),
            "balanced windows"
        );

        let split = timed(&mut stage_timings, "split", || {
            dataset::prepare_dataset(&balanced, &config.label_encoder(), config.split_options())
        })?;

        tracing::debug!(
            hits = cache.stats.hits,
            misses = cache.stats.misses,
            "stage cache"
        );

        let report = PipelineReport {
            generated_at: Utc::now(),
            config: config.clone(),
            raw_stream,
            regular_stream,
            irregular_samples: regularized.dropped_samples,
            max_interval: regularized.max_interval,
            excluded_samples,
            sample_distribution,
            correlation: selection.correlation.clone(),
            discarded_axes: selection.discarded.clone(),
            surviving_axes: selection.surviving.clone(),
            window_geometry: windows.geometry,
            window_distribution,
            balanced_distribution,
            feature_count: balanced.columns.len(),
            train_rows: split.x_train.len(),
            valid_rows: split.x_valid.len(),
            scaler: split.scaler.clone(),
            cache: cache.stats,
            stage_timings,
        };

        Ok(PreparedDataset {
            features: balanced,
            split,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::Sample;

    /// 8 Hz recording with distinct signals per class.
    fn recording(classes: &[(&str, u32)]) -> Recording {
        let mut samples = vec![];
        let mut i = 0_u32;
        for &(activity, count) in classes {
            for _ in 0..count {
                let t = f64::from(i) * 0.125;
                samples.push(Sample {
                    time: t,
                    acc_x: (t * 3.0).sin(),
                    acc_y: (t * 5.0).cos(),
                    acc_z: (t * 7.0).sin() * 0.5,
                    gyr_x: (t * 3.0).sin() * 2.0,
                    gyr_y: (t * 11.0).cos(),
                    gyr_z: (t * 13.0).sin(),
                    activity: activity.to_owned(),
                });
                i += 1;
            }
        }
        Recording::new(samples)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            filter_window: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Pipeline::new(config),
            Err(PipelineError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_excluded_labels_do_not_reach_windows() {
        let recording = recording(&[("No activity", 40), ("Walk", 80), ("Squat", 80)]);
        let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let prepared = pipeline.run(&recording).unwrap();
        assert_eq!(prepared.report.excluded_samples, 40);
        assert!(
            prepared
                .features
                .rows
                .iter()
                .all(|row| row.activity != "No activity")
        );
        assert!(prepared.report.sample_distribution.get("No activity").is_none());
    }

    #[test]
    fn test_cache_reuses_upstream_stages() {
        let recording = recording(&[("Walk", 80), ("Squat", 80)]);
        let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let first = pipeline.run(&recording).unwrap();
        assert_eq!(pipeline.cache_stats(), CacheStats { hits: 0, misses: 5 });

        // only the split changes: every cached stage hits
        pipeline
            .reconfigure(PipelineConfig {
                training_fraction: 0.5,
                ..PipelineConfig::default()
            })
            .unwrap();
        let second = pipeline.run(&recording).unwrap();
        assert_eq!(pipeline.cache_stats(), CacheStats { hits: 5, misses: 5 });
        assert_eq!(first.features, second.features);

        // a new window duration recomputes windows and features only
        pipeline
            .reconfigure(PipelineConfig {
                window_duration_secs: 1.0,
                ..PipelineConfig::default()
            })
            .unwrap();
        pipeline.run(&recording).unwrap();
        assert_eq!(pipeline.cache_stats(), CacheStats { hits: 8, misses: 7 });
    }

    #[test]
    fn test_sample_balancing() {
        let recording = recording(&[("Walk", 80), ("Squat", 160)]);
        let config = PipelineConfig {
            balance_samples: true,
            ..PipelineConfig::default()
        };
        let prepared = Pipeline::new(config).unwrap().run(&recording).unwrap();
        let distribution = &prepared.report.sample_distribution;
        assert_eq!(distribution.get("Walk"), Some(80));
        assert_eq!(distribution.get("Squat"), Some(80));
    }

    #[test]
    fn test_analysis_shares_stages_with_run() {
        let recording = recording(&[("No activity", 40), ("Walk", 80), ("Squat", 80)]);
        let mut pipeline = Pipeline::default();
        let analysis = pipeline.analyze(&recording).unwrap();
        assert_eq!(pipeline.cache_stats(), CacheStats { hits: 0, misses: 4 });
        assert_eq!(analysis.excluded_samples, 40);
        assert_eq!(analysis.stream.len(), 160);

        let prepared = pipeline.run(&recording).unwrap();
        assert_eq!(pipeline.cache_stats(), CacheStats { hits: 4, misses: 5 });
        assert_eq!(prepared.report.surviving_axes, analysis.selection.surviving);
        assert_eq!(prepared.report.window_geometry, analysis.windows.geometry);
        assert_eq!(
            prepared.report.window_distribution,
            ClassDistribution::from_rows(&analysis.windows.windows)
        );
    }

    #[test]
    fn test_stage_timings_in_order() {
        let recording = recording(&[("Walk", 80), ("Squat", 80)]);
        let prepared = Pipeline::default().run(&recording).unwrap();
        let timings = &prepared.report.stage_timings;
        assert_eq!(
            timings.iter().map(|t| t.stage).collect::<Vec<_>>(),
            [
                "irregularity",
                "median_filter",
                "label_exclusion",
                "selection",
                "windows",
                "features",
                "class_balancing",
                "split"
            ]
        );
        assert!(timings.iter().all(|t| t.elapsed_secs >= 0.0));
    }

    #[test]
    fn test_everything_excluded() {
        let recording = recording(&[("No activity", 20)]);
        let mut pipeline = Pipeline::default();
        let err = pipeline.analyze(&recording).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DegenerateStream {
                reason: DegenerateReason::EmptyTable {
                    stage: "label exclusion"
                }
            }
        ));
        let err = pipeline.run(&recording).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DegenerateStream {
                reason: DegenerateReason::EmptyTable {
                    stage: "label exclusion"
                }
            }
        ));
    }
}
