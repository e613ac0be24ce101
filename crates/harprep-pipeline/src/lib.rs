//! Preprocessing pipeline for wearable-sensor activity recognition.
//!
//! This crate turns a time-ordered stream of accelerometer and gyroscope
//! readings into a labeled, balanced feature matrix split into training and
//! validation partitions.
//!
//! # Stages
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Timing analysis | [`timing`] | recording without irregular samples |
//! | Signal filtering | [`filter`] | [`filter::FilteredStream`] |
//! | Feature selection | [`selection`] | surviving axes |
//! | Window segmentation | [`window`] | [`window::WindowTable`] |
//! | Feature extraction | [`features`] | [`features::FeatureTable`] |
//! | Class balancing | [`balance`] | balanced feature table |
//! | Dataset split | [`dataset`] | [`dataset::DatasetSplit`] |
//!
//! Each stage is a pure function from one table to a new one; no stage
//! mutates its input. [`pipeline::Pipeline`] composes them in order and
//! memoizes the expensive ones in a [`cache::StageCache`].
//!
//! # Example
//!
//! ```
//! use harprep_pipeline::{config::PipelineConfig, pipeline::Pipeline, recording::Recording};
//!
//! let mut csv = String::from("time,accX,accY,accZ,gyrX,gyrY,gyrZ,activity\n");
//! for i in 0..160_u32 {
//!     let t = f64::from(i) * 0.125;
//!     let activity = if i < 80 { "Walk" } else { "Squat" };
//!     let (s, c) = (t * 3.0).sin_cos();
//!     csv.push_str(&format!("{t},{s},{c},{},{},{},{},{activity}\n", s * c, -s, t.cos(), c * 0.5));
//! }
//! let recording = Recording::from_reader(csv.as_bytes())?;
//!
//! let mut pipeline = Pipeline::new(PipelineConfig::default())?;
//! let prepared = pipeline.run(&recording)?;
//! assert_eq!(prepared.split.x_train.len(), prepared.split.y_train.len());
//! assert_eq!(prepared.report.window_geometry.window_size, 16);
//! # Ok::<(), harprep_pipeline::error::PipelineError>(())
//! ```

pub mod axis;
pub mod balance;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod filter;
pub mod pipeline;
pub mod recording;
pub mod selection;
pub mod timing;
pub mod window;
