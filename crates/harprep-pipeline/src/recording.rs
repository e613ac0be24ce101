//! Raw sensor recordings
//!
//! A [`Recording`] is the source of truth for a pipeline run: a time-ordered
//! table of [`Sample`]s read once and never mutated afterwards. Every stage
//! reads from it (or from a later stage's table) and produces a new table.
//!
//! # File Format
//!
//! Recordings are delimited text files with a header row:
//!
//! ```text
//! time,accX,accY,accZ,gyrX,gyrY,gyrZ,activity
//! 0.00,0.12,-0.98,0.05,0.01,-0.02,0.00,Walk
//! 0.02,0.15,-0.95,0.04,0.02,-0.01,0.01,Walk
//! ```
//!
//! Columns are located by name, so their order is free and extra columns are
//! ignored. A missing column, a non-numeric `time`/axis cell, or an empty
//! activity cell fails the whole load before any stage runs.

use std::{
    fs::File,
    hash::{DefaultHasher, Hash as _, Hasher as _},
    io::{self, BufReader},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{axis::SensorAxis, error::MalformedInputError};

/// Name of the timestamp column.
pub const TIME_COLUMN: &str = "time";
/// Name of the activity label column.
pub const ACTIVITY_COLUMN: &str = "activity";

/// A single reading of the wearable sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Timestamp in seconds (monotonic non-decreasing in a well-formed stream)
    pub time: f64,
    /// Accelerometer, X axis
    #[serde(rename = "accX")]
    pub acc_x: f64,
    /// Accelerometer, Y axis
    #[serde(rename = "accY")]
    pub acc_y: f64,
    /// Accelerometer, Z axis
    #[serde(rename = "accZ")]
    pub acc_z: f64,
    /// Gyroscope, X axis
    #[serde(rename = "gyrX")]
    pub gyr_x: f64,
    /// Gyroscope, Y axis
    #[serde(rename = "gyrY")]
    pub gyr_y: f64,
    /// Gyroscope, Z axis
    #[serde(rename = "gyrZ")]
    pub gyr_z: f64,
    /// Activity label annotated for this reading
    pub activity: String,
}

impl Sample {
    /// Value of one sensor axis.
    #[must_use]
    pub fn axis(&self, axis: SensorAxis) -> f64 {
        match axis {
            SensorAxis::AccX => self.acc_x,
            SensorAxis::AccY => self.acc_y,
            SensorAxis::AccZ => self.acc_z,
            SensorAxis::GyrX => self.gyr_x,
            SensorAxis::GyrY => self.gyr_y,
            SensorAxis::GyrZ => self.gyr_z,
        }
    }

    fn hash_into(&self, hasher: &mut DefaultHasher) {
        self.time.to_bits().hash(hasher);
        for axis in SensorAxis::ALL {
            self.axis(axis).to_bits().hash(hasher);
        }
        self.activity.hash(hasher);
    }
}

/// Immutable, time-ordered table of samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    samples: Vec<Sample>,
}

impl Recording {
    #[must_use]
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Read a recording from a CSV file
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInputError`] if the file cannot be opened, the header
    /// lacks a required column, or a cell cannot be parsed.
    pub fn open<P>(path: P) -> Result<Self, MalformedInputError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| MalformedInputError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a recording from any CSV source
    pub fn from_reader<R>(reader: R) -> Result<Self, MalformedInputError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let layout = ColumnLayout::from_headers(reader.headers()?)?;

        let mut samples = vec![];
        for record in reader.records() {
            let record = record?;
            samples.push(layout.parse(&record)?);
        }
        Ok(Self { samples })
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamps of all samples, in stream order.
    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    /// Values of one axis, in stream order.
    #[must_use]
    pub fn axis_values(&self, axis: SensorAxis) -> Vec<f64> {
        self.samples.iter().map(|s| s.axis(axis)).collect()
    }

    /// Content fingerprint identifying this recording.
    ///
    /// Two recordings with identical samples (bit-for-bit) share a fingerprint.
    /// Used as the input identity of cached stage results.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.samples.len().hash(&mut hasher);
        for sample in &self.samples {
            sample.hash_into(&mut hasher);
        }
        hasher.finish()
    }
}

impl FromIterator<Sample> for Recording {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Column indices of the required fields within a CSV header
#[derive(Debug)]
struct ColumnLayout {
    time: usize,
    axes: [usize; 6],
    activity: usize,
}

impl ColumnLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, MalformedInputError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| MalformedInputError::MissingColumn {
                    column: column.to_owned(),
                })
        };
        let time = find(TIME_COLUMN)?;
        let mut axes = [0; 6];
        for (slot, axis) in axes.iter_mut().zip(SensorAxis::ALL) {
            *slot = find(axis.name())?;
        }
        let activity = find(ACTIVITY_COLUMN)?;
        Ok(Self {
            time,
            axes,
            activity,
        })
    }

    fn parse(&self, record: &csv::StringRecord) -> Result<Sample, MalformedInputError> {
        let line = record.position().map_or(0, csv::Position::line);
        let number = |index: usize, column: &str| -> Result<f64, MalformedInputError> {
            let cell = record.get(index).unwrap_or_default();
            cell.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| MalformedInputError::NonNumericValue {
                    line,
                    column: column.to_owned(),
                    value: cell.to_owned(),
                })
        };

        let time = number(self.time, TIME_COLUMN)?;
        let mut values = [0.0; 6];
        for ((value, index), axis) in values.iter_mut().zip(self.axes).zip(SensorAxis::ALL) {
            *value = number(index, axis.name())?;
        }
        let activity = record.get(self.activity).unwrap_or_default();
        if activity.is_empty() {
            return Err(MalformedInputError::EmptyLabel { line });
        }

        let [acc_x, acc_y, acc_z, gyr_x, gyr_y, gyr_z] = values;
        Ok(Sample {
            time,
            acc_x,
            acc_y,
            acc_z,
            gyr_x,
            gyr_y,
            gyr_z,
            activity: activity.to_owned(),
        })
    }
}
