//! Sensor channels of a wearable recording

use serde::{Deserialize, Serialize};

/// One measurement axis of the accelerometer or gyroscope.
///
/// The declaration order is the canonical channel order used everywhere a set
/// of axes is iterated (filtering, correlation, windowing, feature columns).
/// Keeping a single canonical order makes discard sets and column layouts
/// reproducible.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SensorAxis {
    #[serde(rename = "accX")]
    AccX,
    #[serde(rename = "accY")]
    AccY,
    #[serde(rename = "accZ")]
    AccZ,
    #[serde(rename = "gyrX")]
    GyrX,
    #[serde(rename = "gyrY")]
    GyrY,
    #[serde(rename = "gyrZ")]
    GyrZ,
}

impl SensorAxis {
    /// All axes in canonical order.
    pub const ALL: [SensorAxis; 6] = [
        SensorAxis::AccX,
        SensorAxis::AccY,
        SensorAxis::AccZ,
        SensorAxis::GyrX,
        SensorAxis::GyrY,
        SensorAxis::GyrZ,
    ];

    /// Accelerometer axes, the default set of axes that are never pruned.
    pub const ACCELEROMETER: [SensorAxis; 3] =
        [SensorAxis::AccX, SensorAxis::AccY, SensorAxis::AccZ];

    /// Column name of the raw channel in a recording (e.g. `accX`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SensorAxis::AccX => "accX",
            SensorAxis::AccY => "accY",
            SensorAxis::AccZ => "accZ",
            SensorAxis::GyrX => "gyrX",
            SensorAxis::GyrY => "gyrY",
            SensorAxis::GyrZ => "gyrZ",
        }
    }
}

impl std::fmt::Display for SensorAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sorts and deduplicates a list of axes into canonical order.
#[must_use]
pub fn canonical(axes: &[SensorAxis]) -> Vec<SensorAxis> {
    let mut axes = axes.to_vec();
    axes.sort_unstable();
    axes.dedup();
    axes
}
