use std::{f64::consts::TAU, path::PathBuf};

use anyhow::Context as _;
use harprep_pipeline::{
    config::NO_ACTIVITY_LABEL, dataset::DEFAULT_LABEL_VOCABULARY, recording::Sample,
};
use rand::{Rng, SeedableRng as _};
use rand_distr::Normal;
use rand_pcg::Pcg32;

use crate::util::Output;

/// Gravity on the Y axis of a wrist-worn sensor at rest, in g
const GRAVITY_Y: f64 = -1.0;
/// Length of an injected dropout, in sampling periods
const GAP_PERIODS: f64 = 12.0;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateSamplesArg {
    /// Seed of the random generator
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Nominal sampling frequency in Hz
    #[arg(long, default_value_t = 52.0)]
    frequency: f64,
    /// Duration of each activity segment in seconds
    #[arg(long, default_value_t = 20.0)]
    segment_secs: f64,
    /// Number of passes over every activity
    #[arg(long, default_value_t = 2)]
    rounds: usize,
    /// Standard deviation of the sensor noise
    #[arg(long, default_value_t = 0.05)]
    noise: f64,
    /// Relative jitter of each sampling interval, in [0, 1)
    #[arg(long, default_value_t = 0.02)]
    jitter: f64,
    /// Probability that a sample is preceded by a dropout
    #[arg(long, default_value_t = 0.0)]
    gap_probability: f64,
    /// Output CSV file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Periodic motion pattern of one activity.
#[derive(Debug, Clone, Copy)]
struct Motion {
    /// Dominant frequency in Hz
    frequency: f64,
    /// Accelerometer amplitude in g
    acc_gain: f64,
    /// Gyroscope amplitude in rad/s
    gyr_gain: f64,
}

impl Motion {
    fn for_activity(activity: &str) -> Self {
        let (frequency, acc_gain, gyr_gain) = match activity {
            "Walk" => (1.8, 0.35, 0.8),
            "Jogging" => (2.8, 0.9, 1.6),
            "Squat" => (0.5, 0.6, 0.3),
            "Leg land" => (0.8, 1.2, 0.6),
            "Lateral squat slide" => (0.4, 0.5, 1.1),
            _ => (0.0, 0.0, 0.0),
        };
        Self {
            frequency,
            acc_gain,
            gyr_gain,
        }
    }

    fn reading<R>(self, t: f64, rng: &mut R, noise: Normal<f64>) -> [f64; 6]
    where
        R: Rng + ?Sized,
    {
        let phase = TAU * self.frequency * t;
        let clean = [
            self.acc_gain * phase.sin(),
            GRAVITY_Y + self.acc_gain * 0.6 * (2.0 * phase).cos(),
            self.acc_gain * 0.3 * (phase + 0.8).sin(),
            self.gyr_gain * (phase + 0.4).cos(),
            self.gyr_gain * 0.5 * (3.0 * phase).sin(),
            self.gyr_gain * 0.2 * phase.cos(),
        ];
        clean.map(|value| value + rng.sample(noise))
    }
}

pub(crate) fn run(arg: &GenerateSamplesArg) -> anyhow::Result<()> {
    let GenerateSamplesArg {
        seed,
        frequency,
        segment_secs,
        rounds,
        noise,
        jitter,
        gap_probability,
        output,
    } = arg;

    anyhow::ensure!(
        frequency.is_finite() && *frequency > 0.0,
        "frequency must be positive, got {frequency}"
    );
    anyhow::ensure!(
        segment_secs.is_finite() && *segment_secs > 0.0,
        "segment duration must be positive, got {segment_secs}"
    );
    anyhow::ensure!(
        (0.0..1.0).contains(jitter),
        "jitter must be in [0, 1), got {jitter}"
    );
    anyhow::ensure!(
        (0.0..=1.0).contains(gap_probability),
        "gap probability must be in [0, 1], got {gap_probability}"
    );
    let noise = Normal::new(0.0, *noise).context("Invalid noise level")?;

    let mut rng = Pcg32::seed_from_u64(*seed);
    let period = frequency.recip();
    let activities = std::iter::once(NO_ACTIVITY_LABEL).chain(DEFAULT_LABEL_VOCABULARY);

    let mut output = Output::from_output_path(output.clone())?;
    let display_path = output.display_path();
    let mut writer = csv::Writer::from_writer(&mut output);

    let mut time = 0.0;
    let mut count = 0_usize;
    for _ in 0..*rounds {
        for activity in activities.clone() {
            let motion = Motion::for_activity(activity);
            let end = time + segment_secs;
            while time < end {
                let [acc_x, acc_y, acc_z, gyr_x, gyr_y, gyr_z] =
                    motion.reading(time, &mut rng, noise);
                writer
                    .serialize(Sample {
                        time,
                        acc_x,
                        acc_y,
                        acc_z,
                        gyr_x,
                        gyr_y,
                        gyr_z,
                        activity: activity.to_owned(),
                    })
                    .with_context(|| format!("Failed to write sample to {display_path}"))?;
                count += 1;

                time += period * (1.0 + rng.random_range(-*jitter..=*jitter));
                if rng.random_bool(*gap_probability) {
                    time += period * GAP_PERIODS;
                }
            }
        }
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush output to {display_path}"))?;

    tracing::info!(
        path = %display_path,
        samples = count,
        seed,
        "generated synthetic recording"
    );
    Ok(())
}
