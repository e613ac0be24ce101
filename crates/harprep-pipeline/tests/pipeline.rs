use harprep_pipeline::{
    axis::SensorAxis,
    balance::{self, ClassDistribution},
    config::PipelineConfig,
    dataset::{self, LabelEncoder, SplitOptions, Targets},
    error::PipelineError,
    features::{FeatureRow, FeatureTable},
    pipeline::Pipeline,
    recording::{Recording, Sample},
};

const HEADER: &str = "time,accX,accY,accZ,gyrX,gyrY,gyrZ,activity";

/// Signal of one activity at time `t`, distinct enough per class to give
/// stable windows.
fn reading(t: f64, activity: &str) -> [f64; 6] {
    let (freq, gain) = match activity {
        "Walk" => (2.0, 1.0),
        "Squat" => (0.5, 2.0),
        "Jogging" => (4.0, 3.0),
        _ => (0.0, 0.0),
    };
    let phase = t * freq;
    [
        gain * phase.sin(),
        gain * phase.cos() - 9.8,
        0.3 * (phase * 1.7).sin(),
        gain * 0.5 * phase.sin(),
        (phase * 2.3).cos(),
        0.2 * (phase * 0.7).sin(),
    ]
}

/// 16 Hz recording with the given per-class sample counts, as CSV text.
fn recording_csv(classes: &[(&str, u32)]) -> String {
    let mut csv = format!("{HEADER}\n");
    let mut i = 0_u32;
    for &(activity, count) in classes {
        for _ in 0..count {
            let t = f64::from(i) * 0.0625;
            let [ax, ay, az, gx, gy, gz] = reading(t, activity);
            csv.push_str(&format!("{t},{ax},{ay},{az},{gx},{gy},{gz},{activity}\n"));
            i += 1;
        }
    }
    csv
}

fn feature_table(classes: &[(&str, u32)]) -> FeatureTable {
    let mut rows = vec![];
    for &(activity, count) in classes {
        for i in 0..count {
            rows.push(FeatureRow {
                values: vec![f64::from(i), f64::from(i % 7), 1.0],
                activity: activity.to_owned(),
            });
        }
    }
    FeatureTable {
        columns: vec![
            "accX_mean".to_owned(),
            "accY_mean".to_owned(),
            "accZ_mean".to_owned(),
        ],
        rows,
    }
}

#[test]
fn test_balance_then_split_50_80_30() {
    let table = feature_table(&[("Walk", 50), ("Squat", 80), ("Jogging", 30)]);
    let balanced = table.with_rows(balance::undersample(&table.rows, "class balancing").unwrap());

    let distribution = ClassDistribution::from_rows(&balanced.rows);
    assert_eq!(distribution.get("Walk"), Some(30));
    assert_eq!(distribution.get("Squat"), Some(30));
    assert_eq!(distribution.get("Jogging"), Some(30));

    let split = dataset::prepare_dataset(
        &balanced,
        &LabelEncoder::default(),
        SplitOptions::default(),
    )
    .unwrap();
    assert_eq!(split.x_train.len(), 72);
    assert_eq!(split.y_train.len(), 72);
    assert_eq!(split.x_valid.len(), 18);
    assert_eq!(split.y_valid.len(), 18);

    // 24 training and 6 validation rows per class
    let Targets::OneHot(y_train) = &split.y_train else {
        panic!("expected one-hot targets");
    };
    for class in ["Walk", "Squat", "Jogging"] {
        let index = LabelEncoder::default().encode(class).unwrap();
        let count = y_train.iter().filter(|row| row[index] == 1.0).count();
        assert_eq!(count, 24, "{class}");
    }
}

#[test]
fn test_scaling_ignores_validation_rows() {
    let table = feature_table(&[("Walk", 30), ("Squat", 30)]);
    let options = SplitOptions::default();
    let with_valid = dataset::prepare_dataset(&table, &LabelEncoder::default(), options).unwrap();

    // all rows of the table to training: the validation rows now count
    let (train_only, _) = dataset::split_rows(&table.rows, options.training_fraction).unwrap();
    let train_table = table.with_rows(train_only);
    let no_valid = dataset::prepare_dataset(
        &train_table,
        &LabelEncoder::default(),
        SplitOptions {
            training_fraction: 1.0,
            ..options
        },
    )
    .unwrap();

    assert_eq!(with_valid.scaler, no_valid.scaler);
    assert_eq!(with_valid.x_train, no_valid.x_train);
}

#[test]
fn test_full_pipeline_from_csv() {
    let csv = recording_csv(&[
        ("No activity", 64),
        ("Walk", 640),
        ("Squat", 480),
        ("No activity", 32),
        ("Jogging", 320),
    ]);
    let recording = Recording::from_reader(csv.as_bytes()).unwrap();
    let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let prepared = pipeline.run(&recording).unwrap();
    let report = &prepared.report;

    assert_eq!(report.raw_stream.sample_count, 1536);
    assert_eq!(report.irregular_samples, 0);
    assert_eq!(report.excluded_samples, 96);
    assert_eq!(report.window_geometry.window_size, 32);
    assert_eq!(report.window_geometry.step_size, 16);

    for axis in SensorAxis::ACCELEROMETER {
        assert!(report.surviving_axes.contains(&axis));
        assert!(!report.discarded_axes.contains(&axis));
    }
    // gyrX is a scaled copy of accX
    assert!(report.discarded_axes.contains(&SensorAxis::GyrX));
    assert_eq!(report.feature_count, 12 * report.surviving_axes.len());
    assert_eq!(prepared.features.columns.len(), report.feature_count);
    assert_eq!(prepared.features.columns[0], "accX_mean");

    let per_class = report.balanced_distribution.classes[0].count;
    assert!(
        report
            .balanced_distribution
            .classes
            .iter()
            .all(|share| share.count == per_class)
    );
    assert_eq!(report.balanced_distribution.classes.len(), 3);
    assert_eq!(report.train_rows + report.valid_rows, 3 * per_class);
    assert_eq!(prepared.split.x_train.len(), prepared.split.y_train.len());
    assert_eq!(prepared.split.x_valid.len(), prepared.split.y_valid.len());
}

#[test]
fn test_pipeline_is_deterministic() {
    let csv = recording_csv(&[("Walk", 320), ("Squat", 320)]);
    let recording = Recording::from_reader(csv.as_bytes()).unwrap();

    let first = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(&recording)
        .unwrap();
    let second = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(&recording)
        .unwrap();
    assert_eq!(first.features, second.features);
    assert_eq!(first.split, second.split);
}

#[test]
fn test_irregular_gap_is_dropped() {
    let mut samples = vec![];
    for i in 0..400_u32 {
        let mut t = f64::from(i) * 0.0625;
        if i >= 200 {
            t += 1.0;
        }
        let activity = if i < 200 { "Walk" } else { "Squat" };
        let [acc_x, acc_y, acc_z, gyr_x, gyr_y, gyr_z] = reading(t, activity);
        samples.push(Sample {
            time: t,
            acc_x,
            acc_y,
            acc_z,
            gyr_x,
            gyr_y,
            gyr_z,
            activity: activity.to_owned(),
        });
    }
    let recording = Recording::new(samples);
    let prepared = Pipeline::default().run(&recording).unwrap();
    assert_eq!(prepared.report.irregular_samples, 1);
    assert_eq!(prepared.report.regular_stream.sample_count, 399);
}

#[test]
fn test_unknown_activity_aborts() {
    let csv = recording_csv(&[("Walk", 320), ("Swimming", 320)]);
    let recording = Recording::from_reader(csv.as_bytes()).unwrap();
    let err = Pipeline::default().run(&recording).unwrap_err();
    assert!(matches!(err, PipelineError::UnknownLabel { label } if label == "Swimming"));
}

#[test]
fn test_malformed_input() {
    let csv = format!("{HEADER}\n0.0,1,2,3,4,5,six,Walk\n");
    let err = Recording::from_reader(csv.as_bytes()).unwrap_err();
    let err = PipelineError::from(err);
    assert!(matches!(err, PipelineError::MalformedInput(_)));
    assert!(err.to_string().contains("gyrZ"), "{err}");
}
