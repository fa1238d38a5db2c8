//! Integration test: individual stages composed through the public API

use envmon::data::{FEATURE_COLUMNS, HOUR, IS_DAY, SENSOR_COLUMNS, UNSAFE};
use envmon::prelude::*;
use polars::prelude::*;
use std::io::Write;

fn sensor_csv_with_gaps() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "timestamp,temperature,humidity,light_level,air_quality").unwrap();
    writeln!(file, "2024-03-01 05:00:00,,48.0,1.0,220.0").unwrap();
    writeln!(file, "2024-03-01 06:00:00,19.5,,3.0,230.0").unwrap();
    writeln!(file, "2024-03-01 07:00:00,20.5,50.0,120.0,").unwrap();
    writeln!(file, "2024-03-01 08:00:00,40.0,51.0,300.0,300.0").unwrap();
    writeln!(file, "2024-03-01 09:00:00,20.0,52.0,420.0,300.0").unwrap();
    writeln!(file, "2024-03-01 10:00:00,21.0,,500.0,640.0").unwrap();
    writeln!(file, "2024-03-01 20:00:00,18.0,60.0,0.0,250.0").unwrap();
    file
}

#[test]
fn test_impute_then_derive_then_label() {
    let file = sensor_csv_with_gaps();
    let df = SensorLoader::new().load(file.path()).unwrap();

    let df = ForwardFillImputer::new().apply(&df, &SENSOR_COLUMNS).unwrap();

    // The leading temperature null has no predecessor and stays missing;
    // every other gap is filled from the previous reading.
    assert_eq!(df.column("temperature").unwrap().null_count(), 1);
    assert_eq!(df.column("humidity").unwrap().null_count(), 0);
    assert_eq!(df.column("air_quality").unwrap().null_count(), 0);
    let hum = df.column("humidity").unwrap().f64().unwrap();
    assert_eq!(hum.get(1), Some(48.0));
    assert_eq!(hum.get(5), Some(52.0));
    let air = df.column("air_quality").unwrap().f64().unwrap();
    assert_eq!(air.get(2), Some(230.0));

    let df = derive_time_features(&df).unwrap();
    let hour = df.column(HOUR).unwrap().i32().unwrap();
    let is_day = df.column(IS_DAY).unwrap().i32().unwrap();
    assert_eq!(hour.get(0), Some(5));
    assert_eq!(is_day.get(0), Some(0));
    assert_eq!(hour.get(4), Some(9));
    assert_eq!(is_day.get(4), Some(1));
    assert_eq!(hour.get(6), Some(20));
    assert_eq!(is_day.get(6), Some(0));

    let df = label_unsafe(&df, 35.0, 600.0).unwrap();
    let labels = df.column(UNSAFE).unwrap().i32().unwrap();
    // Row 3: temperature 40 → unsafe. Row 5: air 640 → unsafe. Row 4: neither.
    assert_eq!(labels.get(3), Some(1));
    assert_eq!(labels.get(5), Some(1));
    assert_eq!(labels.get(4), Some(0));
    // Row 0: temperature still missing, air 220 → safe.
    assert_eq!(labels.get(0), Some(0));
}

fn training_frame(rows: usize) -> DataFrame {
    let phase = |i: usize| std::f64::consts::TAU * (i % 24) as f64 / 24.0;
    let temperature: Vec<f64> = (0..rows)
        .map(|i| if i % 9 == 0 { 39.0 } else { 21.0 + 5.0 * phase(i).sin() })
        .collect();
    let humidity: Vec<f64> = (0..rows).map(|i| 50.0 + 8.0 * phase(i).cos()).collect();
    let light: Vec<f64> = (0..rows)
        .map(|i| if (7..18).contains(&(i % 24)) { 450.0 } else { 3.0 })
        .collect();
    let air: Vec<f64> = (0..rows)
        .map(|i| if i % 14 == 0 { 700.0 } else { 280.0 + 90.0 * phase(i).cos() })
        .collect();
    let hour: Vec<i32> = (0..rows).map(|i| (i % 24) as i32).collect();
    let is_day: Vec<i32> = hour.iter().map(|&h| i32::from(h > 6 && h < 18)).collect();
    let unsafe_label: Vec<i32> = temperature
        .iter()
        .zip(air.iter())
        .map(|(&t, &a)| i32::from(t > 35.0 || a > 600.0))
        .collect();

    df!(
        "temperature" => &temperature,
        "humidity" => &humidity,
        "light_level" => &light,
        "air_quality" => &air,
        "hour" => &hour,
        "is_day" => &is_day,
        "unsafe" => &unsafe_label
    )
    .unwrap()
}

#[test]
fn test_scaling_centers_every_feature() {
    let df = training_frame(200);

    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&df, &FEATURE_COLUMNS).unwrap();

    for col_name in FEATURE_COLUMNS {
        let col = scaled.column(col_name).unwrap().f64().unwrap();
        let mean = col.mean().unwrap();
        let std = col.std(1).unwrap();
        assert!(mean.abs() < 1e-9, "{col_name} mean = {mean}");
        assert!((std - 1.0).abs() < 1e-9, "{col_name} std = {std}");
    }

    // The unscaled label column is untouched
    let labels = scaled.column("unsafe").unwrap().i32().unwrap();
    assert!(labels.into_iter().flatten().all(|v| v == 0 || v == 1));
}

#[test]
fn test_classifier_learns_threshold_rule() {
    let df = training_frame(300);

    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&df, &FEATURE_COLUMNS).unwrap();
    let x = feature_matrix(&scaled, &FEATURE_COLUMNS).unwrap();
    let y = label_vector(&df, "unsafe").unwrap();

    let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.2, 42).unwrap();
    assert_eq!(x_test.nrows(), 60);

    let mut classifier = BoostedTreesClassifier::new(BoostingConfig {
        n_rounds: 60,
        max_depth: 4,
        ..Default::default()
    });
    classifier.fit(&x_train, &y_train).unwrap();

    let y_pred = classifier.predict(&x_test).unwrap();
    let report = ClassificationReport::from_predictions(&y_test, &y_pred, ["safe", "unsafe"]);

    // The label is a function of two features; the trees should recover it.
    assert!(report.accuracy > 0.9, "accuracy = {}", report.accuracy);
    assert_eq!(report.confusion.total(), 60);

    // Temperature and air quality carry the signal
    let importances = classifier.feature_importances().unwrap();
    let temp_and_air = importances[0] + importances[3];
    assert!(temp_and_air > 0.4, "importances = {importances:?}");
}

#[test]
fn test_anomaly_flags_join_the_table() {
    let df = training_frame(150);

    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&df, &FEATURE_COLUMNS).unwrap();
    let x = feature_matrix(&scaled, &FEATURE_COLUMNS).unwrap();

    let mut detector = IsolationForest::new()
        .with_contamination(0.1)
        .with_seed(Some(42));
    detector.fit(&x).unwrap();
    let flags = detector.predict(&x).unwrap();

    assert_eq!(flags.len(), 150);
    let outliers = flags.iter().filter(|&&f| f == 1).count();
    assert!(outliers > 0);
    assert!(outliers < 150 / 3);
}
