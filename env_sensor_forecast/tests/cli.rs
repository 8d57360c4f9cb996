use std::path::Path;
use std::process::{Command, Output};

use chrono::{Duration, NaiveDate};
use env_sensor_common::{dataset, SensorReading};

fn write_dataset(path: &Path, rows: usize) {
    let start = NaiveDate::from_ymd_opt(2025, 9, 14).unwrap().and_hms_opt(3, 0, 0).unwrap();
    let readings: Vec<SensorReading> = (0..rows)
        .map(|i| {
            let h = i as f64;
            SensorReading {
                timestamp: start + Duration::hours(i as i64),
                ir_distance_cm: 40.0 + (h * 0.3).sin() * 30.0,
                ultrasonic_distance_cm: 200.0 + (h * 0.7).cos() * 150.0,
                temperature_c: 25.0 + 5.0 * (h * std::f64::consts::PI / 12.0).sin(),
                humidity_percent: 60.0 + (h * 1.3).sin() * 20.0,
                rain_sensor_value: (512.0 + (h * 0.9).sin() * 250.0) as u16,
            }
        })
        .collect();
    dataset::write_csv(path, &readings).unwrap();
}

fn forecast(args: &[&str], input: &Path, output: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_env_sensor_forecast"))
        .args(["--no-plot", "--samples", "50", "--seed", "8", "--input"])
        .arg(input)
        .arg("--output")
        .arg(output)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn persists_the_temperature_forecast() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dataset.csv");
    let output = dir.path().join("forecast.csv");
    write_dataset(&input, 400);

    let result = forecast(&["--horizon", "48"], &input, &output);
    assert!(result.status.success(), "{:?}", result);
    assert!(String::from_utf8_lossy(&result.stdout).contains("Forecasts generated and saved."));

    let mut rdr = csv::Reader::from_path(&output).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "ds");
    assert_eq!(&headers[headers.len() - 1], "yhat");
    assert!(headers.iter().any(|h| h == "daily"));
    assert!(headers.iter().any(|h| h == "weekly"));
    assert!(headers.iter().all(|h| h != "yearly"));

    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 448);
    assert_eq!(&records[0][0], "2025-09-14 03:00:00");
    assert_eq!(&records[447][0], "2025-10-02 18:00:00");

    // the series is a clean daily cycle around 25
    let yhat: f64 = records[447][headers.len() - 1].parse().unwrap();
    assert!((yhat - 25.0).abs() < 6.0, "{}", yhat);
}

#[test]
fn nothing_persisted_without_the_persist_column() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dataset.csv");
    let output = dir.path().join("forecast.csv");
    write_dataset(&input, 100);

    let result = forecast(&["--columns", "humidity_percent"], &input, &output);
    assert!(result.status.success(), "{:?}", result);
    assert!(!output.exists());
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = forecast(&[], &dir.path().join("absent.csv"), &dir.path().join("forecast.csv"));
    assert!(!result.status.success());
}
