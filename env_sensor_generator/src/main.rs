mod generator;

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime, SubsecRound};
use clap::Parser;
use env_sensor_common::{dataset, format_timestamp, DatasetError};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::generator::DatasetGenerator;

/// Generate a synthetic environmental sensor dataset as CSV.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of hourly readings to generate.
    #[arg(long, env = "SENSOR_DATASET_ROWS", default_value_t = 1000)]
    rows: usize,

    /// Destination CSV file. Overwritten if present.
    #[arg(long, env = "SENSOR_DATASET_FILE", default_value = "environmental_sensor_dataset.csv")]
    output: PathBuf,

    /// Seed for a reproducible dataset.
    #[arg(long, env = "SENSOR_DATASET_SEED")]
    seed: Option<u64>,
}

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("DatasetError({:?})", .0)]
    Dataset(#[from] DatasetError),
}

fn main() -> Result<(), GenerateError> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let args = Args::parse();
    debug!("{:?}", args);

    let start = Local::now().naive_local().trunc_subsecs(0);
    let rows = match args.seed {
        Some(seed) => run(DatasetGenerator::new(StdRng::seed_from_u64(seed)), start, &args),
        None => run(DatasetGenerator::new(rand::thread_rng()), start, &args),
    }?;

    println!("Dataset saved as: {} with {} hourly records.", args.output.display(), rows);
    Ok(())
}

fn run<R: Rng>(
    mut generator: DatasetGenerator<R>,
    start: NaiveDateTime,
    args: &Args,
) -> Result<usize, GenerateError> {
    let readings = generator.generate(start, args.rows);
    dataset::write_csv(&args.output, &readings)?;
    info!(
        "Wrote {} readings from {} to {}",
        readings.len(),
        format_timestamp(&start),
        args.output.display()
    );
    Ok(readings.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use env_sensor_common::HEADER;

    fn args(rows: usize, output: PathBuf) -> Args {
        Args { rows, output, seed: Some(5) }
    }

    #[test]
    fn ten_rows_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("environmental_sensor_dataset.csv");
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(8, 0, 3).unwrap();

        let rows = run(DatasetGenerator::new(StdRng::seed_from_u64(5)), start, &args(10, path.clone())).unwrap();
        assert_eq!(rows, 10);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], HEADER.join(","));
        assert!(lines[1].starts_with("2025-06-01 08:00:03,"), "{}", lines[1]);

        let readings = dataset::read_csv(&path).unwrap();
        assert_eq!(readings.len(), 10);
        assert_eq!(readings[9].timestamp, start + Duration::hours(9));
    }

    #[test]
    fn unwritable_destination_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("dataset.csv");
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();

        let result = run(DatasetGenerator::new(StdRng::seed_from_u64(5)), start, &args(3, path));
        assert!(matches!(result, Err(GenerateError::Dataset(DatasetError::Io(_)))));
    }

    #[test]
    fn defaults_match_the_original_script() {
        let args = Args::try_parse_from(["env_sensor_generator"]).unwrap();
        assert_eq!(args.rows, 1000);
        assert_eq!(args.output, PathBuf::from("environmental_sensor_dataset.csv"));
    }
}
