mod error;
mod model;
mod plot;
mod runner;

use std::path::PathBuf;

use clap::Parser;
use env_sensor_common::{dataset, SensorColumn};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::ForecastError;
use crate::model::{AdditiveModel, ModelConfig};
use crate::plot::{ForecastDisplay, LogDisplay, TerminalDisplay};

/// Forecast sensor columns of a dataset with an additive time-series model.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Dataset CSV to read.
    #[arg(long, env = "SENSOR_DATASET_FILE", default_value = "environmental_sensor_dataset.csv")]
    input: PathBuf,

    /// Where the persisted forecast is written.
    #[arg(long, env = "SENSOR_FORECAST_FILE", default_value = "environmental_forecast.csv")]
    output: PathBuf,

    /// Hourly steps to forecast past the last observation.
    #[arg(long, env = "SENSOR_FORECAST_HORIZON", default_value_t = 168)]
    horizon: usize,

    /// Columns to forecast, in order.
    #[arg(
        long,
        env = "SENSOR_FORECAST_COLUMNS",
        value_delimiter = ',',
        default_value = "humidity_percent,temperature_C,rain_sensor_value"
    )]
    columns: Vec<SensorColumn>,

    /// Column whose forecast is written to `--output`.
    #[arg(long, env = "SENSOR_FORECAST_PERSIST", default_value = "temperature_C")]
    persist: SensorColumn,

    /// Probability mass of the uncertainty interval.
    #[arg(long, env = "SENSOR_FORECAST_INTERVAL", default_value_t = 0.8)]
    interval_width: f64,

    /// Simulated paths used for the uncertainty interval; 0 disables it.
    #[arg(long, env = "SENSOR_FORECAST_SAMPLES", default_value_t = 1000)]
    samples: usize,

    /// Seed for reproducible uncertainty intervals.
    #[arg(long, env = "SENSOR_FORECAST_SEED")]
    seed: Option<u64>,

    /// Log a summary instead of showing each chart.
    #[arg(long, env = "SENSOR_FORECAST_NO_PLOT")]
    no_plot: bool,
}

fn main() -> Result<(), ForecastError> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let args = Args::parse();
    debug!("{:?}", args);

    let readings = dataset::read_csv(&args.input)?;
    info!("Loaded {} readings from {}", readings.len(), args.input.display());

    let model = AdditiveModel::new(ModelConfig {
        interval_width: args.interval_width,
        uncertainty_samples: args.samples,
        ..ModelConfig::default()
    });
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut display: Box<dyn ForecastDisplay> = if args.no_plot {
        Box::new(LogDisplay)
    } else {
        Box::new(TerminalDisplay)
    };

    let kept = runner::run_columns(
        &readings,
        &args.columns,
        args.persist,
        args.horizon,
        &model,
        display.as_mut(),
        &mut rng,
    )?;

    match kept {
        Some(forecast) => {
            forecast.write_csv(&args.output)?;
            info!("Wrote {} forecast rows to {}", forecast.len(), args.output.display());
            println!("Forecasts generated and saved.");
        }
        None => println!("Forecasts generated."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_script() {
        let args = Args::try_parse_from(["env_sensor_forecast"]).unwrap();
        assert_eq!(args.input, PathBuf::from("environmental_sensor_dataset.csv"));
        assert_eq!(args.output, PathBuf::from("environmental_forecast.csv"));
        assert_eq!(args.horizon, 168);
        assert_eq!(
            args.columns,
            vec![SensorColumn::Humidity, SensorColumn::Temperature, SensorColumn::Rain]
        );
        assert_eq!(args.persist, SensorColumn::Temperature);
        assert_eq!(args.interval_width, 0.8);
        assert!(!args.no_plot);
    }

    #[test]
    fn column_list_is_parsed() {
        let args = Args::try_parse_from([
            "env_sensor_forecast",
            "--columns",
            "ir_distance_cm,ultrasonic_distance_cm",
            "--persist",
            "ir_distance_cm",
            "--no-plot",
        ])
        .unwrap();
        assert_eq!(args.columns, vec![SensorColumn::IrDistance, SensorColumn::UltrasonicDistance]);
        assert_eq!(args.persist, SensorColumn::IrDistance);
        assert!(args.no_plot);
    }

    #[test]
    fn unknown_column_is_rejected() {
        assert!(Args::try_parse_from(["env_sensor_forecast", "--columns", "wind_speed"]).is_err());
    }
}
