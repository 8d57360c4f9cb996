use chrono::Duration;
use env_sensor_common::{SensorColumn, SensorReading};
use log::{debug, info, warn};
use rand::Rng;

use crate::error::ForecastError;
use crate::model::schema::ForecastFrame;
use crate::model::{AdditiveModel, TimeSeries};
use crate::plot::{ForecastChart, ForecastDisplay};

/// Fit one column independently, forecast `horizon` hourly steps past the
/// data and show the result.
pub fn train_forecast<R: Rng>(
    readings: &[SensorReading],
    column: SensorColumn,
    horizon: usize,
    model: &AdditiveModel,
    display: &mut dyn ForecastDisplay,
    rng: &mut R,
) -> Result<ForecastFrame, ForecastError> {
    let series = TimeSeries::from_readings(readings, column);
    let fitted = model.fit(&series)?;
    debug!(
        "Fitted {}: {}",
        column,
        serde_json::to_string_pretty(&fitted.summary()).unwrap_or("error".to_string())
    );

    let future = fitted.make_future_frame(&series, horizon, Duration::hours(1));
    let forecast = fitted.predict(&future, rng);
    info!("Forecast {} over {} rows ({} ahead)", column, forecast.len(), horizon);

    display.show(&ForecastChart::new(column.name(), &series, &forecast))?;
    Ok(forecast)
}

/// Forecast each column in turn; only the forecast of `persist` is kept.
pub fn run_columns<R: Rng>(
    readings: &[SensorReading],
    columns: &[SensorColumn],
    persist: SensorColumn,
    horizon: usize,
    model: &AdditiveModel,
    display: &mut dyn ForecastDisplay,
    rng: &mut R,
) -> Result<Option<ForecastFrame>, ForecastError> {
    let mut kept = None;
    for &column in columns {
        let forecast = train_forecast(readings, column, horizon, model, display, rng)?;
        if column == persist {
            kept = Some(forecast);
        } else {
            debug!("Discarding {} forecast", column);
        }
    }
    if kept.is_none() {
        warn!("{} was not among the forecast columns, nothing to persist", persist);
    }
    Ok(kept)
}
