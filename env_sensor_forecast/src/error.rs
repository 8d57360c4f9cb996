use env_sensor_common::DatasetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("DatasetError({:?})", .0)]
    Dataset(#[from] DatasetError),
    #[error("CsvError({:?})", .0)]
    Csv(#[from] csv::Error),
    #[error("IoError({:?})", .0)]
    Io(#[from] std::io::Error),
    #[error("InsufficientData (rows={}, need at least 2)", .0)]
    InsufficientData(usize),
    #[error("NonFiniteValue (row={})", .0)]
    NonFiniteValue(usize),
    #[error("DegenerateTimeRange: all timestamps are equal")]
    DegenerateTimeRange,
    #[error("SingularSystem: could not solve for model parameters")]
    SingularSystem,
    #[error("InvalidIntervalWidth ({}), must lie in (0, 1)", .0)]
    InvalidIntervalWidth(f64),
}
