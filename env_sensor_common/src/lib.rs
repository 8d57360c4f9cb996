pub mod dataset;
pub mod error;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub use error::DatasetError;

/// Format of every timestamp written to or read from a dataset file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header row of the dataset CSV, in column order.
pub const HEADER: [&str; 6] = [
    "timestamp",
    "ir_distance_cm",
    "ultrasonic_distance_cm",
    "temperature_C",
    "humidity_percent",
    "rain_sensor_value",
];

/// Midpoint of the rain sensor's 10-bit ADC.
pub const RAIN_ADC_MIDPOINT: f64 = 512.0;
/// Largest value the rain sensor's ADC can report.
pub const RAIN_ADC_MAX: u16 = 1023;

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct SensorReading {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub ir_distance_cm: f64,
    pub ultrasonic_distance_cm: f64,
    #[serde(rename = "temperature_C")]
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub rain_sensor_value: u16,
}

impl SensorReading {
    pub fn value(&self, column: SensorColumn) -> f64 {
        match column {
            SensorColumn::IrDistance => self.ir_distance_cm,
            SensorColumn::UltrasonicDistance => self.ultrasonic_distance_cm,
            SensorColumn::Temperature => self.temperature_c,
            SensorColumn::Humidity => self.humidity_percent,
            SensorColumn::Rain => self.rain_sensor_value as f64,
        }
    }
}

/// The numeric columns of a dataset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SensorColumn {
    IrDistance,
    UltrasonicDistance,
    Temperature,
    Humidity,
    Rain,
}

impl SensorColumn {
    pub const ALL: [SensorColumn; 5] = [
        SensorColumn::IrDistance,
        SensorColumn::UltrasonicDistance,
        SensorColumn::Temperature,
        SensorColumn::Humidity,
        SensorColumn::Rain,
    ];

    /// Header name of the column in the dataset CSV.
    pub fn name(&self) -> &'static str {
        match self {
            SensorColumn::IrDistance => "ir_distance_cm",
            SensorColumn::UltrasonicDistance => "ultrasonic_distance_cm",
            SensorColumn::Temperature => "temperature_C",
            SensorColumn::Humidity => "humidity_percent",
            SensorColumn::Rain => "rain_sensor_value",
        }
    }
}

impl fmt::Display for SensorColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorColumn {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SensorColumn::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| DatasetError::UnknownColumn(s.to_string()))
    }
}

/// Round to two decimal places, the precision of every continuous field.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Truncate a noisy ADC level into the rain sensor's 0..=1023 range.
pub fn rain_adc(level: f64) -> u16 {
    level.clamp(0.0, RAIN_ADC_MAX as f64) as u16
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a dataset timestamp. ISO-8601 `T` separators are accepted as well.
pub fn parse_timestamp(s: &str) -> chrono::ParseResult<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
}

pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s).map_err(de::Error::custom)
    }
}
