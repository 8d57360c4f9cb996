use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::WriterBuilder;
use env_sensor_common::format_timestamp;

use crate::error::ForecastError;

/// One named seasonal component of a forecast, one value per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub values: Vec<f64>,
}

/// Forecast for every row of a frame: history followed by the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFrame {
    pub ds: Vec<NaiveDateTime>,
    pub trend: Vec<f64>,
    pub trend_lower: Vec<f64>,
    pub trend_upper: Vec<f64>,
    /// Seasonal components, sorted by name.
    pub seasonal: Vec<Component>,
    pub yhat: Vec<f64>,
    pub yhat_lower: Vec<f64>,
    pub yhat_upper: Vec<f64>,
}

impl ForecastFrame {
    pub fn len(&self) -> usize {
        self.ds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ds.is_empty()
    }

    /// Sum of the seasonal components per row.
    pub fn additive_terms(&self) -> Vec<f64> {
        (0..self.len())
            .map(|row| self.seasonal.iter().map(|c| c.values[row]).sum())
            .collect()
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.seasonal.iter().find(|c| c.name == name)
    }

    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = [
            "ds",
            "trend",
            "yhat_lower",
            "yhat_upper",
            "trend_lower",
            "trend_upper",
            "additive_terms",
            "additive_terms_lower",
            "additive_terms_upper",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        for c in &self.seasonal {
            header.push(c.name.clone());
            header.push(format!("{}_lower", c.name));
            header.push(format!("{}_upper", c.name));
        }
        header.extend(
            [
                "multiplicative_terms",
                "multiplicative_terms_lower",
                "multiplicative_terms_upper",
                "yhat",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        header
    }

    /// Write the frame as CSV, header first, no index column.
    pub fn write<W: Write>(&self, writer: W) -> Result<(), ForecastError> {
        let mut wtr = WriterBuilder::new().from_writer(writer);
        wtr.write_record(self.header())?;

        let additive = self.additive_terms();
        for row in 0..self.len() {
            let mut record = vec![
                format_timestamp(&self.ds[row]),
                self.trend[row].to_string(),
                self.yhat_lower[row].to_string(),
                self.yhat_upper[row].to_string(),
                self.trend_lower[row].to_string(),
                self.trend_upper[row].to_string(),
            ];
            // the model is fitted point-wise, so component bounds equal the component
            for _ in 0..3 {
                record.push(additive[row].to_string());
            }
            for c in &self.seasonal {
                for _ in 0..3 {
                    record.push(c.values[row].to_string());
                }
            }
            for _ in 0..3 {
                record.push(0.0f64.to_string());
            }
            record.push(self.yhat[row].to_string());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), ForecastError> {
        let file = File::create(path)?;
        self.write(file)
    }
}
