use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::{DatasetError, SensorReading, HEADER};

/// Write readings as CSV with a header row and no index column.
/// The header is written even when `readings` is empty.
pub fn write_readings<W: Write>(readings: &[SensorReading], writer: W) -> Result<(), DatasetError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HEADER)?;
    for reading in readings {
        wtr.serialize(reading)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write readings to `path`, replacing whatever was there.
pub fn write_csv<P: AsRef<Path>>(path: P, readings: &[SensorReading]) -> Result<(), DatasetError> {
    let file = File::create(path)?;
    write_readings(readings, file)
}

/// Read readings, matching fields by header name.
pub fn read_readings<R: Read>(reader: R) -> Result<Vec<SensorReading>, DatasetError> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut readings = Vec::new();
    for result in rdr.deserialize() {
        let reading: SensorReading = result?;
        readings.push(reading);
    }
    Ok(readings)
}

pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Vec<SensorReading>, DatasetError> {
    let file = File::open(path)?;
    read_readings(file)
}
