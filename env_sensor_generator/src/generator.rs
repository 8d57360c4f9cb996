use std::ops::RangeInclusive;

use chrono::{Duration, NaiveDateTime};
use env_sensor_common::{rain_adc, round2, SensorReading, RAIN_ADC_MIDPOINT};
use log::debug;
use rand::Rng;

/// Sampling range of the infrared distance sensor, centimeters.
pub const IR_DISTANCE_CM: RangeInclusive<f64> = 5.0..=80.0;
/// Sampling range of the ultrasonic distance sensor, centimeters.
pub const ULTRASONIC_DISTANCE_CM: RangeInclusive<f64> = 2.0..=400.0;
pub const TEMPERATURE_C: RangeInclusive<f64> = 15.0..=35.0;
pub const HUMIDITY_PERCENT: RangeInclusive<f64> = 30.0..=90.0;
/// Noise added to the rain sensor's ADC midpoint.
pub const RAIN_NOISE: RangeInclusive<f64> = -300.0..=300.0;

/// Draws independent, uniformly distributed sensor readings.
pub struct DatasetGenerator<R: Rng> {
    rng: R,
}

impl<R: Rng> DatasetGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn sample_reading(&mut self, timestamp: NaiveDateTime) -> SensorReading {
        let rain_level = RAIN_ADC_MIDPOINT + self.rng.gen_range(RAIN_NOISE);

        SensorReading {
            timestamp,
            ir_distance_cm: round2(self.rng.gen_range(IR_DISTANCE_CM)),
            ultrasonic_distance_cm: round2(self.rng.gen_range(ULTRASONIC_DISTANCE_CM)),
            temperature_c: round2(self.rng.gen_range(TEMPERATURE_C)),
            humidity_percent: round2(self.rng.gen_range(HUMIDITY_PERCENT)),
            rain_sensor_value: rain_adc(rain_level),
        }
    }

    /// `rows` readings, one hour apart, the first at `start`.
    pub fn generate(&mut self, start: NaiveDateTime, rows: usize) -> Vec<SensorReading> {
        debug!("Generating {} readings starting at {}", rows, start);
        hourly_timestamps(start, rows)
            .map(|timestamp| self.sample_reading(timestamp))
            .collect()
    }
}

pub fn hourly_timestamps(start: NaiveDateTime, rows: usize) -> impl Iterator<Item = NaiveDateTime> {
    (0..rows).map(move |i| start + Duration::hours(i as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 28)
            .unwrap()
            .and_hms_opt(23, 17, 42)
            .unwrap()
    }

    fn has_two_decimals(value: f64) -> bool {
        ((value * 100.0).round() - value * 100.0).abs() < 1e-6
    }

    #[test]
    fn readings_stay_in_range() {
        let mut generator = DatasetGenerator::new(StdRng::seed_from_u64(7));
        let readings = generator.generate(start(), 5000);

        for r in &readings {
            assert!(IR_DISTANCE_CM.contains(&r.ir_distance_cm), "{:?}", r);
            assert!(ULTRASONIC_DISTANCE_CM.contains(&r.ultrasonic_distance_cm), "{:?}", r);
            assert!(TEMPERATURE_C.contains(&r.temperature_c), "{:?}", r);
            assert!(HUMIDITY_PERCENT.contains(&r.humidity_percent), "{:?}", r);
            assert!(r.rain_sensor_value <= 1023, "{:?}", r);
            assert!((212..=812).contains(&r.rain_sensor_value), "{:?}", r);

            assert!(has_two_decimals(r.ir_distance_cm));
            assert!(has_two_decimals(r.ultrasonic_distance_cm));
            assert!(has_two_decimals(r.temperature_c));
            assert!(has_two_decimals(r.humidity_percent));
        }
    }

    #[test]
    fn timestamps_are_hourly() {
        let mut generator = DatasetGenerator::new(StdRng::seed_from_u64(1));
        let readings = generator.generate(start(), 48);

        assert_eq!(readings.len(), 48);
        assert_eq!(readings[0].timestamp, start());
        for pair in readings.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
        }
        // crosses the leap day without skipping
        assert_eq!(
            readings[1].timestamp,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().and_hms_opt(0, 17, 42).unwrap()
        );
    }

    #[test]
    fn zero_rows() {
        let mut generator = DatasetGenerator::new(StdRng::seed_from_u64(1));
        assert!(generator.generate(start(), 0).is_empty());
    }

    #[test]
    fn same_seed_same_dataset() {
        let a = DatasetGenerator::new(StdRng::seed_from_u64(99)).generate(start(), 20);
        let b = DatasetGenerator::new(StdRng::seed_from_u64(99)).generate(start(), 20);
        let c = DatasetGenerator::new(StdRng::seed_from_u64(100)).generate(start(), 20);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn samples_cover_the_range() {
        let mut generator = DatasetGenerator::new(StdRng::seed_from_u64(3));
        let readings = generator.generate(start(), 2000);
        let temps: Vec<f64> = readings.iter().map(|r| r.temperature_c).collect();
        let min = temps.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min < 16.0 && max > 34.0, "min={} max={}", min, max);
    }
}
