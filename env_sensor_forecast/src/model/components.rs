use std::f64::consts::PI;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A Fourier-series seasonal component.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    pub period_days: f64,
    pub fourier_order: usize,
}

pub const YEARLY: Seasonality = Seasonality { name: "yearly", period_days: 365.25, fourier_order: 10 };
pub const WEEKLY: Seasonality = Seasonality { name: "weekly", period_days: 7.0, fourier_order: 3 };
pub const DAILY: Seasonality = Seasonality { name: "daily", period_days: 1.0, fourier_order: 4 };

impl Seasonality {
    /// Number of design-matrix columns (a sine and a cosine per order).
    pub fn width(&self) -> usize {
        2 * self.fourier_order
    }

    pub fn features(&self, days: f64, out: &mut Vec<f64>) {
        for k in 1..=self.fourier_order {
            let x = 2.0 * PI * k as f64 * days / self.period_days;
            out.push(x.sin());
            out.push(x.cos());
        }
    }
}

/// Days since the Unix epoch; the time axis of every seasonality.
pub fn epoch_days(ds: &NaiveDateTime) -> f64 {
    ds.and_utc().timestamp() as f64 / SECONDS_PER_DAY
}

/// Seasonalities worth fitting given the span and spacing of the history,
/// sorted by name.
///
/// Yearly needs two years of history. Weekly needs two weeks and sub-weekly
/// spacing. Daily needs two days and sub-daily spacing.
pub fn auto_seasonalities(ds: &[NaiveDateTime]) -> Vec<Seasonality> {
    let (first, last) = match (ds.iter().min(), ds.iter().max()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };
    let span = last - first;
    let min_spacing = ds
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .filter(|d| *d > Duration::zero())
        .min()
        .unwrap_or(span);

    let mut enabled = Vec::new();
    if span >= Duration::days(2) && min_spacing < Duration::days(1) {
        enabled.push(DAILY);
    }
    if span >= Duration::days(14) && min_spacing < Duration::days(7) {
        enabled.push(WEEKLY);
    }
    if span >= Duration::days(730) {
        enabled.push(YEARLY);
    }
    enabled
}

/// Potential changepoints in scaled time, at evenly spaced history rows
/// within the first `range` share of the (sorted) history.
pub fn changepoints(t: &[f64], n_changepoints: usize, range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * range).floor() as usize;
    let n = n_changepoints.min(hist_size.saturating_sub(1));
    if n == 0 {
        return Vec::new();
    }
    let last = (hist_size - 1) as f64;
    (1..=n)
        .map(|i| {
            let idx = (i as f64 * last / n as f64).round() as usize;
            t[idx]
        })
        .collect()
}

/// Piecewise-linear trend features: offset, slope, and one hinge per changepoint.
pub fn trend_features(t: f64, changepoints: &[f64], out: &mut Vec<f64>) {
    out.push(1.0);
    out.push(t);
    for s in changepoints {
        out.push((t - s).max(0.0));
    }
}
