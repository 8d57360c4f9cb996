//! Additive time-series model: a piecewise-linear trend plus Fourier
//! seasonalities, fitted by penalised least squares.

pub mod components;
pub mod schema;
pub mod uncertainty;

use chrono::{Duration, NaiveDateTime};
use env_sensor_common::{SensorColumn, SensorReading};
use log::debug;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use serde::Serialize;

use crate::error::ForecastError;
use components::Seasonality;
use schema::{Component, ForecastFrame};
use uncertainty::NoiseModel;

/// Prior scale of the trend offset and slope.
const TREND_PRIOR_SCALE: f64 = 5.0;
/// Observation noise assumed for the first fitting pass, in scaled units.
const INITIAL_SIGMA: f64 = 0.5;
const MIN_VARIANCE: f64 = 1e-10;

/// A univariate series in the model's `(ds, y)` schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub ds: Vec<NaiveDateTime>,
    pub y: Vec<f64>,
}

impl TimeSeries {
    pub fn new(ds: Vec<NaiveDateTime>, y: Vec<f64>) -> Self {
        debug_assert_eq!(ds.len(), y.len());
        Self { ds, y }
    }

    pub fn from_readings(readings: &[SensorReading], column: SensorColumn) -> Self {
        Self {
            ds: readings.iter().map(|r| r.timestamp).collect(),
            y: readings.iter().map(|r| r.value(column)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ds.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub n_changepoints: usize,
    /// Share of the history in which changepoints may be placed.
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    /// Probability mass covered by the uncertainty interval.
    pub interval_width: f64,
    pub uncertainty_samples: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            interval_width: 0.8,
            uncertainty_samples: 1000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdditiveModel {
    pub config: ModelConfig,
}

/// What a fit produced, for logging.
#[derive(Serialize, Debug, Clone)]
pub struct FitSummary {
    pub rows: usize,
    pub start: String,
    pub end: String,
    pub changepoints: usize,
    pub seasonalities: Vec<&'static str>,
    pub y_scale: f64,
    pub sigma: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone)]
pub struct FittedModel {
    config: ModelConfig,
    start: NaiveDateTime,
    end: NaiveDateTime,
    t_scale: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    offset: f64,
    slope: f64,
    deltas: Vec<f64>,
    /// Fourier coefficients, one block per seasonality.
    betas: Vec<Vec<f64>>,
    sigma: f64,
    rows: usize,
}

impl AdditiveModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn fit(&self, series: &TimeSeries) -> Result<FittedModel, ForecastError> {
        let width = self.config.interval_width;
        if !(width > 0.0 && width < 1.0) {
            return Err(ForecastError::InvalidIntervalWidth(width));
        }
        let n = series.len();
        if n < 2 {
            return Err(ForecastError::InsufficientData(n));
        }
        if let Some(row) = series.y.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::NonFiniteValue(row));
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| series.ds[i]);
        let ds: Vec<NaiveDateTime> = order.iter().map(|&i| series.ds[i]).collect();
        let y: Vec<f64> = order.iter().map(|&i| series.y[i]).collect();

        let start = ds[0];
        let end = ds[n - 1];
        let t_scale = (end - start).num_seconds() as f64;
        if t_scale <= 0.0 {
            return Err(ForecastError::DegenerateTimeRange);
        }
        let y_scale = match y.iter().fold(0.0f64, |m, v| m.max(v.abs())) {
            m if m > 0.0 => m,
            _ => 1.0,
        };

        let t: Vec<f64> = ds.iter().map(|d| scaled_time(start, t_scale, d)).collect();
        let y_scaled = DVector::from_iterator(n, y.iter().map(|v| v / y_scale));
        let changepoints =
            components::changepoints(&t, self.config.n_changepoints, self.config.changepoint_range);
        let seasonalities = components::auto_seasonalities(&ds);

        let x = design_matrix(&ds, &t, &changepoints, &seasonalities);
        let precision = self.prior_precision(changepoints.len(), &seasonalities);

        let first = solve(&x, &y_scaled, &precision, INITIAL_SIGMA * INITIAL_SIGMA)?;
        let variance = residual_variance(&x, &y_scaled, &first).max(MIN_VARIANCE);
        let beta = solve(&x, &y_scaled, &precision, variance)?;
        let sigma = residual_variance(&x, &y_scaled, &beta).sqrt();

        let n_cp = changepoints.len();
        let mut betas: Vec<Vec<f64>> = Vec::with_capacity(seasonalities.len());
        let mut col = 2 + n_cp;
        for s in &seasonalities {
            betas.push(beta.rows(col, s.width()).iter().copied().collect());
            col += s.width();
        }

        Ok(FittedModel {
            config: self.config.clone(),
            start,
            end,
            t_scale,
            y_scale,
            offset: beta[0],
            slope: beta[1],
            deltas: beta.rows(2, n_cp).iter().copied().collect(),
            changepoints,
            seasonalities,
            betas,
            sigma,
            rows: n,
        })
    }

    /// Diagonal of the Gaussian prior precision, one entry per design column.
    fn prior_precision(&self, n_changepoints: usize, seasonalities: &[Seasonality]) -> Vec<f64> {
        let mut precision = vec![1.0 / (TREND_PRIOR_SCALE * TREND_PRIOR_SCALE); 2];
        // Gaussian with the variance of Laplace(0, scale)
        let cp = self.config.changepoint_prior_scale;
        precision.extend(std::iter::repeat(1.0 / (2.0 * cp * cp)).take(n_changepoints));
        let sp = self.config.seasonality_prior_scale;
        let width: usize = seasonalities.iter().map(|s| s.width()).sum();
        precision.extend(std::iter::repeat(1.0 / (sp * sp)).take(width));
        precision
    }
}

fn scaled_time(start: NaiveDateTime, t_scale: f64, ds: &NaiveDateTime) -> f64 {
    (*ds - start).num_seconds() as f64 / t_scale
}

fn design_matrix(
    ds: &[NaiveDateTime],
    t: &[f64],
    changepoints: &[f64],
    seasonalities: &[Seasonality],
) -> DMatrix<f64> {
    let mut flat = Vec::new();
    let mut width = 0;
    for (d, ti) in ds.iter().zip(t) {
        let before = flat.len();
        components::trend_features(*ti, changepoints, &mut flat);
        let days = components::epoch_days(d);
        for s in seasonalities {
            s.features(days, &mut flat);
        }
        width = flat.len() - before;
    }
    DMatrix::from_row_slice(ds.len(), width, &flat)
}

/// MAP estimate under the Gaussian prior: `(XᵀX + σ²·P) β = Xᵀy`.
fn solve(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    precision: &[f64],
    variance: f64,
) -> Result<DVector<f64>, ForecastError> {
    let mut a = x.transpose() * x;
    for (i, p) in precision.iter().enumerate() {
        a[(i, i)] += variance * p;
    }
    let b = x.transpose() * y;

    if let Some(chol) = a.clone().cholesky() {
        return Ok(chol.solve(&b));
    }
    debug!("Normal equations not positive definite, falling back to LU");
    a.lu().solve(&b).ok_or(ForecastError::SingularSystem)
}

fn residual_variance(x: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> f64 {
    let residuals = y - x * beta;
    residuals.norm_squared() / y.len() as f64
}

impl FittedModel {
    pub fn summary(&self) -> FitSummary {
        FitSummary {
            rows: self.rows,
            start: env_sensor_common::format_timestamp(&self.start),
            end: env_sensor_common::format_timestamp(&self.end),
            changepoints: self.changepoints.len(),
            seasonalities: self.seasonalities.iter().map(|s| s.name).collect(),
            y_scale: self.y_scale,
            sigma: self.sigma * self.y_scale,
            growth_rate: self.slope * self.y_scale,
        }
    }

    /// The history's timestamps followed by `periods` timestamps spaced `step`
    /// after the last observation.
    pub fn make_future_frame(&self, history: &TimeSeries, periods: usize, step: Duration) -> Vec<NaiveDateTime> {
        let mut ds = history.ds.clone();
        ds.sort();
        ds.dedup();
        ds.extend((1..=periods).map(|i| self.end + step * i as i32));
        ds
    }

    /// Point forecast, decomposition and uncertainty bounds for each `ds`.
    pub fn predict<R: Rng>(&self, ds: &[NaiveDateTime], rng: &mut R) -> ForecastFrame {
        let t: Vec<f64> = ds.iter().map(|d| scaled_time(self.start, self.t_scale, d)).collect();

        let trend: Vec<f64> = t.iter().map(|ti| self.trend_at(*ti)).collect();
        let seasonal: Vec<Vec<f64>> = self
            .seasonalities
            .iter()
            .zip(&self.betas)
            .map(|(s, beta)| {
                let mut features = Vec::with_capacity(s.width());
                ds.iter()
                    .map(|d| {
                        features.clear();
                        s.features(components::epoch_days(d), &mut features);
                        features.iter().zip(beta).map(|(f, b)| f * b).sum()
                    })
                    .collect()
            })
            .collect();
        let yhat: Vec<f64> = (0..ds.len())
            .map(|row| trend[row] + seasonal.iter().map(|c| c[row]).sum::<f64>())
            .collect();

        let noise = NoiseModel {
            changepoint_rate: self.changepoints.len() as f64,
            delta_scale: mean_abs(&self.deltas),
            sigma: self.sigma,
        };
        let bounds = uncertainty::sample_bounds(
            &t,
            &trend,
            &yhat,
            &noise,
            self.config.uncertainty_samples,
            self.config.interval_width,
            rng,
        );

        let scale = |v: Vec<f64>| -> Vec<f64> { v.into_iter().map(|x| x * self.y_scale).collect() };
        ForecastFrame {
            ds: ds.to_vec(),
            trend: scale(trend),
            trend_lower: scale(bounds.trend_lower),
            trend_upper: scale(bounds.trend_upper),
            seasonal: self
                .seasonalities
                .iter()
                .zip(seasonal)
                .map(|(s, values)| Component { name: s.name.to_string(), values: scale(values) })
                .collect(),
            yhat: scale(yhat),
            yhat_lower: scale(bounds.yhat_lower),
            yhat_upper: scale(bounds.yhat_upper),
        }
    }

    fn trend_at(&self, t: f64) -> f64 {
        let hinge: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(s, d)| d * (t - s).max(0.0))
            .sum();
        self.offset + self.slope * t + hinge
    }
}

fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}
