use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::{Laplace, Normal};

/// Parameters of the simulated forecast error, in scaled units.
#[derive(Debug, Clone)]
pub struct NoiseModel {
    /// Expected trend changes per unit of scaled time.
    pub changepoint_rate: f64,
    /// Laplace scale of simulated trend changes.
    pub delta_scale: f64,
    /// Standard deviation of the observation noise.
    pub sigma: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Bounds {
    pub yhat_lower: Vec<f64>,
    pub yhat_upper: Vec<f64>,
    pub trend_lower: Vec<f64>,
    pub trend_upper: Vec<f64>,
}

/// Empirical quantile with linear interpolation between order statistics.
/// `sorted` must be ascending and non-empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Simulate `samples` forecast paths and take the central `width` interval.
///
/// Rows with `t <= 1` lie inside the history and keep their fitted trend;
/// beyond it, trend changes arrive at the historical changepoint rate with
/// Laplace-distributed magnitude. Every row gets Gaussian observation noise.
pub fn sample_bounds<R: Rng>(
    t: &[f64],
    trend: &[f64],
    yhat: &[f64],
    noise: &NoiseModel,
    samples: usize,
    width: f64,
    rng: &mut R,
) -> Bounds {
    if samples == 0 {
        return Bounds {
            yhat_lower: yhat.to_vec(),
            yhat_upper: yhat.to_vec(),
            trend_lower: trend.to_vec(),
            trend_upper: trend.to_vec(),
        };
    }

    let mut order: Vec<usize> = (0..t.len()).collect();
    order.sort_by(|a, b| t[*a].total_cmp(&t[*b]));

    let laplace = Laplace::new(0.0, noise.delta_scale.max(1e-8)).ok();
    let normal = if noise.sigma > 0.0 { Normal::new(0.0, noise.sigma).ok() } else { None };

    let mut trend_samples = vec![Vec::with_capacity(samples); t.len()];
    let mut yhat_samples = vec![Vec::with_capacity(samples); t.len()];

    for _ in 0..samples {
        let mut slope = 0.0;
        let mut offset = 0.0;
        let mut prev_t = 1.0;
        for &row in &order {
            let ti = t[row];
            if ti > prev_t {
                let dt = ti - prev_t;
                let p = 1.0 - (-noise.changepoint_rate * dt).exp();
                if let Some(laplace) = &laplace {
                    if p > 0.0 && rng.gen_bool(p.min(1.0)) {
                        let s = prev_t + rng.gen::<f64>() * dt;
                        let delta = laplace.sample(rng);
                        slope += delta;
                        offset -= delta * s;
                    }
                }
                prev_t = ti;
            }
            let extra = if ti > 1.0 { slope * ti + offset } else { 0.0 };
            let eps = normal.as_ref().map_or(0.0, |n| n.sample(rng));
            trend_samples[row].push(trend[row] + extra);
            yhat_samples[row].push(yhat[row] + extra + eps);
        }
    }

    let lower_q = (1.0 - width) / 2.0;
    let upper_q = (1.0 + width) / 2.0;
    let mut bounds = Bounds::default();
    for row in 0..t.len() {
        let ys = &mut yhat_samples[row];
        ys.sort_by(f64::total_cmp);
        bounds.yhat_lower.push(quantile(ys, lower_q));
        bounds.yhat_upper.push(quantile(ys, upper_q));

        let ts = &mut trend_samples[row];
        ts.sort_by(f64::total_cmp);
        bounds.trend_lower.push(quantile(ts, lower_q));
        bounds.trend_upper.push(quantile(ts, upper_q));
    }
    bounds
}
