//! Trend forecasters for the deseasonalized component.

use crate::utils::linear_fit;

/// Method used to forecast the deseasonalized (trend plus remainder)
/// component of a decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendMethod {
    /// Simple exponential smoothing with a grid-searched parameter.
    #[default]
    Ses,
    /// Linear extrapolation.
    Linear,
    /// Last value carried forward.
    Naive,
}

/// Seam for the trend component's forecaster.
pub(crate) trait TrendForecaster: std::fmt::Debug {
    fn forecast(&self, horizon: usize) -> Vec<f64>;
}

/// Fit the configured trend method to the deseasonalized series.
pub(crate) fn fit_trend(method: TrendMethod, values: &[f64]) -> Box<dyn TrendForecaster> {
    match method {
        TrendMethod::Ses => Box::new(SesTrend::fit(values)),
        TrendMethod::Linear => Box::new(LinearTrend::fit(values)),
        TrendMethod::Naive => Box::new(NaiveTrend {
            last: values.last().copied().unwrap_or(0.0),
        }),
    }
}

/// Simple exponential smoothing; flat forecast from the final level.
#[derive(Debug, Clone)]
struct SesTrend {
    level: f64,
}

impl SesTrend {
    fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { level: 0.0 };
        }

        // Grid search over the smoothing parameter, minimizing the
        // one-step-ahead squared error.
        let mut best_alpha = 0.5;
        let mut best_sse = f64::INFINITY;
        for step in 1..100 {
            let alpha = step as f64 / 100.0;
            let sse = Self::sse(values, alpha);
            if sse < best_sse {
                best_sse = sse;
                best_alpha = alpha;
            }
        }

        let mut level = values[0];
        for &y in &values[1..] {
            level = best_alpha * y + (1.0 - best_alpha) * level;
        }
        Self { level }
    }

    fn sse(values: &[f64], alpha: f64) -> f64 {
        let mut level = values[0];
        let mut sse = 0.0;
        for &y in &values[1..] {
            let error = y - level;
            sse += error * error;
            level = alpha * y + (1.0 - alpha) * level;
        }
        sse
    }
}

impl TrendForecaster for SesTrend {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        vec![self.level; horizon]
    }
}

/// Linear extrapolation of the deseasonalized series.
#[derive(Debug, Clone)]
struct LinearTrend {
    intercept: f64,
    slope: f64,
    n: usize,
}

impl LinearTrend {
    fn fit(values: &[f64]) -> Self {
        let x: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        let (intercept, slope) = linear_fit(&x, values);
        Self {
            intercept,
            slope,
            n: values.len(),
        }
    }
}

impl TrendForecaster for LinearTrend {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon)
            .map(|h| self.intercept + self.slope * (self.n - 1 + h) as f64)
            .collect()
    }
}

/// Last observed value carried forward.
#[derive(Debug, Clone)]
struct NaiveTrend {
    last: f64,
}

impl TrendForecaster for NaiveTrend {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        vec![self.last; horizon]
    }
}
