//! MSTL-based forecaster with one exogenous regressor.
//!
//! The model absorbs the exogenous effect by least squares, decomposes
//! the adjusted series with MSTL, and forecasts the deseasonalized
//! component with a configurable trend method. In-sample fitted values
//! reconstruct from the exogenous effect plus trend plus seasonality,
//! so the residuals are exactly the decomposition remainder; prediction
//! intervals are normal bands around the fitted values scaled by the
//! remainder's standard deviation.

use crate::error::{Result, VeloError};
use crate::models::trend::{fit_trend, TrendForecaster, TrendMethod};
use crate::seasonal::{Mstl, MstlDecomposition};
use crate::utils::{linear_fit, quantile_normal};

/// Out-of-sample predictions with interval bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub point: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Seasonal-trend forecaster for a daily counter series.
#[derive(Debug)]
pub struct MstlForecaster {
    periods: Vec<usize>,
    iterations: usize,
    robust: bool,
    trend_method: TrendMethod,

    // Fitted state.
    n: usize,
    exog_slope: f64,
    decomposition: Option<MstlDecomposition>,
    trend_model: Option<Box<dyn TrendForecaster>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_sd: f64,
}

impl MstlForecaster {
    /// Forecaster for the given seasonal periods (typically `[7]`).
    pub fn new(periods: Vec<usize>) -> Self {
        Self {
            periods,
            iterations: 2,
            robust: false,
            trend_method: TrendMethod::default(),
            n: 0,
            exog_slope: 0.0,
            decomposition: None,
            trend_model: None,
            fitted: None,
            residuals: None,
            residual_sd: 0.0,
        }
    }

    /// Set the trend forecasting method.
    pub fn with_trend_method(mut self, method: TrendMethod) -> Self {
        self.trend_method = method;
        self
    }

    /// Set the number of MSTL refinement iterations.
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    /// Enable robust decomposition.
    pub fn robust(mut self) -> Self {
        self.robust = true;
        self
    }

    /// Fit the model on a series and its exogenous regressor.
    pub fn fit(&mut self, values: &[f64], exog: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Err(VeloError::EmptyData);
        }
        if values.len() != exog.len() {
            return Err(VeloError::DimensionMismatch {
                expected: values.len(),
                got: exog.len(),
            });
        }
        let max_period = self.periods.iter().max().copied().ok_or_else(|| {
            VeloError::InvalidParameter("at least one seasonal period is required".to_string())
        })?;
        if values.len() < 2 * max_period {
            return Err(VeloError::InsufficientData {
                needed: 2 * max_period,
                got: values.len(),
            });
        }

        self.n = values.len();

        // Exogenous effect by least squares; only the slope is removed,
        // the intercept stays with the trend.
        let (_, slope) = linear_fit(exog, values);
        self.exog_slope = slope;
        let adjusted: Vec<f64> = values
            .iter()
            .zip(exog)
            .map(|(y, x)| y - slope * x)
            .collect();

        let mut mstl = Mstl::new(self.periods.clone()).with_iterations(self.iterations);
        if self.robust {
            mstl = mstl.robust();
        }
        let decomposition = mstl.decompose(&adjusted).ok_or_else(|| {
            VeloError::ComputationError("MSTL decomposition failed".to_string())
        })?;

        let trend_model = fit_trend(self.trend_method, &decomposition.deseasonalized());

        let total_seasonal = decomposition.total_seasonal();
        let fitted: Vec<f64> = (0..self.n)
            .map(|i| slope * exog[i] + decomposition.trend[i] + total_seasonal[i])
            .collect();
        let residuals: Vec<f64> = values
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect();
        self.residual_sd =
            (residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64).sqrt();

        self.decomposition = Some(decomposition);
        self.trend_model = Some(trend_model);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    /// Whether the model has been fitted.
    pub fn is_fitted(&self) -> bool {
        self.decomposition.is_some()
    }

    /// In-sample fitted values.
    pub fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    /// Residuals (observed minus fitted).
    pub fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    /// Estimated exogenous coefficient.
    pub fn exog_slope(&self) -> Option<f64> {
        self.decomposition.as_ref().map(|_| self.exog_slope)
    }

    /// The underlying decomposition.
    pub fn decomposition(&self) -> Option<&MstlDecomposition> {
        self.decomposition.as_ref()
    }

    /// In-sample fitted values with interval bounds at the two-sided
    /// confidence `level` (e.g. `0.997`).
    pub fn fitted_with_intervals(&self, level: f64) -> Result<Prediction> {
        let fitted = self.fitted.as_ref().ok_or(VeloError::FitRequired)?;
        let z = interval_z(level)?;
        let half_width = z * self.residual_sd;

        Ok(Prediction {
            point: fitted.clone(),
            lower: fitted.iter().map(|f| f - half_width).collect(),
            upper: fitted.iter().map(|f| f + half_width).collect(),
        })
    }

    /// Forecast `horizon` steps beyond the window, given the future
    /// exogenous values, with interval bounds at `level`.
    pub fn predict_with_intervals(
        &self,
        horizon: usize,
        future_exog: &[f64],
        level: f64,
    ) -> Result<Prediction> {
        let decomposition = self.decomposition.as_ref().ok_or(VeloError::FitRequired)?;
        let trend_model = self.trend_model.as_ref().ok_or(VeloError::FitRequired)?;
        if future_exog.len() != horizon {
            return Err(VeloError::DimensionMismatch {
                expected: horizon,
                got: future_exog.len(),
            });
        }
        let z = interval_z(level)?;

        let mut point = trend_model.forecast(horizon);
        for (idx, period) in decomposition.periods.iter().enumerate() {
            let projected = project_seasonal(&decomposition.seasonal[idx], *period, horizon);
            for (p, s) in point.iter_mut().zip(projected) {
                *p += s;
            }
        }
        for (p, &x) in point.iter_mut().zip(future_exog) {
            *p += self.exog_slope * x;
        }

        // Interval width grows mildly with the horizon.
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (h, &p) in point.iter().enumerate() {
            let width = z * self.residual_sd * (1.0 + 0.1 * h as f64).sqrt();
            lower.push(p - width);
            upper.push(p + width);
        }

        Ok(Prediction { point, lower, upper })
    }
}

fn interval_z(level: f64) -> Result<f64> {
    if !(0.0..1.0).contains(&level) {
        return Err(VeloError::InvalidParameter(format!(
            "interval level must be in (0, 1), got {level}"
        )));
    }
    Ok(quantile_normal((1.0 + level) / 2.0))
}

/// Repeat the last observed seasonal cycle over the horizon.
fn project_seasonal(seasonal: &[f64], period: usize, horizon: usize) -> Vec<f64> {
    let start = seasonal.len().saturating_sub(period);
    let last_cycle = &seasonal[start..];
    (0..horizon)
        .map(|h| last_cycle[h % last_cycle.len()])
        .collect()
}
