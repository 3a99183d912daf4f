//! Statistical utility functions.

/// Approximate quantile function for the standard normal distribution.
///
/// Uses the Abramowitz and Stegun approximation (formula 26.2.23).
///
/// # Example
/// ```
/// use velostat::utils::quantile_normal;
///
/// // 99.7% two-sided level -> z close to 3
/// let z = quantile_normal((1.0 + 0.997) / 2.0);
/// assert!((z - 2.97).abs() < 0.05);
/// ```
pub fn quantile_normal(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let t = if p < 0.5 {
        (-2.0 * p.ln()).sqrt()
    } else {
        (-2.0 * (1.0 - p).ln()).sqrt()
    };

    // Abramowitz and Stegun coefficients
    let c0 = 2.515517;
    let c1 = 0.802853;
    let c2 = 0.010328;
    let d1 = 1.432788;
    let d2 = 0.189269;
    let d3 = 0.001308;

    let result = t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t);

    if p < 0.5 {
        -result
    } else {
        result
    }
}

/// Mean of a slice; NaN when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n-1 denominator); NaN for fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Median of a slice; NaN when empty.
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Linearly interpolated quantile of a slice; NaN when empty.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

/// Simple least-squares regression of `y` on `x`.
///
/// Returns `(intercept, slope)`. A degenerate regressor (zero variance)
/// yields a zero slope with the mean of `y` as intercept.
pub fn linear_fit(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    if n == 0 {
        return (0.0, 0.0);
    }

    let x_mean = mean(&x[..n]);
    let y_mean = mean(&y[..n]);

    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    for i in 0..n {
        ss_xx += (x[i] - x_mean).powi(2);
        ss_xy += (x[i] - x_mean) * (y[i] - y_mean);
    }

    let slope = if ss_xx > 1e-12 { ss_xy / ss_xx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    (intercept, slope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_normal_known_values() {
        assert_relative_eq!(quantile_normal(0.5), 0.0, epsilon = 1e-3);
        assert!((quantile_normal(0.975) - 1.96).abs() < 0.01);
        assert!((quantile_normal(0.9985) - 2.97).abs() < 0.05);
        assert!(quantile_normal(0.0).is_infinite());
        assert!(quantile_normal(1.0).is_infinite());
    }

    #[test]
    fn quantile_normal_is_symmetric() {
        for p in [0.6, 0.8, 0.95, 0.99] {
            assert_relative_eq!(quantile_normal(p), -quantile_normal(1.0 - p), epsilon = 1e-9);
        }
    }

    #[test]
    fn basic_moments() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(variance(&values), 32.0 / 7.0, epsilon = 1e-12);
        assert!(mean(&[]).is_nan());
        assert!(variance(&[1.0]).is_nan());
    }

    #[test]
    fn median_and_quantiles() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_relative_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.25), 1.75);
        assert_relative_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 1.0), 4.0);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn linear_fit_recovers_line() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let (intercept, slope) = linear_fit(&x, &y);
        assert_relative_eq!(intercept, 3.0, epsilon = 1e-9);
        assert_relative_eq!(slope, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn linear_fit_degenerate_regressor() {
        let x = [1.0; 10];
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let (intercept, slope) = linear_fit(&x, &y);
        assert_relative_eq!(slope, 0.0);
        assert_relative_eq!(intercept, 4.5);
    }
}
