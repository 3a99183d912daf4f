//! STL: seasonal-trend decomposition using LOESS.
//!
//! Additive decomposition of a series into trend, one seasonal
//! component, and a remainder, following Cleveland et al. (1990) with a
//! weighted-mean LOESS simplification.

/// Components of an STL decomposition. Always satisfies
/// `series = trend + seasonal + remainder` element-wise.
#[derive(Debug, Clone)]
pub struct StlDecomposition {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub remainder: Vec<f64>,
}

/// STL configuration and algorithm for a single seasonal period.
#[derive(Debug, Clone)]
pub struct Stl {
    period: usize,
    seasonal_span: usize,
    trend_span: usize,
    low_pass_span: usize,
    inner_iterations: usize,
    outer_iterations: usize,
}

fn to_odd(n: usize) -> usize {
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

impl Stl {
    /// STL with default spans derived from the period.
    pub fn new(period: usize) -> Self {
        let period = period.max(2);
        let trend_span =
            (1.5 * period as f64 / (1.0 - 1.5 / period as f64)).ceil() as usize;
        Self {
            period,
            seasonal_span: to_odd(period),
            trend_span: to_odd(trend_span),
            low_pass_span: to_odd(period),
            inner_iterations: 2,
            outer_iterations: 0,
        }
    }

    /// Enable robustness iterations (downweights outlying remainders).
    pub fn robust(mut self) -> Self {
        self.outer_iterations = 6;
        self
    }

    /// Override the seasonal smoothing span.
    pub fn with_seasonal_span(mut self, span: usize) -> Self {
        self.seasonal_span = to_odd(span);
        self
    }

    /// Override the trend smoothing span.
    pub fn with_trend_span(mut self, span: usize) -> Self {
        self.trend_span = to_odd(span);
        self
    }

    /// Override the number of inner iterations.
    pub fn with_inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = n.max(1);
        self
    }

    /// Seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Decompose the series. Returns `None` when the series is shorter
    /// than two full periods.
    pub fn decompose(&self, series: &[f64]) -> Option<StlDecomposition> {
        let n = series.len();
        if n < 2 * self.period {
            return None;
        }

        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];
        let mut robustness = vec![1.0; n];

        let outer = self.outer_iterations.max(1);
        for outer_pass in 0..outer {
            for _ in 0..self.inner_iterations {
                // Detrend, then smooth each cycle-subseries.
                let detrended: Vec<f64> =
                    series.iter().zip(&trend).map(|(y, t)| y - t).collect();
                let cycle = self.smooth_subseries(&detrended, &robustness);

                // Remove low-frequency leakage from the seasonal estimate.
                let low_pass = self.low_pass(&cycle, &robustness);
                for i in 0..n {
                    seasonal[i] = cycle[i] - low_pass[i];
                }

                // Deseasonalize and smooth for the trend.
                let deseasonalized: Vec<f64> =
                    series.iter().zip(&seasonal).map(|(y, s)| y - s).collect();
                trend = tricube_smooth(&deseasonalized, self.trend_span, &robustness);
            }

            if outer_pass + 1 < outer {
                let remainder: Vec<f64> = (0..n)
                    .map(|i| series[i] - seasonal[i] - trend[i])
                    .collect();
                robustness = bisquare_weights(&remainder);
            }
        }

        let remainder: Vec<f64> = (0..n)
            .map(|i| series[i] - seasonal[i] - trend[i])
            .collect();

        Some(StlDecomposition {
            trend,
            seasonal,
            remainder,
        })
    }

    /// Smooth each cycle-subseries (same position within the period)
    /// independently and reassemble.
    fn smooth_subseries(&self, detrended: &[f64], robustness: &[f64]) -> Vec<f64> {
        let n = detrended.len();
        let mut result = vec![0.0; n];

        for offset in 0..self.period {
            let indices: Vec<usize> = (offset..n).step_by(self.period).collect();
            let values: Vec<f64> = indices.iter().map(|&i| detrended[i]).collect();
            let weights: Vec<f64> = indices.iter().map(|&i| robustness[i]).collect();

            let smoothed = tricube_smooth(&values, self.seasonal_span, &weights);
            for (&i, &v) in indices.iter().zip(&smoothed) {
                result[i] = v;
            }
        }

        result
    }

    /// Low-pass filter: three moving averages followed by a LOESS pass.
    fn low_pass(&self, series: &[f64], robustness: &[f64]) -> Vec<f64> {
        let ma = moving_average(series, self.period);
        let ma = moving_average(&ma, self.period);
        let ma = moving_average(&ma, 3);
        tricube_smooth(&ma, self.low_pass_span, robustness)
    }
}

/// Centered moving average with shrinking windows at the edges.
fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let half = window / 2;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            series[start..end].iter().sum::<f64>() / (end - start) as f64
        })
        .collect()
}

/// Weighted local smoothing with tricube distance weights, the
/// weighted-mean form of LOESS.
fn tricube_smooth(values: &[f64], span: usize, weights: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let half = span / 2;

    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            let max_dist = half as f64 + 1.0;

            let mut weight_sum = 0.0;
            let mut value_sum = 0.0;
            for j in start..end {
                let u = (i as f64 - j as f64).abs() / max_dist;
                let tricube = if u < 1.0 { (1.0 - u.powi(3)).powi(3) } else { 0.0 };
                let w = tricube * weights[j];
                weight_sum += w;
                value_sum += w * values[j];
            }

            if weight_sum > 0.0 {
                value_sum / weight_sum
            } else {
                values[i]
            }
        })
        .collect()
}

/// Bisquare robustness weights from the remainder's median absolute value.
fn bisquare_weights(remainder: &[f64]) -> Vec<f64> {
    let mut abs_remainder: Vec<f64> = remainder.iter().map(|r| r.abs()).collect();
    abs_remainder.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = abs_remainder.len();
    let median = if n % 2 == 0 {
        (abs_remainder[n / 2 - 1] + abs_remainder[n / 2]) / 2.0
    } else {
        abs_remainder[n / 2]
    };

    let cutoff = 6.0 * median;
    remainder
        .iter()
        .map(|r| {
            if cutoff < 1e-10 {
                return 1.0;
            }
            let u = r.abs() / cutoff;
            if u < 1.0 {
                (1.0 - u * u).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}
