//! MSTL: iterated STL over multiple seasonal periods.
//!
//! For daily counter data the default configuration is a single weekly
//! period, but the decomposition accepts any sorted set of periods
//! (e.g. `[7, 365]` for weekly plus yearly patterns).

use super::stl::Stl;

/// Result of an MSTL decomposition.
#[derive(Debug, Clone)]
pub struct MstlDecomposition {
    /// Trend component.
    pub trend: Vec<f64>,
    /// One seasonal component per period, in period order.
    pub seasonal: Vec<Vec<f64>>,
    /// Periods corresponding to the seasonal components.
    pub periods: Vec<usize>,
    /// Remainder component.
    pub remainder: Vec<f64>,
}

impl MstlDecomposition {
    /// Element-wise sum of all seasonal components.
    pub fn total_seasonal(&self) -> Vec<f64> {
        let n = self.trend.len();
        let mut total = vec![0.0; n];
        for component in &self.seasonal {
            for (t, &s) in total.iter_mut().zip(component) {
                *t += s;
            }
        }
        total
    }

    /// Trend plus remainder: the series with all seasonality removed.
    pub fn deseasonalized(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(&self.remainder)
            .map(|(t, r)| t + r)
            .collect()
    }
}

/// MSTL decomposer for one or more seasonal periods.
#[derive(Debug, Clone)]
pub struct Mstl {
    periods: Vec<usize>,
    iterations: usize,
    robust: bool,
}

impl Mstl {
    /// Decomposer for the given periods (sorted and deduplicated).
    pub fn new(periods: Vec<usize>) -> Self {
        let mut periods = periods;
        periods.sort_unstable();
        periods.dedup();
        Self {
            periods,
            iterations: 2,
            robust: false,
        }
    }

    /// Weekly decomposer for daily data.
    pub fn weekly() -> Self {
        Self::new(vec![7])
    }

    /// Set the number of refinement iterations.
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n.max(1);
        self
    }

    /// Enable robust STL fitting.
    pub fn robust(mut self) -> Self {
        self.robust = true;
        self
    }

    /// The configured periods.
    pub fn periods(&self) -> &[usize] {
        &self.periods
    }

    fn stl_for(&self, period: usize) -> Stl {
        if self.robust {
            Stl::new(period).robust()
        } else {
            Stl::new(period)
        }
    }

    /// Decompose the series. Returns `None` when no periods are
    /// configured or the series is shorter than twice the longest one.
    pub fn decompose(&self, series: &[f64]) -> Option<MstlDecomposition> {
        let n = series.len();
        let max_period = *self.periods.last()?;
        if n < 2 * max_period {
            return None;
        }

        let mut seasonal: Vec<Vec<f64>> = vec![vec![0.0; n]; self.periods.len()];
        let mut trend = vec![0.0; n];

        for _ in 0..self.iterations {
            // Trend from the series with all current seasonal estimates removed.
            let mut deseasonalized = series.to_vec();
            for component in &seasonal {
                for (d, &s) in deseasonalized.iter_mut().zip(component) {
                    *d -= s;
                }
            }
            if let Some(result) = self.stl_for(max_period).decompose(&deseasonalized) {
                trend = result.trend;
            }

            // Re-estimate each seasonal component against the others.
            for idx in 0..self.periods.len() {
                let mut adjusted = series.to_vec();
                for (i, value) in adjusted.iter_mut().enumerate() {
                    *value -= trend[i];
                    for (other, component) in seasonal.iter().enumerate() {
                        if other != idx {
                            *value -= component[i];
                        }
                    }
                }
                if let Some(result) = self.stl_for(self.periods[idx]).decompose(&adjusted) {
                    seasonal[idx] = result.seasonal;
                }
            }
        }

        let mut remainder = series.to_vec();
        for (i, value) in remainder.iter_mut().enumerate() {
            *value -= trend[i];
            for component in &seasonal {
                *value -= component[i];
            }
        }

        Some(MstlDecomposition {
            trend,
            seasonal,
            periods: self.periods.clone(),
            remainder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_period_series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                50.0 + 0.05 * t
                    + 10.0 * (2.0 * std::f64::consts::PI * t / 7.0).sin()
                    + 4.0 * (2.0 * std::f64::consts::PI * t / 30.0).sin()
            })
            .collect()
    }

    #[test]
    fn periods_are_sorted_and_deduplicated() {
        let mstl = Mstl::new(vec![30, 7, 7]);
        assert_eq!(mstl.periods(), &[7, 30]);
    }

    #[test]
    fn weekly_default() {
        assert_eq!(Mstl::weekly().periods(), &[7]);
    }

    #[test]
    fn decomposition_is_additive() {
        let series = two_period_series(240);
        let result = Mstl::new(vec![7, 30]).decompose(&series).unwrap();

        assert_eq!(result.seasonal.len(), 2);
        for i in 0..series.len() {
            let reconstructed = result.trend[i]
                + result.seasonal[0][i]
                + result.seasonal[1][i]
                + result.remainder[i];
            assert!(
                (series[i] - reconstructed).abs() < 1e-9,
                "reconstruction failed at {i}"
            );
        }
    }

    #[test]
    fn total_seasonal_sums_components() {
        let series = two_period_series(240);
        let result = Mstl::new(vec![7, 30]).decompose(&series).unwrap();
        let total = result.total_seasonal();
        for i in 0..series.len() {
            let expected = result.seasonal[0][i] + result.seasonal[1][i];
            assert!((total[i] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn deseasonalized_is_trend_plus_remainder() {
        let series = two_period_series(120);
        let result = Mstl::weekly().decompose(&series).unwrap();
        let deseasonalized = result.deseasonalized();
        for i in 0..series.len() {
            assert!((deseasonalized[i] - result.trend[i] - result.remainder[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn short_series_is_rejected() {
        let series = two_period_series(50);
        assert!(Mstl::new(vec![7, 30]).decompose(&series).is_none());
        assert!(Mstl::new(vec![]).decompose(&series).is_none());
    }

    #[test]
    fn robust_decomposition_with_outliers() {
        let mut series = two_period_series(240);
        series[100] = 5000.0;
        let result = Mstl::weekly().robust().decompose(&series).unwrap();
        assert!(result.remainder[100] > 1000.0);
    }
}
