//! Single-window anomaly detection and correction.
//!
//! Fits the seasonal forecaster over a historical window, flags
//! observations outside the in-sample prediction interval, and rewrites
//! them with a clipped value.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::calendar::{exog_value, HolidayCalendar, EXOG_COLUMN};
use crate::core::{AnomalyRecord, CounterFrame};
use crate::error::{Result, VeloError};
use crate::models::{MstlForecaster, TrendMethod};
use crate::transform::{fill_zero_gaps, DEFAULT_MAX_WEEKS_BACK};

/// Interval level used for anomaly flagging.
pub const DEFAULT_INTERVAL_LEVEL: f64 = 0.997;

/// Options for one correction window.
#[derive(Debug, Clone)]
pub struct WindowOptions {
    /// First date of the fit window (inclusive).
    pub start: NaiveDate,
    /// Last date of the fit window (inclusive).
    pub end: NaiveDate,
    /// Name of the exogenous indicator column.
    pub exog_col: String,
    /// Seasonal periods for the decomposition.
    pub season_lengths: Vec<usize>,
    /// Two-sided interval level.
    pub level: f64,
    /// Zero-filler lookback bound, in weeks.
    pub max_weeks_back: usize,
    /// Trend forecasting method.
    pub trend_method: TrendMethod,
    /// Robust decomposition (downweights outlying remainders).
    pub robust: bool,
}

impl WindowOptions {
    /// Defaults: weekly seasonality, `exog` regressor, 99.7% interval.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            exog_col: EXOG_COLUMN.to_string(),
            season_lengths: vec![7],
            level: DEFAULT_INTERVAL_LEVEL,
            max_weeks_back: DEFAULT_MAX_WEEKS_BACK,
            trend_method: TrendMethod::default(),
            robust: true,
        }
    }

    pub fn with_exog_col(mut self, name: &str) -> Self {
        self.exog_col = name.to_string();
        self
    }

    pub fn with_season_lengths(mut self, periods: Vec<usize>) -> Self {
        self.season_lengths = periods;
        self
    }

    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn with_trend_method(mut self, method: TrendMethod) -> Self {
        self.trend_method = method;
        self
    }
}

/// One-step-ahead forecast emitted alongside the corrected window.
#[derive(Debug, Clone, PartialEq)]
pub struct NextDayForecast {
    pub date: NaiveDate,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Result of a single correction window.
#[derive(Debug, Clone)]
pub struct WindowCorrection {
    /// The zero-filled window with anomalous values rewritten.
    pub corrected: CounterFrame,
    /// Every out-of-interval observation not corrected in a prior call.
    pub anomalies: Vec<AnomalyRecord>,
    /// Dates overwritten by this call.
    pub newly_corrected: BTreeSet<NaiveDate>,
    /// Forecast for the day after the window.
    pub next_day: NextDayForecast,
}

/// Detect and correct anomalies of `counter` inside one window.
///
/// The counter and exogenous columns must exist in the frame; a missing
/// column is a configuration error raised before any fitting. Dates in
/// `previously_corrected` are never re-reported or re-corrected.
pub fn correct_window(
    frame: &CounterFrame,
    counter: &str,
    calendar: &HolidayCalendar,
    options: &WindowOptions,
    previously_corrected: &BTreeSet<NaiveDate>,
) -> Result<WindowCorrection> {
    if !frame.has_column(counter) {
        return Err(VeloError::MissingColumn(counter.to_string()));
    }
    if !frame.has_column(&options.exog_col) {
        return Err(VeloError::MissingColumn(options.exog_col.clone()));
    }

    let window = frame.slice_dates(options.start, options.end);
    if window.is_empty() {
        return Err(VeloError::EmptyData);
    }

    let mut corrected = fill_zero_gaps(&window, options.max_weeks_back);

    let values = corrected.column(counter)?.to_vec();
    let exog = corrected.column(&options.exog_col)?.to_vec();

    let mut model = MstlForecaster::new(options.season_lengths.clone())
        .with_trend_method(options.trend_method);
    if options.robust {
        model = model.robust();
    }
    model.fit(&values, &exog)?;

    let bands = model.fitted_with_intervals(options.level)?;

    let next_date = options.end + Duration::days(1);
    let future_exog = exog_value(calendar, next_date);
    let ahead = model.predict_with_intervals(1, &[future_exog], options.level)?;
    let next_day = NextDayForecast {
        date: next_date,
        value: ahead.point[0],
        lower: ahead.lower[0],
        upper: ahead.upper[0],
    };

    // Flag every observation outside its interval, except dates already
    // corrected by an earlier call.
    let dates = corrected.dates().to_vec();
    let mut anomalies = Vec::new();
    for (row, &date) in dates.iter().enumerate() {
        let observed = values[row];
        if observed >= bands.lower[row] && observed <= bands.upper[row] {
            continue;
        }
        if previously_corrected.contains(&date) {
            continue;
        }
        anomalies.push(AnomalyRecord {
            counter: counter.to_string(),
            date,
            observed,
            fitted: bands.point[row],
            lower: bands.lower[row],
            upper: bands.upper[row],
        });
    }

    // Rewrite flagged values in date order. The historical maximum is
    // taken from the live frame, so earlier corrections feed later ones.
    let mut newly_corrected = BTreeSet::new();
    for anomaly in &anomalies {
        let row = corrected
            .date_index(anomaly.date)
            .expect("anomaly dates come from the window index");
        if row == 0 {
            // No history strictly before the date; leave the value as is.
            continue;
        }
        let history = &corrected.column(counter)?[..row];
        let max_hist = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let replacement = if anomaly.observed > anomaly.upper {
            anomaly.upper.min(max_hist)
        } else {
            anomaly.lower
        };
        corrected.set_value(anomaly.date, counter, replacement)?;
        newly_corrected.insert(anomaly.date);
    }

    debug!(
        counter,
        window_start = %options.start,
        window_end = %options.end,
        anomalies = anomalies.len(),
        corrected = newly_corrected.len(),
        "correction window finished"
    );

    Ok(WindowCorrection {
        corrected,
        anomalies,
        newly_corrected,
        next_day,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::append_indicators;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 140 days of weekday/weekend structure driven by the exog flag,
    /// plus a mild 13-day oscillation so the interval has width.
    fn build_frame(n: usize) -> (CounterFrame, HolidayCalendar) {
        let first = date(2022, 1, 3);
        let dates: Vec<NaiveDate> = (0..n as i64).map(|i| first + Duration::days(i)).collect();
        let calendar = HolidayCalendar::covering(&dates);

        let values: Vec<f64> = dates
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                100.0
                    + 15.0 * exog_value(&calendar, d)
                    + 5.0 * (2.0 * std::f64::consts::PI * i as f64 / 13.0).sin()
            })
            .collect();

        let mut frame =
            CounterFrame::new(dates, vec!["count_8".to_string()], vec![values]).unwrap();
        append_indicators(&mut frame, &calendar).unwrap();
        (frame, calendar)
    }

    fn window_options(frame: &CounterFrame) -> WindowOptions {
        WindowOptions::new(frame.first_date().unwrap(), frame.last_date().unwrap())
    }

    #[test]
    fn missing_counter_column_fails_before_fitting() {
        let (frame, calendar) = build_frame(140);
        let options = window_options(&frame);
        let err = correct_window(&frame, "count_99", &calendar, &options, &BTreeSet::new())
            .unwrap_err();
        assert!(matches!(err, VeloError::MissingColumn(c) if c == "count_99"));
    }

    #[test]
    fn missing_exog_column_fails_before_fitting() {
        let (frame, calendar) = build_frame(140);
        let options = window_options(&frame).with_exog_col("no_such_flag");
        let err = correct_window(&frame, "count_8", &calendar, &options, &BTreeSet::new())
            .unwrap_err();
        assert!(matches!(err, VeloError::MissingColumn(c) if c == "no_such_flag"));
    }

    #[test]
    fn clean_window_reports_no_anomalies() {
        let (frame, calendar) = build_frame(140);
        let options = window_options(&frame);
        let result =
            correct_window(&frame, "count_8", &calendar, &options, &BTreeSet::new()).unwrap();

        assert!(result.anomalies.is_empty());
        assert!(result.newly_corrected.is_empty());
        assert_eq!(
            result.corrected.column("count_8").unwrap(),
            frame.column("count_8").unwrap()
        );
    }

    #[test]
    fn spike_is_corrected_with_clipped_value() {
        let (mut frame, calendar) = build_frame(140);
        let spike_date = date(2022, 1, 3) + Duration::days(100);
        let original = frame.value(spike_date, "count_8").unwrap();
        frame.set_value(spike_date, "count_8", 1000.0).unwrap();

        let options = window_options(&frame);
        let result =
            correct_window(&frame, "count_8", &calendar, &options, &BTreeSet::new()).unwrap();

        assert_eq!(result.anomalies.len(), 1);
        let record = &result.anomalies[0];
        assert_eq!(record.date, spike_date);
        assert_eq!(record.observed, 1000.0);
        assert!(record.is_above());

        assert!(result.newly_corrected.contains(&spike_date));
        let replaced = result.corrected.value(spike_date, "count_8").unwrap();
        // min(upper bound, historical max): well below the spike, above base.
        assert!(replaced < 1000.0);
        assert!(replaced > original - 50.0);
        assert!(replaced <= record.upper);
    }

    #[test]
    fn low_outlier_is_raised_to_lower_bound() {
        let (mut frame, calendar) = build_frame(140);
        let dip_date = date(2022, 1, 3) + Duration::days(100);
        frame.set_value(dip_date, "count_8", 2.0).unwrap();

        let options = window_options(&frame);
        let result =
            correct_window(&frame, "count_8", &calendar, &options, &BTreeSet::new()).unwrap();

        let record = result
            .anomalies
            .iter()
            .find(|a| a.date == dip_date)
            .expect("dip should be flagged");
        assert!(record.is_below());
        let replaced = result.corrected.value(dip_date, "count_8").unwrap();
        assert!((replaced - record.lower).abs() < 1e-9);
    }

    #[test]
    fn previously_corrected_dates_are_skipped() {
        let (mut frame, calendar) = build_frame(140);
        let spike_date = date(2022, 1, 3) + Duration::days(100);
        frame.set_value(spike_date, "count_8", 1000.0).unwrap();

        let mut already = BTreeSet::new();
        already.insert(spike_date);

        let options = window_options(&frame);
        let result = correct_window(&frame, "count_8", &calendar, &options, &already).unwrap();

        assert!(result.anomalies.iter().all(|a| a.date != spike_date));
        assert!(!result.newly_corrected.contains(&spike_date));
        // The observed spike value stays in place.
        assert_eq!(result.corrected.value(spike_date, "count_8"), Some(1000.0));
    }

    #[test]
    fn zero_days_are_filled_not_flagged() {
        let (mut frame, calendar) = build_frame(140);
        let gap_date = date(2022, 1, 3) + Duration::days(70);
        let donor = frame
            .value(gap_date - Duration::weeks(1), "count_8")
            .unwrap();
        frame.set_value(gap_date, "count_8", 0.0).unwrap();

        let options = window_options(&frame);
        let result =
            correct_window(&frame, "count_8", &calendar, &options, &BTreeSet::new()).unwrap();

        assert_eq!(result.corrected.value(gap_date, "count_8"), Some(donor));
        assert!(result.anomalies.iter().all(|a| a.date != gap_date));
    }

    #[test]
    fn next_day_forecast_advances_one_day() {
        let (frame, calendar) = build_frame(140);
        let options = window_options(&frame);
        let result =
            correct_window(&frame, "count_8", &calendar, &options, &BTreeSet::new()).unwrap();

        assert_eq!(
            result.next_day.date,
            frame.last_date().unwrap() + Duration::days(1)
        );
        assert!(result.next_day.lower < result.next_day.value);
        assert!(result.next_day.upper > result.next_day.value);
    }
}
