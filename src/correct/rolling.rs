//! Rolling-window driver for anomaly correction.
//!
//! Advances a trailing history window one week at a time over the full
//! series, re-running the correction step on each advance. State is
//! threaded explicitly: every step consumes a [`RollingState`] and
//! returns the next one, so there is no shared mutable accumulator.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::calendar::{HolidayCalendar, EXOG_COLUMN};
use crate::core::{AnomalyRecord, CounterFrame};
use crate::error::{Result, VeloError};
use crate::models::TrendMethod;
use crate::transform::DEFAULT_MAX_WEEKS_BACK;

use super::window::{correct_window, WindowOptions, DEFAULT_INTERVAL_LEVEL};

/// Default trailing window length, in weeks.
pub const DEFAULT_WINDOW_WEEKS: usize = 52;

/// Options shared by every iteration of a rolling run.
#[derive(Debug, Clone)]
pub struct RollingOptions {
    /// Trailing window cap, in weeks.
    pub window_weeks: usize,
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
    /// Robust decomposition inside each window.
    pub robust: bool,
}

impl Default for RollingOptions {
    fn default() -> Self {
        Self {
            window_weeks: DEFAULT_WINDOW_WEEKS,
            exog_col: EXOG_COLUMN.to_string(),
            season_lengths: vec![7],
            level: DEFAULT_INTERVAL_LEVEL,
            max_weeks_back: DEFAULT_MAX_WEEKS_BACK,
            trend_method: TrendMethod::default(),
            robust: true,
        }
    }
}

impl RollingOptions {
    pub fn with_window_weeks(mut self, weeks: usize) -> Self {
        self.window_weeks = weeks;
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

    fn window_options(&self, start: NaiveDate, end: NaiveDate) -> WindowOptions {
        let mut options = WindowOptions::new(start, end)
            .with_exog_col(&self.exog_col)
            .with_season_lengths(self.season_lengths.clone())
            .with_level(self.level)
            .with_trend_method(self.trend_method);
        options.max_weeks_back = self.max_weeks_back;
        options.robust = self.robust;
        options
    }
}

/// Phase of the driver: more weeks available, or exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    Active,
    Done,
}

/// Accumulated state of a rolling run, returned by each step.
#[derive(Debug, Clone)]
pub struct RollingState {
    /// Corrected trailing history, capped at the window length.
    history: CounterFrame,
    /// Every date overwritten so far. Grows for the whole run, even as
    /// the history window trims.
    corrected_dates: BTreeSet<NaiveDate>,
    /// Corrected frame of each iteration, in order.
    frames: Vec<CounterFrame>,
    /// Anomaly records surviving the duplicate-date filter.
    anomalies: Vec<AnomalyRecord>,
    /// Number of week advances performed.
    weeks_added: usize,
    phase: DriverPhase,
}

impl RollingState {
    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    pub fn history(&self) -> &CounterFrame {
        &self.history
    }

    pub fn corrected_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.corrected_dates
    }

    /// Corrected frame of each iteration so far, in order.
    pub fn frames(&self) -> &[CounterFrame] {
        &self.frames
    }

    pub fn anomalies(&self) -> &[AnomalyRecord] {
        &self.anomalies
    }

    pub fn weeks_added(&self) -> usize {
        self.weeks_added
    }
}

/// Final result of a rolling run.
#[derive(Debug, Clone)]
pub struct RollingOutcome {
    /// All per-iteration frames concatenated, keeping the last value
    /// for any duplicate date.
    pub corrected: CounterFrame,
    /// All surviving anomaly records, in iteration order.
    pub anomalies: Vec<AnomalyRecord>,
    /// Every date that was overwritten during the run.
    pub corrected_dates: BTreeSet<NaiveDate>,
    /// Number of week advances performed.
    pub weeks_added: usize,
}

/// Drives the correction step over a full series, one counter at a time.
pub struct RollingDriver<'a> {
    frame: &'a CounterFrame,
    counter: &'a str,
    calendar: &'a HolidayCalendar,
    options: RollingOptions,
}

impl<'a> RollingDriver<'a> {
    /// Driver over the full frame for one counter column. The frame
    /// must already carry the exogenous indicator column.
    pub fn new(
        frame: &'a CounterFrame,
        counter: &'a str,
        calendar: &'a HolidayCalendar,
        options: RollingOptions,
    ) -> Self {
        Self {
            frame,
            counter,
            calendar,
            options,
        }
    }

    /// Run the initial window `[start, initial_end]`.
    pub fn start(&self, start: NaiveDate, initial_end: NaiveDate) -> Result<RollingState> {
        let window_options = self.options.window_options(start, initial_end);
        let correction = correct_window(
            self.frame,
            self.counter,
            self.calendar,
            &window_options,
            &BTreeSet::new(),
        )?;

        Ok(RollingState {
            history: correction.corrected.clone(),
            corrected_dates: correction.newly_corrected.clone(),
            frames: vec![correction.corrected],
            anomalies: correction.anomalies,
            weeks_added: 0,
            phase: DriverPhase::Active,
        })
    }

    /// Advance the window by one week and re-run the correction step.
    ///
    /// Consumes the state and returns the successor. When no data
    /// exists past the current history, the phase flips to `Done` and
    /// the state is otherwise unchanged.
    pub fn step(&self, state: RollingState) -> Result<RollingState> {
        if state.phase == DriverPhase::Done {
            return Ok(state);
        }

        let last = state
            .history
            .last_date()
            .ok_or(VeloError::EmptyData)?;
        let next_start = last + Duration::days(1);
        let next_end = last + Duration::days(7);

        let next_block = self.frame.slice_dates(next_start, next_end);
        if next_block.is_empty() {
            info!(counter = self.counter, "no more weeks to add");
            return Ok(RollingState {
                phase: DriverPhase::Done,
                ..state
            });
        }

        let mut history = state.history;
        history.extend(&next_block)?;
        history.trim_trailing_days(self.options.window_weeks * 7);

        let window_start = history.first_date().ok_or(VeloError::EmptyData)?;
        let window_end = history.last_date().ok_or(VeloError::EmptyData)?;
        let window_options = self.options.window_options(window_start, window_end);

        let correction = correct_window(
            &history,
            self.counter,
            self.calendar,
            &window_options,
            &state.corrected_dates,
        )?;

        // Anomalies for dates corrected in earlier iterations are
        // duplicates from overlapping windows; drop them.
        let mut new_anomalies = correction.anomalies;
        new_anomalies.retain(|a| !state.corrected_dates.contains(&a.date));

        let mut corrected_dates = state.corrected_dates;
        corrected_dates.extend(correction.newly_corrected.iter().copied());

        let mut frames = state.frames;
        frames.push(correction.corrected.clone());
        let mut anomalies = state.anomalies;
        anomalies.extend(new_anomalies);

        debug!(
            counter = self.counter,
            week = state.weeks_added + 1,
            window_end = %window_end,
            "rolling window advanced"
        );

        Ok(RollingState {
            history: correction.corrected,
            corrected_dates,
            frames,
            anomalies,
            weeks_added: state.weeks_added + 1,
            phase: DriverPhase::Active,
        })
    }

    /// Concatenate the per-iteration frames of a finished (or running)
    /// state into the final outcome.
    pub fn finish(&self, state: RollingState) -> Result<RollingOutcome> {
        let corrected = CounterFrame::concat_keep_last(&state.frames)?;
        Ok(RollingOutcome {
            corrected,
            anomalies: state.anomalies,
            corrected_dates: state.corrected_dates,
            weeks_added: state.weeks_added,
        })
    }

    /// Run the driver to exhaustion: initial window, then one week at a
    /// time until no further data exists.
    pub fn run(&self, start: NaiveDate, initial_end: NaiveDate) -> Result<RollingOutcome> {
        let mut state = self.start(start, initial_end)?;
        while state.phase == DriverPhase::Active {
            state = self.step(state)?;
        }
        self.finish(state)
    }
}
