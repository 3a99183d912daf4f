//! Exogenous indicator columns derived from the calendar.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::core::CounterFrame;
use crate::error::Result;

use super::HolidayCalendar;

/// Name of the holiday indicator column.
pub const HOLIDAY_COLUMN: &str = "holiday";
/// Name of the weekend indicator column.
pub const WEEKEND_COLUMN: &str = "weekend";
/// Name of the combined holiday-or-weekend indicator column.
pub const EXOG_COLUMN: &str = "exog";

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Indicator value for a single date: 1.0 when the date is a holiday or
/// falls on a weekend, 0.0 otherwise.
pub fn exog_value(calendar: &HolidayCalendar, date: NaiveDate) -> f64 {
    if calendar.is_holiday(date) || is_weekend(date) {
        1.0
    } else {
        0.0
    }
}

/// Append `holiday`, `weekend` and `exog` columns to the frame.
///
/// The columns are a pure function of the date index; existing columns
/// of the same names are replaced.
pub fn append_indicators(frame: &mut CounterFrame, calendar: &HolidayCalendar) -> Result<()> {
    let holiday: Vec<f64> = frame
        .dates()
        .iter()
        .map(|&d| if calendar.is_holiday(d) { 1.0 } else { 0.0 })
        .collect();
    let weekend: Vec<f64> = frame
        .dates()
        .iter()
        .map(|&d| if is_weekend(d) { 1.0 } else { 0.0 })
        .collect();
    let exog: Vec<f64> = holiday
        .iter()
        .zip(weekend.iter())
        .map(|(&h, &w)| if h == 1.0 || w == 1.0 { 1.0 } else { 0.0 })
        .collect();

    frame.set_column(HOLIDAY_COLUMN, holiday)?;
    frame.set_column(WEEKEND_COLUMN, weekend)?;
    frame.set_column(EXOG_COLUMN, exog)?;
    Ok(())
}
