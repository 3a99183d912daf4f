//! Replacement of zero-count days with prior same-weekday values.
//!
//! Counter outages show up as zero-count days and would otherwise be
//! flagged as anomalies. Each zero is patched with the most recent
//! non-zero value observed on the same weekday within a bounded number
//! of weeks back; zeros with no such donor are left untouched.

use chrono::Duration;

use crate::core::CounterFrame;

/// Default lookback bound, in whole weeks.
pub const DEFAULT_MAX_WEEKS_BACK: usize = 5;

/// Return a copy of the frame with zero values in every `count_` column
/// substituted from the same weekday up to `max_weeks_back` weeks
/// earlier. The input frame is not mutated.
pub fn fill_zero_gaps(frame: &CounterFrame, max_weeks_back: usize) -> CounterFrame {
    let mut filled = frame.clone();

    for name in frame.counter_names() {
        let values = frame.column(name).expect("iterating existing columns");
        for (row, &value) in values.iter().enumerate() {
            if value != 0.0 {
                continue;
            }
            let day = frame.dates()[row];
            for weeks_back in 1..=max_weeks_back {
                let prev_week = day - Duration::weeks(weeks_back as i64);
                match frame.value(prev_week, name) {
                    Some(prev_value) if prev_value != 0.0 => {
                        filled
                            .set_value(day, name, prev_value)
                            .expect("date and column exist in the copy");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    filled
}
