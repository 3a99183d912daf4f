//! Calendar rules: Portuguese holidays and exogenous indicator columns.

mod features;
mod holidays;

pub use features::{append_indicators, exog_value, EXOG_COLUMN, HOLIDAY_COLUMN, WEEKEND_COLUMN};
pub use holidays::{easter_sunday, portuguese_holidays, HolidayCalendar};
