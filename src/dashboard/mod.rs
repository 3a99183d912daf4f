//! Data preparation for the exploration dashboard.
//!
//! The crate does not render charts; it prepares the selector values,
//! filtered line series, and boxplot groupings a front end binds to.

mod season;
mod view;

pub use season::Season;
pub use view::{
    build_view, counter_ids, BoxplotGroup, BoxplotStats, ChartToggles, DashboardView, LineSeries,
    MONTH_LABELS, WEEKDAY_LABELS,
};
