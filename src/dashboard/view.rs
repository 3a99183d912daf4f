//! Filtered views of a counter's series for the dashboard charts.

use chrono::{Datelike, NaiveDate};

use crate::core::{CounterFrame, COUNT_PREFIX};
use crate::error::{Result, VeloError};
use crate::utils::{mean, quantile};

use super::Season;

/// Weekday labels, Monday first.
pub const WEEKDAY_LABELS: [&str; 7] = [
    "Segunda", "Terça", "Quarta", "Quinta", "Sexta", "Sábado", "Domingo",
];

/// Month labels, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
    "Outubro", "Novembro", "Dezembro",
];

/// Counter identifiers available for selection, derived from the
/// `count_<id>` columns.
pub fn counter_ids(frame: &CounterFrame) -> Vec<String> {
    frame
        .counter_names()
        .iter()
        .map(|name| name.trim_start_matches(COUNT_PREFIX).to_string())
        .collect()
}

/// Independent chart toggles; each requested piece is computed on its
/// own.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartToggles {
    pub line: bool,
    pub by_weekday: bool,
    pub by_month: bool,
    pub by_season: bool,
}

impl ChartToggles {
    pub fn all() -> Self {
        Self {
            line: true,
            by_weekday: true,
            by_month: true,
            by_season: true,
        }
    }
}

/// Five-number summary plus mean, as rendered on a boxplot.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxplotStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl BoxplotStats {
    /// Summary of the finite values; `None` when there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        Some(Self {
            min: quantile(&finite, 0.0),
            q1: quantile(&finite, 0.25),
            median: quantile(&finite, 0.5),
            q3: quantile(&finite, 0.75),
            max: quantile(&finite, 1.0),
            mean: mean(&finite),
        })
    }
}

/// One labeled boxplot group.
#[derive(Debug, Clone)]
pub struct BoxplotGroup {
    pub label: String,
    pub values: Vec<f64>,
    pub stats: BoxplotStats,
}

/// A counter's daily line series over the filtered range.
#[derive(Debug, Clone)]
pub struct LineSeries {
    pub label: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

/// All requested chart data for one counter and date range.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub counter: String,
    pub line: Option<LineSeries>,
    pub by_weekday: Option<Vec<BoxplotGroup>>,
    pub by_month: Option<Vec<BoxplotGroup>>,
    pub by_season: Option<Vec<BoxplotGroup>>,
}

/// Build the view for one counter over `[start, end]`.
///
/// `counter_id` is the bare identifier (the part after `count_`).
pub fn build_view(
    frame: &CounterFrame,
    counter_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    toggles: ChartToggles,
) -> Result<DashboardView> {
    let column = format!("{COUNT_PREFIX}{counter_id}");
    if !frame.has_column(&column) {
        return Err(VeloError::MissingColumn(column));
    }

    let filtered = frame.slice_dates(start, end);
    let values = filtered.column(&column)?;
    let dates = filtered.dates();

    let line = toggles.line.then(|| {
        let mut line_dates = Vec::new();
        let mut line_values = Vec::new();
        for (&date, &value) in dates.iter().zip(values) {
            if value.is_finite() {
                line_dates.push(date);
                line_values.push(value);
            }
        }
        LineSeries {
            label: format!("Contador {counter_id}"),
            dates: line_dates,
            values: line_values,
        }
    });

    let by_weekday = toggles.by_weekday.then(|| {
        group_by(dates, values, |date| {
            date.weekday().num_days_from_monday() as usize
        })
        .into_iter()
        .map(|(key, group)| make_group(WEEKDAY_LABELS[key], group))
        .collect()
    });

    let by_month = toggles.by_month.then(|| {
        group_by(dates, values, |date| date.month() as usize - 1)
            .into_iter()
            .map(|(key, group)| make_group(MONTH_LABELS[key], group))
            .collect()
    });

    let by_season = toggles.by_season.then(|| {
        group_by(dates, values, |date| {
            Season::ALL
                .iter()
                .position(|s| *s == Season::from_month(date.month()))
                .expect("every month maps to a season")
        })
        .into_iter()
        .map(|(key, group)| make_group(Season::ALL[key].label(), group))
        .collect()
    });

    Ok(DashboardView {
        counter: counter_id.to_string(),
        line,
        by_weekday,
        by_month,
        by_season,
    })
}

/// Partition finite values into ordered, non-empty keyed groups.
fn group_by(
    dates: &[NaiveDate],
    values: &[f64],
    key: impl Fn(NaiveDate) -> usize,
) -> Vec<(usize, Vec<f64>)> {
    let mut buckets: std::collections::BTreeMap<usize, Vec<f64>> = Default::default();
    for (&date, &value) in dates.iter().zip(values) {
        if value.is_finite() {
            buckets.entry(key(date)).or_default().push(value);
        }
    }
    buckets.into_iter().collect()
}

fn make_group(label: &str, values: Vec<f64>) -> BoxplotGroup {
    let stats = BoxplotStats::from_values(&values).expect("groups are non-empty");
    BoxplotGroup {
        label: label.to_string(),
        values,
        stats,
    }
}
