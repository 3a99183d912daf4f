//! Daily counter frame: a date-indexed table of named value columns.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VeloError};

/// Prefix shared by all counter value columns.
pub const COUNT_PREFIX: &str = "count_";

/// A daily-indexed frame of named `f64` columns.
///
/// The date index is strictly increasing. Constructors that accept
/// unordered or duplicated observations resolve duplicates by keeping
/// the last occurrence, matching the dedup policy used throughout the
/// pipeline. Missing values are represented as NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterFrame {
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    /// Column-major values: `columns[col][row]`.
    columns: Vec<Vec<f64>>,
}

impl CounterFrame {
    /// Create a frame from an already-ordered date index.
    ///
    /// Dates must be strictly increasing and every column must match the
    /// index length.
    pub fn new(dates: Vec<NaiveDate>, names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(VeloError::DateIndex(
                    "dates must be strictly increasing".to_string(),
                ));
            }
        }
        if names.len() != columns.len() {
            return Err(VeloError::DimensionMismatch {
                expected: names.len(),
                got: columns.len(),
            });
        }
        for column in &columns {
            if column.len() != dates.len() {
                return Err(VeloError::DimensionMismatch {
                    expected: dates.len(),
                    got: column.len(),
                });
            }
        }
        Ok(Self {
            dates,
            names,
            columns,
        })
    }

    /// Build a frame from row observations in arbitrary order.
    ///
    /// Duplicate dates are resolved by keeping the last occurrence.
    pub fn from_rows(names: Vec<String>, rows: Vec<(NaiveDate, Vec<f64>)>) -> Result<Self> {
        let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for (date, row) in rows {
            if row.len() != names.len() {
                return Err(VeloError::DimensionMismatch {
                    expected: names.len(),
                    got: row.len(),
                });
            }
            by_date.insert(date, row);
        }

        let dates: Vec<NaiveDate> = by_date.keys().copied().collect();
        let mut columns = vec![Vec::with_capacity(dates.len()); names.len()];
        for row in by_date.values() {
            for (col, &value) in row.iter().enumerate() {
                columns[col].push(value);
            }
        }
        Self::new(dates, names, columns)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Date index.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names of the counter value columns (those with the `count_` prefix).
    pub fn counter_names(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter(|n| n.starts_with(COUNT_PREFIX))
            .map(|n| n.as_str())
            .collect()
    }

    /// First date of the index, if any.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last date of the index, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Values of a column; fails naming the missing column.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.column_index(name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| VeloError::MissingColumn(name.to_string()))
    }

    /// Row position of a date, if present.
    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Single cell lookup.
    pub fn value(&self, date: NaiveDate, name: &str) -> Option<f64> {
        let row = self.date_index(date)?;
        let col = self.column_index(name)?;
        Some(self.columns[col][row])
    }

    /// Overwrite a single cell; fails if the date or column is absent.
    pub fn set_value(&mut self, date: NaiveDate, name: &str, value: f64) -> Result<()> {
        let row = self
            .date_index(date)
            .ok_or_else(|| VeloError::DateIndex(format!("date {date} not in index")))?;
        let col = self
            .column_index(name)
            .ok_or_else(|| VeloError::MissingColumn(name.to_string()))?;
        self.columns[col][row] = value;
        Ok(())
    }

    /// Add a column, replacing any existing column of the same name.
    pub fn set_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(VeloError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        match self.column_index(name) {
            Some(i) => self.columns[i] = values,
            None => {
                self.names.push(name.to_string());
                self.columns.push(values);
            }
        }
        Ok(())
    }

    /// Rename a column in place.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let i = self
            .column_index(from)
            .ok_or_else(|| VeloError::MissingColumn(from.to_string()))?;
        self.names[i] = to.to_string();
        Ok(())
    }

    /// New frame restricted to the given columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<CounterFrame> {
        let mut selected_names = Vec::with_capacity(names.len());
        let mut selected_columns = Vec::with_capacity(names.len());
        for &name in names {
            let i = self
                .column_index(name)
                .ok_or_else(|| VeloError::MissingColumn(name.to_string()))?;
            selected_names.push(self.names[i].clone());
            selected_columns.push(self.columns[i].clone());
        }
        CounterFrame::new(self.dates.clone(), selected_names, selected_columns)
    }

    /// New frame restricted to dates in `[start, end]` (inclusive).
    pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> CounterFrame {
        let from = self.dates.partition_point(|d| *d < start);
        let to = self.dates.partition_point(|d| *d <= end);
        CounterFrame {
            dates: self.dates[from..to].to_vec(),
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c[from..to].to_vec())
                .collect(),
        }
    }

    /// Append the rows of another frame with the same schema.
    ///
    /// All appended dates must come after the current last date.
    pub fn extend(&mut self, other: &CounterFrame) -> Result<()> {
        if other.names != self.names {
            return Err(VeloError::InvalidParameter(
                "cannot extend with a frame of different columns".to_string(),
            ));
        }
        if let (Some(last), Some(first)) = (self.last_date(), other.first_date()) {
            if first <= last {
                return Err(VeloError::DateIndex(format!(
                    "appended dates must start after {last}, got {first}"
                )));
            }
        }
        self.dates.extend_from_slice(&other.dates);
        for (col, values) in self.columns.iter_mut().zip(other.columns.iter()) {
            col.extend_from_slice(values);
        }
        Ok(())
    }

    /// Drop leading rows so that at most `days` trailing days remain.
    ///
    /// The retained span is `[last - days + 1, last]`.
    pub fn trim_trailing_days(&mut self, days: usize) {
        let Some(last) = self.last_date() else {
            return;
        };
        if days == 0 {
            return;
        }
        let min_date = last - chrono::Duration::days(days as i64 - 1);
        let from = self.dates.partition_point(|d| *d < min_date);
        if from > 0 {
            self.dates.drain(..from);
            for col in &mut self.columns {
                col.drain(..from);
            }
        }
    }

    /// Vertically concatenate frames with identical schemas, keeping the
    /// last value for any duplicate date.
    pub fn concat_keep_last(frames: &[CounterFrame]) -> Result<CounterFrame> {
        let first = frames.first().ok_or(VeloError::EmptyData)?;
        let names = first.names.clone();

        let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for frame in frames {
            if frame.names != names {
                return Err(VeloError::InvalidParameter(
                    "cannot concatenate frames with different columns".to_string(),
                ));
            }
            for (row, &date) in frame.dates.iter().enumerate() {
                let values: Vec<f64> = frame.columns.iter().map(|c| c[row]).collect();
                by_date.insert(date, values);
            }
        }

        let dates: Vec<NaiveDate> = by_date.keys().copied().collect();
        let mut columns = vec![Vec::with_capacity(dates.len()); names.len()];
        for row in by_date.values() {
            for (col, &value) in row.iter().enumerate() {
                columns[col].push(value);
            }
        }
        CounterFrame::new(dates, names, columns)
    }

    /// Horizontally join frames on the union of their date indexes.
    ///
    /// Cells absent from a frame become NaN. Column names must be
    /// pairwise distinct across the inputs.
    pub fn outer_join(frames: &[CounterFrame]) -> Result<CounterFrame> {
        if frames.is_empty() {
            return Err(VeloError::EmptyData);
        }

        let mut names: Vec<String> = Vec::new();
        for frame in frames {
            for name in &frame.names {
                if names.contains(name) {
                    return Err(VeloError::InvalidParameter(format!(
                        "duplicate column '{name}' in join"
                    )));
                }
                names.push(name.clone());
            }
        }

        let mut all_dates: Vec<NaiveDate> = frames
            .iter()
            .flat_map(|f| f.dates.iter().copied())
            .collect();
        all_dates.sort();
        all_dates.dedup();

        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(names.len());
        for frame in frames {
            for col in &frame.columns {
                let mut joined = Vec::with_capacity(all_dates.len());
                for &date in &all_dates {
                    match frame.date_index(date) {
                        Some(row) => joined.push(col[row]),
                        None => joined.push(f64::NAN),
                    }
                }
                columns.push(joined);
            }
        }
        CounterFrame::new(all_dates, names, columns)
    }
}
