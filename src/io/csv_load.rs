//! CSV loaders for the count series and the counter-location table.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::info;

use crate::core::CounterFrame;
use crate::error::{Result, VeloError};

/// Name of the timestamp column in the count CSV.
pub const TIMESTAMP_COLUMN: &str = "detected";

/// One row of the counter-location table. Only the identifier is
/// required; the remaining fields are optional descriptive data.
#[derive(Debug, Clone, Deserialize)]
pub struct CounterLocation {
    #[serde(alias = "locationId", alias = "location_id")]
    pub id: String,
    #[serde(alias = "local", default)]
    pub name: Option<String>,
    #[serde(alias = "lat", default)]
    pub latitude: Option<f64>,
    #[serde(alias = "lon", default)]
    pub longitude: Option<f64>,
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).expect("midnight is valid"));
    }
    Err(VeloError::Csv(format!("unparseable timestamp '{raw}'")))
}

/// Load the count series keyed by the `detected` timestamp column.
///
/// Duplicate timestamps keep the last occurrence; sub-daily
/// observations are resampled into daily sums. Empty cells contribute
/// nothing to their day.
pub fn load_counts(path: impl AsRef<Path>) -> Result<CounterFrame> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = reader.headers()?.clone();
    let ts_index = headers
        .iter()
        .position(|h| h == TIMESTAMP_COLUMN)
        .ok_or_else(|| VeloError::Csv(format!("missing '{TIMESTAMP_COLUMN}' column")))?;
    let names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != ts_index)
        .map(|(_, h)| h.to_string())
        .collect();

    // Keep the last occurrence of each timestamp.
    let mut by_timestamp: BTreeMap<NaiveDateTime, Vec<f64>> = BTreeMap::new();
    for record in reader.records() {
        let record = record?;
        let raw_ts = record
            .get(ts_index)
            .ok_or_else(|| VeloError::Csv("short record".to_string()))?;
        let timestamp = parse_timestamp(raw_ts)?;

        let mut row = Vec::with_capacity(names.len());
        for (i, field) in record.iter().enumerate() {
            if i == ts_index {
                continue;
            }
            if field.is_empty() {
                row.push(f64::NAN);
            } else {
                let value: f64 = field
                    .parse()
                    .map_err(|_| VeloError::Csv(format!("unparseable value '{field}'")))?;
                row.push(value);
            }
        }
        by_timestamp.insert(timestamp, row);
    }

    if by_timestamp.is_empty() {
        return Err(VeloError::EmptyData);
    }

    // Resample to daily sums; missing cells contribute nothing.
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for (timestamp, row) in by_timestamp {
        let daily = by_date
            .entry(timestamp.date())
            .or_insert_with(|| vec![0.0; names.len()]);
        for (acc, &value) in daily.iter_mut().zip(&row) {
            if value.is_finite() {
                *acc += value;
            }
        }
    }

    let rows: Vec<(NaiveDate, Vec<f64>)> = by_date.into_iter().collect();
    let frame = CounterFrame::from_rows(names, rows)?;
    info!(
        path = %path.display(),
        days = frame.len(),
        counters = frame.counter_names().len(),
        "loaded count series"
    );
    Ok(frame)
}

/// Load the counter-location table.
pub fn load_locations(path: impl AsRef<Path>) -> Result<Vec<CounterLocation>> {
    let file = File::open(path.as_ref())?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut locations = Vec::new();
    for row in reader.deserialize() {
        let location: CounterLocation = row?;
        locations.push(location);
    }
    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_daily_counts() {
        let file = write_temp(
            "detected,count_8,count_12\n\
             2022-01-01,5,7\n\
             2022-01-02,6,8\n",
        );
        let frame = load_counts(file.path()).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.column("count_8").unwrap(), &[5.0, 6.0]);
        assert_eq!(frame.column("count_12").unwrap(), &[7.0, 8.0]);
    }

    #[test]
    fn sub_daily_rows_are_summed() {
        let file = write_temp(
            "detected,count_8\n\
             2022-01-01 08:00:00,5\n\
             2022-01-01 17:00:00,7\n\
             2022-01-02 09:00:00,3\n",
        );
        let frame = load_counts(file.path()).unwrap();
        assert_eq!(frame.column("count_8").unwrap(), &[12.0, 3.0]);
    }

    #[test]
    fn duplicate_timestamps_keep_last() {
        let file = write_temp(
            "detected,count_8\n\
             2022-01-01 08:00:00,5\n\
             2022-01-01 08:00:00,9\n",
        );
        let frame = load_counts(file.path()).unwrap();
        assert_eq!(frame.column("count_8").unwrap(), &[9.0]);
    }

    #[test]
    fn empty_cells_contribute_nothing() {
        let file = write_temp(
            "detected,count_8\n\
             2022-01-01 08:00:00,\n\
             2022-01-01 09:00:00,4\n",
        );
        let frame = load_counts(file.path()).unwrap();
        assert_eq!(frame.column("count_8").unwrap(), &[4.0]);
    }

    #[test]
    fn missing_timestamp_column_is_an_error() {
        let file = write_temp("when,count_8\n2022-01-01,5\n");
        let err = load_counts(file.path()).unwrap_err();
        assert!(matches!(err, VeloError::Csv(_)));
    }

    #[test]
    fn unparseable_value_is_an_error() {
        let file = write_temp("detected,count_8\n2022-01-01,abc\n");
        assert!(matches!(
            load_counts(file.path()),
            Err(VeloError::Csv(_))
        ));
    }

    #[test]
    fn loads_locations_with_aliases() {
        let file = write_temp(
            "locationId,name,latitude,longitude\n\
             8,Avenida da Liberdade,38.72,-9.14\n\
             12,Campo Grande,38.76,-9.15\n",
        );
        let locations = load_locations(file.path()).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].id, "8");
        assert_eq!(locations[0].name.as_deref(), Some("Avenida da Liberdade"));
        assert!((locations[1].latitude.unwrap() - 38.76).abs() < 1e-9);
    }
}
