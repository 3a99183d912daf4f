//! Binary snapshot store for per-counter correction results.
//!
//! Each counter's rolling run is persisted as one bincode file named
//! `resultado_<counter>.bin` holding the per-iteration corrected frames
//! and anomaly batches. A loader aggregates every snapshot in a results
//! directory into one combined corrected table and one combined anomaly
//! table.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{AnomalyRecord, CounterFrame};
use crate::error::{Result, VeloError};

const SNAPSHOT_PREFIX: &str = "resultado_";
const SNAPSHOT_SUFFIX: &str = ".bin";
const COUNTER_FILE_PREFIX: &str = "resultado_count_";

/// Persisted output of one counter's rolling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Counter column name (e.g. `count_8`).
    pub counter: String,
    /// Corrected frame of each rolling iteration, in order.
    pub corrected: Vec<CounterFrame>,
    /// Anomaly batch of each rolling iteration, in order.
    pub anomalies: Vec<Vec<AnomalyRecord>>,
}

/// Aggregate of every snapshot in a results directory.
#[derive(Debug, Clone)]
pub struct CombinedResults {
    /// One column per counter, outer-joined on date.
    pub corrected: CounterFrame,
    /// All anomaly records, tagged with their counter.
    pub anomalies: Vec<AnomalyRecord>,
}

/// Path of a counter's snapshot file inside a results directory.
pub fn snapshot_path(dir: &Path, counter: &str) -> PathBuf {
    dir.join(format!("{SNAPSHOT_PREFIX}{counter}{SNAPSHOT_SUFFIX}"))
}

/// Write a snapshot, creating the directory if needed.
pub fn write_snapshot(dir: &Path, snapshot: &CounterSnapshot) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = snapshot_path(dir, &snapshot.counter);
    let file = File::create(&path)?;
    bincode::serialize_into(BufWriter::new(file), snapshot)?;
    Ok(path)
}

/// Read one snapshot file.
pub fn read_snapshot(path: &Path) -> Result<CounterSnapshot> {
    let file = File::open(path)?;
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}

/// Aggregate every `resultado_count_*.bin` snapshot in a directory.
///
/// An absent directory or a directory without matching files is a fatal
/// missing-resource error. A snapshot whose frames lack the column
/// named after the counter falls back to its first column, renamed; the
/// fallback is logged since it usually means the writer and reader
/// disagree about the schema.
pub fn load_results(dir: &Path) -> Result<CombinedResults> {
    if !dir.is_dir() {
        return Err(VeloError::MissingResource(format!(
            "results directory not found: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(COUNTER_FILE_PREFIX) && n.ends_with(SNAPSHOT_SUFFIX))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(VeloError::MissingResource(format!(
            "no {COUNTER_FILE_PREFIX}*{SNAPSHOT_SUFFIX} files in {}",
            dir.display()
        )));
    }

    let mut counter_frames = Vec::new();
    let mut all_anomalies = Vec::new();

    for path in &paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("paths were filtered on their file name");
        let counter = name
            .strip_prefix(SNAPSHOT_PREFIX)
            .and_then(|n| n.strip_suffix(SNAPSHOT_SUFFIX))
            .expect("paths were filtered on prefix and suffix")
            .to_string();

        let snapshot = read_snapshot(path)?;
        if snapshot.corrected.is_empty() {
            continue;
        }

        let merged = CounterFrame::concat_keep_last(&snapshot.corrected)?;
        let single = if merged.has_column(&counter) {
            merged.select(&[counter.as_str()])?
        } else {
            // Schema drift between writer and reader; keep the first
            // column under the expected name.
            let first = merged
                .names()
                .first()
                .cloned()
                .ok_or_else(|| VeloError::Snapshot(format!("{name} has no columns")))?;
            warn!(
                snapshot = name,
                expected = %counter,
                found = %first,
                "snapshot lacks its counter column; using first column"
            );
            let mut fallback = merged.select(&[first.as_str()])?;
            fallback.rename_column(&first, &counter)?;
            fallback
        };
        counter_frames.push(single);

        for batch in snapshot.anomalies {
            for mut record in batch {
                record.counter = counter.clone();
                all_anomalies.push(record);
            }
        }
    }

    if counter_frames.is_empty() {
        return Err(VeloError::MissingResource(format!(
            "all snapshots in {} were empty",
            dir.display()
        )));
    }

    let corrected = CounterFrame::outer_join(&counter_frames)?;
    info!(
        counters = counter_frames.len(),
        anomalies = all_anomalies.len(),
        "aggregated correction snapshots"
    );

    Ok(CombinedResults {
        corrected,
        anomalies: all_anomalies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn frame(name: &str, start_day: u32, values: Vec<f64>) -> CounterFrame {
        let dates: Vec<NaiveDate> = (0..values.len() as u32)
            .map(|i| date(2022, 1, start_day + i))
            .collect();
        CounterFrame::new(dates, vec![name.to_string()], vec![values]).unwrap()
    }

    fn anomaly(counter: &str, day: u32) -> AnomalyRecord {
        AnomalyRecord {
            counter: counter.to_string(),
            date: date(2022, 1, day),
            observed: 500.0,
            fitted: 100.0,
            lower: 50.0,
            upper: 150.0,
        }
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = CounterSnapshot {
            counter: "count_8".to_string(),
            corrected: vec![frame("count_8", 1, vec![1.0, 2.0])],
            anomalies: vec![vec![anomaly("count_8", 2)]],
        };

        let path = write_snapshot(dir.path(), &snapshot).unwrap();
        assert!(path.ends_with("resultado_count_8.bin"));

        let loaded = read_snapshot(&path).unwrap();
        assert_eq!(loaded.counter, "count_8");
        assert_eq!(loaded.corrected, snapshot.corrected);
        assert_eq!(loaded.anomalies, snapshot.anomalies);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let err = load_results(Path::new("/no/such/resultados")).unwrap_err();
        assert!(matches!(err, VeloError::MissingResource(_)));
    }

    #[test]
    fn directory_without_snapshots_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_results(dir.path()).unwrap_err();
        assert!(matches!(err, VeloError::MissingResource(_)));
        assert!(err.to_string().contains("resultado_count_"));
    }

    #[test]
    fn aggregates_counters_and_tags_anomalies() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(
            dir.path(),
            &CounterSnapshot {
                counter: "count_8".to_string(),
                corrected: vec![
                    frame("count_8", 1, vec![1.0, 2.0]),
                    frame("count_8", 2, vec![20.0, 30.0]),
                ],
                anomalies: vec![vec![anomaly("count_8", 2)]],
            },
        )
        .unwrap();
        write_snapshot(
            dir.path(),
            &CounterSnapshot {
                counter: "count_12".to_string(),
                corrected: vec![frame("count_12", 2, vec![5.0, 6.0])],
                anomalies: vec![vec![]],
            },
        )
        .unwrap();

        let results = load_results(dir.path()).unwrap();
        assert_eq!(results.corrected.width(), 2);
        assert_eq!(results.corrected.len(), 3);
        // Overlapping date keeps the later iteration's value.
        assert_eq!(
            results.corrected.value(date(2022, 1, 2), "count_8"),
            Some(20.0)
        );
        assert_eq!(results.anomalies.len(), 1);
        assert_eq!(results.anomalies[0].counter, "count_8");
    }

    #[test]
    fn falls_back_to_first_column_with_rename() {
        let dir = tempfile::tempdir().unwrap();
        // The frame inside carries a different column name than the file.
        write_snapshot(
            dir.path(),
            &CounterSnapshot {
                counter: "count_7".to_string(),
                corrected: vec![frame("count_misnamed", 1, vec![4.0])],
                anomalies: vec![],
            },
        )
        .unwrap();

        let results = load_results(dir.path()).unwrap();
        assert!(results.corrected.has_column("count_7"));
        assert_eq!(
            results.corrected.value(date(2022, 1, 1), "count_7"),
            Some(4.0)
        );
    }

    #[test]
    fn non_matching_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not a snapshot").unwrap();
        write_snapshot(
            dir.path(),
            &CounterSnapshot {
                counter: "count_1".to_string(),
                corrected: vec![frame("count_1", 1, vec![1.0])],
                anomalies: vec![],
            },
        )
        .unwrap();

        let results = load_results(dir.path()).unwrap();
        assert_eq!(results.corrected.width(), 1);
    }
}
