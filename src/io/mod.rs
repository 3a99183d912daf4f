//! Input/output: CSV loading and binary result snapshots.

mod csv_load;
mod snapshot;

pub use csv_load::{load_counts, load_locations, CounterLocation, TIMESTAMP_COLUMN};
pub use snapshot::{
    load_results, read_snapshot, snapshot_path, write_snapshot, CombinedResults, CounterSnapshot,
};
