//! Read-only accessor for the meteorology table.
//!
//! One fixed `SELECT *` against a PostgreSQL table. Connection or query
//! failures are caught, logged, and reported as an absent result so the
//! caller can continue without weather data.

use chrono::{NaiveDate, NaiveDateTime};
use postgres::types::Type;
use postgres::{Client, NoTls};
use tracing::{info, warn};

/// Connection parameters for the weather database. All values are
/// fixed configuration; there is no discovery or retry logic.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    /// Table read by [`fetch_meteorology`].
    pub table: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            dbname: "Seasonality".to_string(),
            table: "meteorology".to_string(),
        }
    }
}

impl DbConfig {
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, user: &str, password: &str) -> Self {
        self.user = user.to_string();
        self.password = password.to_string();
        self
    }

    pub fn with_dbname(mut self, dbname: &str) -> Self {
        self.dbname = dbname.to_string();
        self
    }

    /// Key-value connection string for the postgres client.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.dbname
        )
    }
}

/// One decoded cell of the weather table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Float(f64),
    Int(i64),
    Text(String),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Numeric view of the cell, when it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

/// All rows of the meteorology table, with their column names.
#[derive(Debug, Clone, Default)]
pub struct WeatherTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl WeatherTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fetch every row of the configured meteorology table.
///
/// Errors are caught and logged; the caller sees `None` and continues.
pub fn fetch_meteorology(config: &DbConfig) -> Option<WeatherTable> {
    match try_fetch(config) {
        Ok(table) => {
            info!(rows = table.rows.len(), table = %config.table, "fetched weather data");
            Some(table)
        }
        Err(err) => {
            warn!(error = %err, table = %config.table, "failed to import weather data");
            None
        }
    }
}

fn try_fetch(config: &DbConfig) -> std::result::Result<WeatherTable, postgres::Error> {
    let mut client = Client::connect(&config.connection_string(), NoTls)?;
    let rows = client.query(&format!("SELECT * FROM {}", config.table), &[])?;

    let Some(first) = rows.first() else {
        return Ok(WeatherTable::default());
    };
    let columns: Vec<String> = first.columns().iter().map(|c| c.name().to_string()).collect();

    let mut decoded = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut cells = Vec::with_capacity(columns.len());
        for (i, column) in row.columns().iter().enumerate() {
            let cell = match *column.type_() {
                Type::FLOAT8 => row
                    .try_get::<_, Option<f64>>(i)?
                    .map_or(CellValue::Null, CellValue::Float),
                Type::FLOAT4 => row
                    .try_get::<_, Option<f32>>(i)?
                    .map_or(CellValue::Null, |v| CellValue::Float(v as f64)),
                Type::INT2 => row
                    .try_get::<_, Option<i16>>(i)?
                    .map_or(CellValue::Null, |v| CellValue::Int(v as i64)),
                Type::INT4 => row
                    .try_get::<_, Option<i32>>(i)?
                    .map_or(CellValue::Null, |v| CellValue::Int(v as i64)),
                Type::INT8 => row
                    .try_get::<_, Option<i64>>(i)?
                    .map_or(CellValue::Null, CellValue::Int),
                Type::TIMESTAMP => row
                    .try_get::<_, Option<NaiveDateTime>>(i)?
                    .map_or(CellValue::Null, CellValue::Timestamp),
                Type::DATE => row
                    .try_get::<_, Option<NaiveDate>>(i)?
                    .map_or(CellValue::Null, CellValue::Date),
                Type::BOOL => row
                    .try_get::<_, Option<bool>>(i)?
                    .map_or(CellValue::Null, CellValue::Bool),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => row
                    .try_get::<_, Option<String>>(i)?
                    .map_or(CellValue::Null, CellValue::Text),
                _ => CellValue::Null,
            };
            cells.push(cell);
        }
        decoded.push(cells);
    }

    Ok(WeatherTable {
        columns,
        rows: decoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_local_seasonality_db() {
        let config = DbConfig::default();
        assert_eq!(config.table, "meteorology");
        assert_eq!(
            config.connection_string(),
            "host=localhost port=5432 user=postgres password=postgres dbname=Seasonality"
        );
    }

    #[test]
    fn builders_override_fields() {
        let config = DbConfig::default()
            .with_host("db.example.org")
            .with_port(25674)
            .with_credentials("reader", "secret")
            .with_dbname("weather");
        assert!(config.connection_string().contains("host=db.example.org"));
        assert!(config.connection_string().contains("port=25674"));
        assert!(config.connection_string().contains("dbname=weather"));
    }

    #[test]
    fn cell_numeric_views() {
        assert_eq!(CellValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(CellValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::Text("x".into()).as_f64(), None);
        assert_eq!(CellValue::Null.as_f64(), None);
    }

    #[test]
    fn unreachable_server_reports_absent_result() {
        // Port 1 on loopback: connection refused, caught and logged.
        let config = DbConfig::default().with_host("127.0.0.1").with_port(1);
        assert!(fetch_meteorology(&config).is_none());
    }
}
