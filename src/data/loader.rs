//! Sensor CSV loading

use crate::data::{SENSOR_COLUMNS, TIMESTAMP};
use crate::error::{EnvmonError, Result};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Timestamp formats accepted in the input file
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Loader for sensor reading CSV files.
///
/// Reads the file with header and schema inference, validates the expected
/// columns, and normalizes the timestamp column to millisecond-resolution
/// datetimes regardless of how it was inferred.
pub struct SensorLoader {
    infer_schema_length: Option<usize>,
}

impl Default for SensorLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(100),
        }
    }

    /// Load a sensor CSV into a DataFrame
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            EnvmonError::DataError(format!("cannot open {}: {e}", path.display()))
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| EnvmonError::DataError(e.to_string()))?;

        self.validate_schema(&df)?;
        self.normalize_timestamps(df)
    }

    fn validate_schema(&self, df: &DataFrame) -> Result<()> {
        for col in std::iter::once(TIMESTAMP).chain(SENSOR_COLUMNS) {
            if df.column(col).is_err() {
                return Err(EnvmonError::MissingColumn(col.to_string()));
            }
        }
        Ok(())
    }

    /// Rebuild the timestamp column as Datetime(ms).
    ///
    /// Schema inference may leave the column as String, Date, or a Datetime
    /// with a different unit; every later stage keys on epoch milliseconds.
    /// A row with no parseable timestamp is a data error, not a null.
    fn normalize_timestamps(&self, df: DataFrame) -> Result<DataFrame> {
        let column = df.column(TIMESTAMP)?;

        let parsed = match column.dtype() {
            DataType::Datetime(_, _) | DataType::Date => column
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .map_err(|e| EnvmonError::TimestampError(e.to_string()))?
                .as_materialized_series()
                .clone(),
            DataType::String => {
                let ca = column.str().map_err(|e| EnvmonError::DataError(e.to_string()))?;
                let millis: Vec<i64> = ca
                    .into_iter()
                    .map(|opt| {
                        let raw = opt.ok_or_else(|| {
                            EnvmonError::TimestampError("null timestamp".to_string())
                        })?;
                        parse_timestamp(raw)
                    })
                    .collect::<Result<Vec<i64>>>()?;
                Int64Chunked::from_vec(TIMESTAMP.into(), millis)
                    .into_datetime(TimeUnit::Milliseconds, None)
                    .into_series()
            }
            other => {
                return Err(EnvmonError::TimestampError(format!(
                    "unsupported timestamp dtype: {other:?}"
                )))
            }
        };

        if parsed.null_count() > 0 {
            return Err(EnvmonError::TimestampError(
                "timestamp column contains nulls".to_string(),
            ));
        }

        let mut result = df;
        result
            .with_column(parsed)
            .map_err(|e| EnvmonError::DataError(e.to_string()))?;
        Ok(result)
    }
}

fn parse_timestamp(raw: &str) -> Result<i64> {
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw.trim(), fmt) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    Err(EnvmonError::TimestampError(format!(
        "unparseable timestamp: {raw:?}"
    )))
}

/// Write a DataFrame to CSV, no index column, overwriting any existing file
pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path.as_ref())
        .map_err(|e| EnvmonError::DataError(e.to_string()))?;

    CsvWriter::new(&mut file)
        .finish(df)
        .map_err(|e| EnvmonError::DataError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_sensor_csv() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "timestamp,temperature,humidity,light_level,air_quality").unwrap();
        writeln!(file, "2024-06-01 00:00:00,21.5,60.0,2.0,240.0").unwrap();
        writeln!(file, "2024-06-01 01:00:00,21.0,61.5,1.5,235.0").unwrap();
        writeln!(file, "2024-06-01 02:00:00,20.4,62.0,1.0,250.0").unwrap();
        file
    }

    #[test]
    fn test_load_sensor_csv() {
        let file = create_sensor_csv();
        let df = SensorLoader::new().load(file.path()).unwrap();

        assert_eq!(df.height(), 3);
        assert!(matches!(
            df.column(TIMESTAMP).unwrap().dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
    }

    #[test]
    fn test_missing_column_rejected() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "timestamp,temperature").unwrap();
        writeln!(file, "2024-06-01 00:00:00,21.5").unwrap();

        let err = SensorLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, EnvmonError::MissingColumn(_)));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(
            parse_timestamp("2024-06-01 10:00:00").unwrap(),
            parse_timestamp("2024-06-01T10:00").unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_save_csv_roundtrip() {
        let file = create_sensor_csv();
        let mut df = SensorLoader::new().load(file.path()).unwrap();

        let out = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        save_csv(&mut df, out.path()).unwrap();

        let content = std::fs::read_to_string(out.path()).unwrap();
        assert!(content.starts_with("timestamp,"));
        assert_eq!(content.lines().count(), 4);
    }
}
