//! Time feature derivation

use crate::data::{HOUR, IS_DAY, TIMESTAMP};
use crate::error::{EnvmonError, Result};
use polars::prelude::*;

/// First hour (exclusive) of the daytime window
pub const DAY_START_HOUR: i32 = 6;
/// Last hour (exclusive) of the daytime window
pub const DAY_END_HOUR: i32 = 18;

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 86_400_000;

/// Append `hour` (0-23) and `is_day` (0/1) columns derived from the
/// timestamp column.
///
/// The daytime flag is 1 when the hour is strictly inside the
/// (`DAY_START_HOUR`, `DAY_END_HOUR`) window.
pub fn derive_time_features(df: &DataFrame) -> Result<DataFrame> {
    let column = df
        .column(TIMESTAMP)
        .map_err(|_| EnvmonError::MissingColumn(TIMESTAMP.to_string()))?;

    if !matches!(column.dtype(), DataType::Datetime(TimeUnit::Milliseconds, _)) {
        return Err(EnvmonError::TimestampError(format!(
            "expected Datetime(ms) timestamps, got {:?}",
            column.dtype()
        )));
    }

    let millis = column
        .cast(&DataType::Int64)
        .map_err(|e| EnvmonError::DataError(e.to_string()))?;
    let ca = millis
        .i64()
        .map_err(|e| EnvmonError::DataError(e.to_string()))?;

    let hours: Int32Chunked = ca
        .into_iter()
        .map(|opt| opt.map(|ms| (ms.rem_euclid(MS_PER_DAY) / MS_PER_HOUR) as i32))
        .collect();

    let is_day: Int32Chunked = (&hours)
        .into_iter()
        .map(|opt| opt.map(|h| i32::from(h > DAY_START_HOUR && h < DAY_END_HOUR)))
        .collect();

    let mut result = df.clone();
    result
        .with_column(hours.with_name(HOUR.into()).into_series())
        .map_err(|e| EnvmonError::DataError(e.to_string()))?;
    result
        .with_column(is_day.with_name(IS_DAY.into()).into_series())
        .map_err(|e| EnvmonError::DataError(e.to_string()))?;

    Ok(result)
}
