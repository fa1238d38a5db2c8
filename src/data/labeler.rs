//! Threshold labeling

use crate::data::{AIR_QUALITY, TEMPERATURE, UNSAFE};
use crate::error::{EnvmonError, Result};
use polars::prelude::*;

/// Append the binary `unsafe` label: 1 when temperature exceeds
/// `temperature_threshold` or air quality exceeds `air_quality_threshold`,
/// else 0.
///
/// A still-missing reading compares false on both predicates and labels 0,
/// matching the threshold semantics on incomplete rows.
pub fn label_unsafe(
    df: &DataFrame,
    temperature_threshold: f64,
    air_quality_threshold: f64,
) -> Result<DataFrame> {
    let temperature = numeric_column(df, TEMPERATURE)?;
    let air_quality = numeric_column(df, AIR_QUALITY)?;

    let labels: Int32Chunked = temperature
        .f64()
        .map_err(|e| EnvmonError::DataError(e.to_string()))?
        .into_iter()
        .zip(
            air_quality
                .f64()
                .map_err(|e| EnvmonError::DataError(e.to_string()))?
                .into_iter(),
        )
        .map(|(t, a)| {
            let hot = t.map(|v| v > temperature_threshold).unwrap_or(false);
            let polluted = a.map(|v| v > air_quality_threshold).unwrap_or(false);
            Some(i32::from(hot || polluted))
        })
        .collect();

    let mut result = df.clone();
    result
        .with_column(labels.with_name(UNSAFE.into()).into_series())
        .map_err(|e| EnvmonError::DataError(e.to_string()))?;
    Ok(result)
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Series> {
    df.column(name)
        .map_err(|_| EnvmonError::MissingColumn(name.to_string()))?
        .cast(&DataType::Float64)
        .map_err(|e| EnvmonError::DataError(e.to_string()))
        .map(|c| c.as_materialized_series().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(temps: &[f64], air: &[f64]) -> DataFrame {
        DataFrame::new(vec![
            Column::new(TEMPERATURE.into(), temps),
            Column::new(AIR_QUALITY.into(), air),
        ])
        .unwrap()
    }

    #[test]
    fn test_label_thresholds() {
        // 40/300 unsafe by temperature, 20/300 safe, 20/650 unsafe by air.
        let df = readings(&[40.0, 20.0, 20.0], &[300.0, 300.0, 650.0]);
        let result = label_unsafe(&df, 35.0, 600.0).unwrap();
        let labels = result.column(UNSAFE).unwrap().i32().unwrap();

        assert_eq!(labels.get(0), Some(1));
        assert_eq!(labels.get(1), Some(0));
        assert_eq!(labels.get(2), Some(1));
    }

    #[test]
    fn test_boundary_is_safe() {
        let df = readings(&[35.0, 35.01], &[600.0, 600.0]);
        let result = label_unsafe(&df, 35.0, 600.0).unwrap();
        let labels = result.column(UNSAFE).unwrap().i32().unwrap();

        assert_eq!(labels.get(0), Some(0));
        assert_eq!(labels.get(1), Some(1));
    }

    #[test]
    fn test_missing_reading_labels_safe() {
        let df = DataFrame::new(vec![
            Column::new(TEMPERATURE.into(), &[None::<f64>, Some(40.0)]),
            Column::new(AIR_QUALITY.into(), &[Some(300.0), None]),
        ])
        .unwrap();

        let result = label_unsafe(&df, 35.0, 600.0).unwrap();
        let labels = result.column(UNSAFE).unwrap().i32().unwrap();

        assert_eq!(labels.get(0), Some(0));
        assert_eq!(labels.get(1), Some(1));
    }
}
