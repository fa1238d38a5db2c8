//! Missing value imputation

use crate::error::{EnvmonError, Result};
use polars::prelude::*;

/// Forward-fill imputer.
///
/// Replaces each missing cell with the nearest preceding non-missing value in
/// row order. A leading run of nulls has no predecessor and stays missing.
/// Any amount of missing data is accepted without error.
#[derive(Debug, Clone, Default)]
pub struct ForwardFillImputer;

impl ForwardFillImputer {
    /// Create a new imputer
    pub fn new() -> Self {
        Self
    }

    /// Forward-fill the named columns, returning the filled frame
    pub fn apply(&self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        let mut result = df.clone();

        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| EnvmonError::MissingColumn(col_name.to_string()))?;
            let series = column.as_materialized_series();
            let filled = self.fill_series(series)?;
            result = result
                .with_column(filled)
                .map_err(|e| EnvmonError::DataError(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    fn fill_series(&self, series: &Series) -> Result<Series> {
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|e| EnvmonError::DataError(e.to_string()))?;
        let ca = casted
            .f64()
            .map_err(|e| EnvmonError::DataError(e.to_string()))?;

        let mut last: Option<f64> = None;
        let filled: Float64Chunked = ca
            .into_iter()
            .map(|opt| match opt {
                Some(v) => {
                    last = Some(v);
                    Some(v)
                }
                None => last,
            })
            .collect();

        Ok(filled.with_name(series.name().clone()).into_series())
    }
}
