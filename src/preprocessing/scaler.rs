//! Feature standardization

use crate::error::{EnvmonError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-column statistics of a fitted scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ColumnStats {
    mean: f64,
    std: f64,
}

/// Standard scaler: `(x - mean) / std` per column.
///
/// Statistics are fit once on a reference frame; transform applies them to
/// any frame carrying the fitted columns. A zero-variance column scales by
/// 1.0 so constant features pass through centered instead of producing NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    stats: HashMap<String, ColumnStats>,
    is_fitted: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Create an unfitted scaler
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            stats: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit per-column mean and standard deviation
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.columns.clear();
        self.stats.clear();

        for col_name in columns {
            let ca = Self::float_chunked(df, col_name)?;
            let mean = ca.mean().unwrap_or(0.0);
            let std = ca.std(1).unwrap_or(1.0);
            self.columns.push(col_name.to_string());
            self.stats.insert(
                col_name.to_string(),
                ColumnStats {
                    mean,
                    std: if std == 0.0 { 1.0 } else { std },
                },
            );
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the fitted columns, returning a frame with them replaced
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, s| (v - s.mean) / s.std)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Undo the transform, recovering original units
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, s| v * s.std + s.mean)
    }

    /// Columns the scaler was fitted on, in fit order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn apply(&self, df: &DataFrame, op: impl Fn(f64, &ColumnStats) -> f64) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(EnvmonError::NotFitted);
        }

        let mut result = df.clone();
        for col_name in &self.columns {
            let stats = &self.stats[col_name];
            let ca = Self::float_chunked(df, col_name)?;

            let scaled: Float64Chunked = ca
                .into_iter()
                .map(|opt| opt.map(|v| op(v, stats)))
                .collect();

            result = result
                .with_column(scaled.with_name(col_name.as_str().into()).into_series())
                .map_err(|e| EnvmonError::DataError(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    fn float_chunked(df: &DataFrame, col_name: &str) -> Result<Float64Chunked> {
        let series = df
            .column(col_name)
            .map_err(|_| EnvmonError::MissingColumn(col_name.to_string()))?
            .cast(&DataType::Float64)
            .map_err(|e| EnvmonError::DataError(e.to_string()))?;
        series
            .f64()
            .map(|ca| ca.clone())
            .map_err(|e| EnvmonError::DataError(e.to_string()))
    }
}
