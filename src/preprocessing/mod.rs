//! Feature preprocessing
//!
//! Standardization of the model input columns and conversion of a DataFrame
//! projection into a dense feature matrix.

mod scaler;

pub use scaler::StandardScaler;

use crate::error::{EnvmonError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
///
/// Columns are cast to Float64; a null cell becomes 0.0 (upstream stages are
/// expected to have imputed real gaps).
pub fn feature_matrix(df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = columns.len();

    let col_data: Vec<Vec<f64>> = columns
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| EnvmonError::MissingColumn(col_name.to_string()))?;
            let series_f64 = series
                .cast(&DataType::Float64)
                .map_err(|e| EnvmonError::DataError(e.to_string()))?;
            let values: Vec<f64> = series_f64
                .f64()
                .map_err(|e| EnvmonError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Extract a single column as a label vector
pub fn label_vector(df: &DataFrame, column: &str) -> Result<Array1<f64>> {
    let series = df
        .column(column)
        .map_err(|_| EnvmonError::MissingColumn(column.to_string()))?
        .cast(&DataType::Float64)
        .map_err(|e| EnvmonError::DataError(e.to_string()))?;

    let values: Vec<f64> = series
        .f64()
        .map_err(|e| EnvmonError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();

    Ok(Array1::from_vec(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_matrix_shape_and_order() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0],
            "b" => &[10.0, 20.0, 30.0]
        )
        .unwrap();

        let x = feature_matrix(&df, &["b", "a"]).unwrap();
        assert_eq!(x.shape(), &[3, 2]);
        assert_eq!(x[[0, 0]], 10.0);
        assert_eq!(x[[2, 1]], 3.0);
    }

    #[test]
    fn test_label_vector() {
        let df = df!("y" => &[0i32, 1, 1, 0]).unwrap();
        let y = label_vector(&df, "y").unwrap();
        assert_eq!(y.to_vec(), vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_column() {
        let df = df!("a" => &[1.0]).unwrap();
        assert!(matches!(
            feature_matrix(&df, &["nope"]),
            Err(EnvmonError::MissingColumn(_))
        ));
    }
}
