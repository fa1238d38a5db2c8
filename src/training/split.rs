//! Train/test partitioning

use crate::error::{EnvmonError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Split features and labels into shuffled train/test partitions.
///
/// The shuffle is driven entirely by `seed`, so the same seed and input
/// always yield identical partition membership. The test partition holds
/// `ceil(n * test_fraction)` rows, at least 1 and at most n - 1.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_fraction: f64,
    seed: u64,
) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
    let n = x.nrows();
    if n != y.len() {
        return Err(EnvmonError::DataError(format!(
            "feature rows ({n}) and labels ({}) differ in length",
            y.len()
        )));
    }
    if n < 2 {
        return Err(EnvmonError::DataError(
            "need at least 2 rows to split".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(EnvmonError::ConfigError(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let test_size = ((n as f64) * test_fraction).ceil() as usize;
    let test_size = test_size.clamp(1, n - 1);

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(test_size);

    let n_cols = x.ncols();
    let gather = |idx: &[usize]| {
        Array2::from_shape_fn((idx.len(), n_cols), |(i, j)| x[[idx[i], j]])
    };
    let x_train = gather(train_idx);
    let x_test = gather(test_idx);
    let y_train = Array1::from_iter(train_idx.iter().map(|&i| y[i]));
    let y_test = Array1::from_iter(test_idx.iter().map(|&i| y[i]));

    Ok((x_train, x_test, y_train, y_test))
}
