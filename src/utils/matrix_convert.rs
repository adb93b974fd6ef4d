//! Conversions between ndarray and nalgebra matrices.
//!
//! The crate keeps its public matrices in ndarray; nalgebra is used for the
//! decompositions.

use nalgebra::DMatrix;
use ndarray::Array2;

/// Convert an ndarray matrix to a nalgebra `DMatrix`.
pub fn ndarray_to_nalgebra(arr: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]])
}

/// Convert a nalgebra `DMatrix` to an ndarray matrix.
pub fn nalgebra_to_ndarray(mat: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}
