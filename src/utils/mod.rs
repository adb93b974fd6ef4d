//! Numerical helpers shared by the estimators.

pub mod finite_difference;
pub mod matrix_convert;

pub use finite_difference::hessian;
pub use matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};
