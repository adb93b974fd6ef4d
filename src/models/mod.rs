//! Built-in model implementations.
//!
//! Each model owns [`ParameterBinding`](crate::parameters::ParameterBinding)s
//! named `<model>.<param>` and exposes typed accessors for them, so callers
//! can freeze, thaw or pass them to the error estimator.

mod peak;
mod polynomial;

pub use peak::Gauss1D;
pub use polynomial::{Const1D, Polynom1D, Scale1D, POLYNOM_COEFFICIENTS};
