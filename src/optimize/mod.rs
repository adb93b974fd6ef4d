//! Optimizers used to reach the best fit and to re-optimize nuisance
//! parameters during a projection search.
//!
//! The estimator only depends on the [`Reoptimizer`] trait. An invocation
//! receives an immutable snapshot (start vector and hard limits) and returns
//! a new vector; nothing is shared between invocations.

use crate::error::Result;
use crate::parameters::Bounds;
use ndarray::Array1;
use std::fmt;

mod neldermead;

pub use neldermead::{NelderMead, NelderMeadConfig};

/// Scalar objective over a parameter vector.
pub type Objective<'a> = dyn Fn(&Array1<f64>) -> Result<f64> + 'a;

/// A bounded local minimizer.
pub trait Reoptimizer: Send + Sync {
    /// Short name reported in results, e.g. `neldermead`.
    fn name(&self) -> &str;

    /// Minimize `objective` starting from `start`, keeping each component
    /// within its [`Bounds`].
    fn reoptimize(&self, objective: &Objective<'_>, start: &Array1<f64>, bounds: &[Bounds]) -> Result<OptResult>;
}

/// Result of one optimizer run.
#[derive(Debug, Clone)]
pub struct OptResult {
    /// The best parameters found
    pub params: Array1<f64>,

    /// The objective at `params`
    pub cost: f64,

    /// The number of iterations performed
    pub iterations: usize,

    /// The number of function evaluations
    pub nfev: usize,

    /// Whether the convergence criteria were met
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for OptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.nfev)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Parameters: {:?}", self.params)
    }
}

/// Clamp every component of `x` into its bounds.
pub fn clip_to_bounds(x: &Array1<f64>, bounds: &[Bounds]) -> Array1<f64> {
    x.iter()
        .zip(bounds.iter())
        .map(|(&v, b)| b.clamp(v))
        .collect()
}
