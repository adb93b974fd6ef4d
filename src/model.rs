//! Model trait and model composition.
//!
//! A model predicts values on a dataset's independent axis from an explicit
//! parameter vector. It never reads the live parameter bindings while
//! evaluating: the caller passes the values in [`Model::parameters`] order.
//! This keeps evaluation a pure function of the vector, which is what lets
//! the error estimator evaluate trial points without touching shared state.

use crate::data::Data1D;
use crate::error::{EstError, Result};
use crate::parameters::{position_of, ParamRef};
use ndarray::Array1;
use std::sync::Arc;

/// Outcome of a model's guess routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guess {
    /// Parameter values were set from the data
    Applied,
    /// The model has no guess routine
    Unavailable,
}

/// A trait representing a model that can be fit to data.
pub trait Model: Send + Sync {
    /// Display name, e.g. `mdl` or `(mdl + bkg)`.
    fn name(&self) -> &str;

    /// Parameters in evaluation order. Linked parameters appear once.
    fn parameters(&self) -> &[ParamRef];

    /// Evaluate the model at `x` with `pars` in [`Model::parameters`] order.
    fn calc(&self, pars: &[f64], x: &Array1<f64>) -> Result<Array1<f64>>;

    /// Set starting values from the data.
    ///
    /// The default reports that no guess routine exists.
    fn guess(&self, _data: &Data1D) -> Result<Guess> {
        Ok(Guess::Unavailable)
    }

    /// Current values of all parameters, in evaluation order.
    fn current_values(&self) -> Vec<f64> {
        self.parameters().iter().map(|p| p.value()).collect()
    }

    /// Evaluate with the current parameter values.
    fn eval(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.calc(&self.current_values(), x)
    }
}

/// Shared handle to a model; the same model may be the source of several datasets.
pub type ModelRef = Arc<dyn Model>;

/// Check that a parameter vector has the length a model expects.
pub fn check_parameter_count(model: &dyn Model, pars: &[f64]) -> Result<()> {
    let expected = model.parameters().len();
    if pars.len() != expected {
        return Err(EstError::DimensionMismatch(format!(
            "model '{}' expects {} parameter values, got {}",
            model.name(),
            expected,
            pars.len()
        )));
    }
    Ok(())
}

/// The sum of two models.
///
/// The parameter list is the union of both parts, deduplicated by identity,
/// so a parameter shared between `lhs` and `rhs` occupies a single slot.
pub struct SumModel {
    name: String,
    lhs: ModelRef,
    rhs: ModelRef,
    parameters: Vec<ParamRef>,
    lhs_slots: Vec<usize>,
    rhs_slots: Vec<usize>,
}

impl SumModel {
    pub fn new(lhs: ModelRef, rhs: ModelRef) -> Self {
        let mut parameters: Vec<ParamRef> = Vec::new();
        let mut slots_for = |part: &ModelRef| -> Vec<usize> {
            part.parameters()
                .iter()
                .map(|p| match position_of(&parameters, p) {
                    Some(idx) => idx,
                    None => {
                        parameters.push(Arc::clone(p));
                        parameters.len() - 1
                    }
                })
                .collect()
        };
        let lhs_slots = slots_for(&lhs);
        let rhs_slots = slots_for(&rhs);

        Self {
            name: format!("({} + {})", lhs.name(), rhs.name()),
            lhs,
            rhs,
            parameters,
            lhs_slots,
            rhs_slots,
        }
    }
}

impl Model for SumModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[ParamRef] {
        &self.parameters
    }

    fn calc(&self, pars: &[f64], x: &Array1<f64>) -> Result<Array1<f64>> {
        check_parameter_count(self, pars)?;
        let lhs_pars: Vec<f64> = self.lhs_slots.iter().map(|&i| pars[i]).collect();
        let rhs_pars: Vec<f64> = self.rhs_slots.iter().map(|&i| pars[i]).collect();
        let a = self.lhs.calc(&lhs_pars, x)?;
        let b = self.rhs.calc(&rhs_pars, x)?;
        if a.len() != b.len() {
            return Err(EstError::DimensionMismatch(format!(
                "cannot add '{}' ({} values) and '{}' ({} values)",
                self.lhs.name(),
                a.len(),
                self.rhs.name(),
                b.len()
            )));
        }
        Ok(a + b)
    }
}

/// Add two models.
pub fn add(lhs: ModelRef, rhs: ModelRef) -> ModelRef {
    Arc::new(SumModel::new(lhs, rhs))
}
