//! Constant and polynomial models.

use crate::data::Data1D;
use crate::error::{EstError, Result};
use crate::model::{check_parameter_count, Guess, Model};
use crate::parameters::{ParamRef, ParameterBinding, ParameterLike};
use ndarray::Array1;
use std::sync::Arc;

/// Number of coefficients of [`Polynom1D`].
pub const POLYNOM_COEFFICIENTS: usize = 9;

fn as_refs(bindings: &[Arc<ParameterBinding>]) -> Vec<ParamRef> {
    bindings
        .iter()
        .map(|b| Arc::clone(b) as ParamRef)
        .collect()
}

fn mean(values: &Array1<f64>) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// A constant model: f(x) = c0
pub struct Const1D {
    name: String,
    c0: Arc<ParameterBinding>,
    parameters: Vec<ParamRef>,
}

impl Const1D {
    /// Create a constant model with `c0 = 1`.
    pub fn new(name: &str) -> Self {
        Self::with_c0(name, Arc::new(ParameterBinding::new(name, "c0", 1.0)))
    }

    /// Create a constant model around an existing binding, linking it to
    /// every other model that holds the same binding.
    pub fn with_c0(name: &str, c0: Arc<ParameterBinding>) -> Self {
        let parameters = as_refs(std::slice::from_ref(&c0));
        Self {
            name: name.to_string(),
            c0,
            parameters,
        }
    }

    pub fn c0(&self) -> &Arc<ParameterBinding> {
        &self.c0
    }
}

impl Model for Const1D {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[ParamRef] {
        &self.parameters
    }

    fn calc(&self, pars: &[f64], x: &Array1<f64>) -> Result<Array1<f64>> {
        check_parameter_count(self, pars)?;
        Ok(Array1::from_elem(x.len(), pars[0]))
    }

    fn guess(&self, data: &Data1D) -> Result<Guess> {
        if !self.c0.is_frozen() {
            self.c0.set_value(self.c0.bounds().clamp(mean(data.y())))?;
        }
        Ok(Guess::Applied)
    }
}

/// A multiplicative scale factor: f(x) = c0
///
/// Evaluates like [`Const1D`] but has no guess routine, since a scale
/// factor cannot be inferred from the data alone.
pub struct Scale1D {
    name: String,
    c0: Arc<ParameterBinding>,
    parameters: Vec<ParamRef>,
}

impl Scale1D {
    pub fn new(name: &str) -> Self {
        let c0 = Arc::new(ParameterBinding::new(name, "c0", 1.0));
        let parameters = as_refs(std::slice::from_ref(&c0));
        Self {
            name: name.to_string(),
            c0,
            parameters,
        }
    }

    pub fn c0(&self) -> &Arc<ParameterBinding> {
        &self.c0
    }
}

impl Model for Scale1D {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[ParamRef] {
        &self.parameters
    }

    fn calc(&self, pars: &[f64], x: &Array1<f64>) -> Result<Array1<f64>> {
        check_parameter_count(self, pars)?;
        Ok(Array1::from_elem(x.len(), pars[0]))
    }
}

/// A polynomial of up to eighth order:
///
/// f(x) = Σ c[i] * (x - offset)^i
///
/// Only `c0` is thawed on creation; thaw higher coefficients to fit them.
pub struct Polynom1D {
    name: String,
    coefficients: Vec<Arc<ParameterBinding>>,
    offset: Arc<ParameterBinding>,
    parameters: Vec<ParamRef>,
}

impl Polynom1D {
    pub fn new(name: &str) -> Self {
        let coefficients: Vec<Arc<ParameterBinding>> = (0..POLYNOM_COEFFICIENTS)
            .map(|i| {
                let value = if i == 0 { 1.0 } else { 0.0 };
                Arc::new(ParameterBinding::new(name, &format!("c{}", i), value).frozen(i > 0))
            })
            .collect();
        let offset = Arc::new(ParameterBinding::new(name, "offset", 0.0).frozen(true));

        let mut all = coefficients.clone();
        all.push(Arc::clone(&offset));
        let parameters = as_refs(&all);

        Self {
            name: name.to_string(),
            coefficients,
            offset,
            parameters,
        }
    }

    /// Coefficient `c{i}`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not below [`POLYNOM_COEFFICIENTS`].
    pub fn c(&self, i: usize) -> &Arc<ParameterBinding> {
        &self.coefficients[i]
    }

    pub fn c0(&self) -> &Arc<ParameterBinding> {
        self.c(0)
    }

    pub fn c1(&self) -> &Arc<ParameterBinding> {
        self.c(1)
    }

    pub fn offset(&self) -> &Arc<ParameterBinding> {
        &self.offset
    }

    /// Least-squares fit of c0 (and c1 when thawed) to the data.
    fn linear_guess(&self, data: &Data1D) -> Result<()> {
        let x = data.x();
        let y = data.y();
        let offset = self.offset.value();

        if self.c1().is_frozen() || x.len() < 2 {
            let c0 = self.c0();
            if !c0.is_frozen() {
                c0.set_value(c0.bounds().clamp(mean(y)))?;
            }
            return Ok(());
        }

        let n = x.len() as f64;
        let xs: Vec<f64> = x.iter().map(|&v| v - offset).collect();
        let sum_x: f64 = xs.iter().sum();
        let sum_y: f64 = y.iter().sum();
        let sum_xy: f64 = xs.iter().zip(y.iter()).map(|(&a, &b)| a * b).sum();
        let sum_xx: f64 = xs.iter().map(|&a| a * a).sum();

        let denominator = n * sum_xx - sum_x * sum_x;
        if denominator.abs() < 1e-12 {
            return Err(EstError::InvalidInput(format!(
                "cannot guess '{}': all x values are identical",
                self.name
            )));
        }

        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;
        let c0 = self.c0();
        let c1 = self.c1();
        if !c0.is_frozen() {
            c0.set_value(c0.bounds().clamp(intercept))?;
        }
        c1.set_value(c1.bounds().clamp(slope))?;
        Ok(())
    }
}

impl Model for Polynom1D {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[ParamRef] {
        &self.parameters
    }

    fn calc(&self, pars: &[f64], x: &Array1<f64>) -> Result<Array1<f64>> {
        check_parameter_count(self, pars)?;
        let (coeffs, offset) = pars.split_at(POLYNOM_COEFFICIENTS);
        let offset = offset[0];

        // Horner's scheme
        Ok(x.mapv(|xv| {
            let t = xv - offset;
            coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c)
        }))
    }

    fn guess(&self, data: &Data1D) -> Result<Guess> {
        self.linear_guess(data)?;
        Ok(Guess::Applied)
    }
}
