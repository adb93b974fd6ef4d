//! One-dimensional datasets.

use crate::error::{EstError, Result};
use ndarray::Array1;

/// A measured one-dimensional dataset: independent axis, dependent values and
/// optional statistical errors.
#[derive(Debug, Clone)]
pub struct Data1D {
    name: String,
    x: Array1<f64>,
    y: Array1<f64>,
    staterror: Option<Array1<f64>>,
}

impl Data1D {
    /// Create a dataset without errors.
    pub fn new(name: &str, x: Array1<f64>, y: Array1<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(EstError::DimensionMismatch(format!(
                "dataset '{}': x has {} points but y has {}",
                name,
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(EstError::InvalidInput(format!(
                "dataset '{}' has no points",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
            x,
            y,
            staterror: None,
        })
    }

    /// Attach statistical errors; they must be positive and match `y` in length.
    pub fn with_staterror(mut self, staterror: Array1<f64>) -> Result<Self> {
        if staterror.len() != self.y.len() {
            return Err(EstError::DimensionMismatch(format!(
                "dataset '{}': {} errors for {} points",
                self.name,
                staterror.len(),
                self.y.len()
            )));
        }
        if staterror.iter().any(|&e| !(e > 0.0)) {
            return Err(EstError::InvalidInput(format!(
                "dataset '{}': statistical errors must be positive",
                self.name
            )));
        }
        self.staterror = Some(staterror);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn staterror(&self) -> Option<&Array1<f64>> {
        self.staterror.as_ref()
    }

    /// Number of points that enter the statistic.
    pub fn npoints(&self) -> usize {
        self.y.len()
    }
}
