//! The structured result of an error-estimation call.

use super::ErrorMethod;
use crate::error::Result;
use crate::registry::{join_ids, DatasetId};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a single bound was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundStatus {
    /// Found within tolerance
    Converged,
    /// Iteration budget exhausted; the best estimate is reported
    ReducedPrecision,
    /// The parameter's hard limit was reached before the threshold
    HardLimit,
    /// No bound could be computed (singular curvature, no bracket)
    Undetermined,
}

impl BoundStatus {
    /// Whether the bound carries a value.
    pub fn has_value(&self) -> bool {
        matches!(self, BoundStatus::Converged | BoundStatus::ReducedPrecision)
    }
}

/// Result of one error-estimation call.
///
/// `parmins` and `parmaxes` are offsets from `parvals`; `None` marks a bound
/// that could not be determined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEstimationResult {
    pub method: ErrorMethod,
    /// Dataset ids in resolved order
    pub datasets: Vec<DatasetId>,
    pub parnames: Vec<String>,
    pub parvals: Vec<f64>,
    pub parmins: Vec<Option<f64>>,
    pub parmaxes: Vec<Option<f64>>,
    pub lower_status: Vec<BoundStatus>,
    pub upper_status: Vec<BoundStatus>,
    pub sigma: f64,
    /// Normal coverage of `sigma`, in percent
    pub percent: f64,
    pub statname: String,
    pub fitname: String,
    /// Joint statistic at the best fit
    pub statval: f64,
    pub numpoints: usize,
    /// Statistic evaluations spent on the call
    pub nfits: usize,
    /// Covariance of the reported parameters (covariance method only)
    pub covariance: Option<Array2<f64>>,
    /// A lower statistic than the best fit was seen during a bound search
    pub new_minimum: bool,
}

impl ErrorEstimationResult {
    pub fn len(&self) -> usize {
        self.parnames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parnames.is_empty()
    }

    /// Lower and upper offsets for the parameter named `name`.
    pub fn bounds(&self, name: &str) -> Option<(Option<f64>, Option<f64>)> {
        self.parnames
            .iter()
            .position(|n| n == name)
            .map(|i| (self.parmins[i], self.parmaxes[i]))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn format_bound(bound: Option<f64>) -> String {
    match bound {
        Some(v) => format!("{:.6}", v),
        None => "-----".to_string(),
    }
}

impl fmt::Display for ErrorEstimationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Datasets              = {}", join_ids(&self.datasets))?;
        writeln!(f, "{:<22}= {}", format!("{} Method", self.method.title()), self.method)?;
        writeln!(f, "Fitting Method        = {}", self.fitname)?;
        writeln!(f, "Statistic             = {}", self.statname)?;
        writeln!(
            f,
            "{} {}-sigma ({:.4}%) bounds:",
            self.method, self.sigma, self.percent
        )?;

        let width = self.parnames.iter().map(|n| n.len()).max().unwrap_or(5).max(5);
        writeln!(
            f,
            "   {:<width$} {:>13} {:>13} {:>13}",
            "Param",
            "Best-Fit",
            "Lower Bound",
            "Upper Bound",
            width = width
        )?;
        writeln!(
            f,
            "   {:<width$} {:>13} {:>13} {:>13}",
            "-----",
            "--------",
            "-----------",
            "-----------",
            width = width
        )?;
        for i in 0..self.len() {
            writeln!(
                f,
                "   {:<width$} {:>13.6} {:>13} {:>13}",
                self.parnames[i],
                self.parvals[i],
                format_bound(self.parmins[i]),
                format_bound(self.parmaxes[i]),
                width = width
            )?;
        }
        Ok(())
    }
}
