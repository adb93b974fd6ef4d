//! Fit statistics.
//!
//! A statistic turns one dataset and the model values predicted for it into a
//! scalar; smaller is better. All bundled statistics are on the χ² scale
//! (χ² itself, or −2 log L up to a constant), so a change of σ² in the
//! statistic corresponds to a σ-level change of one parameter.

use crate::data::Data1D;
use crate::error::{EstError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Model values at or below zero are replaced by this in the Poisson statistics.
const TRUNCATION_VALUE: f64 = 1.0e-25;

/// A per-dataset goodness-of-fit measure.
pub trait Statistic: Send + Sync {
    /// Short lowercase name, e.g. `cstat`.
    fn name(&self) -> &str;

    /// Evaluate the statistic for one dataset.
    fn calc(&self, data: &Data1D, model: &Array1<f64>) -> Result<f64>;
}

impl<S: Statistic + ?Sized> Statistic for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn calc(&self, data: &Data1D, model: &Array1<f64>) -> Result<f64> {
        (**self).calc(data, model)
    }
}

/// The bundled statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    /// Sum of squared residuals, no weighting
    LeastSq,
    /// χ² using the dataset's statistical errors
    Chi2,
    /// χ² with the Gehrels approximation σ = 1 + sqrt(N + 0.75)
    Chi2Gehrels,
    /// χ² with data variance σ² = N
    Chi2DataVar,
    /// Cash (Poisson maximum likelihood)
    Cash,
    /// Cash with the saturated model subtracted
    CStat,
}

impl Default for StatKind {
    fn default() -> Self {
        StatKind::Chi2Gehrels
    }
}

impl StatKind {
    fn weighted_sum(data: &Data1D, model: &Array1<f64>, sigma: impl Fn(usize, f64) -> Result<f64>) -> Result<f64> {
        let mut total = 0.0;
        for (i, (&y, &m)) in data.y().iter().zip(model.iter()).enumerate() {
            let s = sigma(i, y)?;
            let r = (y - m) / s;
            total += r * r;
        }
        Ok(total)
    }
}

impl Statistic for StatKind {
    fn name(&self) -> &str {
        match self {
            StatKind::LeastSq => "leastsq",
            StatKind::Chi2 => "chi2",
            StatKind::Chi2Gehrels => "chi2gehrels",
            StatKind::Chi2DataVar => "chi2datavar",
            StatKind::Cash => "cash",
            StatKind::CStat => "cstat",
        }
    }

    fn calc(&self, data: &Data1D, model: &Array1<f64>) -> Result<f64> {
        if model.len() != data.npoints() {
            return Err(EstError::DimensionMismatch(format!(
                "dataset '{}' has {} points but the model returned {} values",
                data.name(),
                data.npoints(),
                model.len()
            )));
        }

        let value = match self {
            StatKind::LeastSq => Self::weighted_sum(data, model, |_, _| Ok(1.0))?,
            StatKind::Chi2 => {
                let errors = data.staterror().ok_or_else(|| {
                    EstError::InvalidInput(format!(
                        "dataset '{}' has no statistical errors; chi2 needs them",
                        data.name()
                    ))
                })?;
                Self::weighted_sum(data, model, |i, _| Ok(errors[i]))?
            }
            StatKind::Chi2Gehrels => {
                Self::weighted_sum(data, model, |_, y| Ok(1.0 + (y.abs() + 0.75).sqrt()))?
            }
            StatKind::Chi2DataVar => Self::weighted_sum(data, model, |_, y| {
                if y > 0.0 {
                    Ok(y.sqrt())
                } else {
                    Err(EstError::InvalidInput(format!(
                        "dataset '{}' has values <= 0; chi2datavar cannot be used",
                        data.name()
                    )))
                }
            })?,
            StatKind::Cash => {
                let mut total = 0.0;
                for (&y, &m) in data.y().iter().zip(model.iter()) {
                    let m = m.max(TRUNCATION_VALUE);
                    total += m - y * m.ln();
                }
                2.0 * total
            }
            StatKind::CStat => {
                let mut total = 0.0;
                for (&y, &m) in data.y().iter().zip(model.iter()) {
                    let m = m.max(TRUNCATION_VALUE);
                    total += if y > 0.0 { m - y + y * (y / m).ln() } else { m };
                }
                2.0 * total
            }
        };

        if value.is_nan() {
            return Err(EstError::FunctionEvaluation(format!(
                "{} is NaN for dataset '{}'",
                self.name(),
                data.name()
            )));
        }
        Ok(value)
    }
}

impl FromStr for StatKind {
    type Err = EstError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "leastsq" => Ok(StatKind::LeastSq),
            "chi2" => Ok(StatKind::Chi2),
            "chi2gehrels" => Ok(StatKind::Chi2Gehrels),
            "chi2datavar" => Ok(StatKind::Chi2DataVar),
            "cash" => Ok(StatKind::Cash),
            "cstat" => Ok(StatKind::CStat),
            other => Err(EstError::ArgumentType(format!(
                "'{}' is not a valid statistic",
                other
            ))),
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
