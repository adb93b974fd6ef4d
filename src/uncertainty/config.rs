//! Configuration options for the error estimators.

use crate::error::{EstError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF};
use statrs::function::erf::erf;
use std::f64::consts::SQRT_2;

/// How the confidence level `sigma` maps to the rise of the statistic that
/// defines a bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaStatPolicy {
    /// Δ = σ², the one-parameter rule for χ²-scaled statistics
    SigmaSquared,

    /// A fixed Δ regardless of `sigma`
    Fixed(f64),

    /// Δ is the χ² quantile with `dof` degrees of freedom at the two-sided
    /// normal coverage of `sigma`; equals σ² for `dof = 1`
    Coverage { dof: usize },
}

impl Default for DeltaStatPolicy {
    fn default() -> Self {
        DeltaStatPolicy::SigmaSquared
    }
}

impl DeltaStatPolicy {
    /// Δstat for confidence level `sigma`.
    pub fn delta(&self, sigma: f64) -> Result<f64> {
        let delta = match *self {
            DeltaStatPolicy::SigmaSquared => sigma * sigma,
            DeltaStatPolicy::Fixed(value) => value,
            DeltaStatPolicy::Coverage { dof } => {
                if dof == 0 {
                    return Err(EstError::InvalidInput(
                        "coverage policy needs at least one degree of freedom".to_string(),
                    ));
                }
                chi2_quantile(dof as f64, coverage(sigma))?
            }
        };
        if !(delta.is_finite() && delta > 0.0) {
            return Err(EstError::InvalidInput(format!(
                "the statistic threshold must be positive and finite, got {}",
                delta
            )));
        }
        Ok(delta)
    }
}

/// Two-sided normal coverage of `sigma`: erf(σ/√2).
pub fn coverage(sigma: f64) -> f64 {
    erf(sigma / SQRT_2)
}

fn chi2_quantile(dof: f64, p: f64) -> Result<f64> {
    let dist = ChiSquared::new(dof).map_err(|e| EstError::InvalidInput(e.to_string()))?;

    // polish the coarse library quantile with Newton steps
    let mut x = dist.inverse_cdf(p).max(f64::MIN_POSITIVE);
    for _ in 0..50 {
        let density = dist.pdf(x);
        if !(density > 0.0) {
            break;
        }
        let step = (dist.cdf(x) - p) / density;
        let next = (x - step).max(0.5 * x);
        if (next - x).abs() <= 1e-14 * x.max(1.0) {
            x = next;
            break;
        }
        x = next;
    }
    Ok(x)
}

/// Configuration options for one error-estimation method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Confidence level in units of σ. Default: 1.0
    pub sigma: f64,

    /// Mapping from `sigma` to the statistic threshold. Default: SigmaSquared
    pub delta_stat: DeltaStatPolicy,

    /// Relative finite-difference step for the curvature matrix. Default: 1e-4
    pub eps: f64,

    /// Tolerance on the statistic difference at a bound. Default: 1e-6
    pub tol: f64,

    /// Root-search iterations per bound. Default: 200
    pub maxiters: usize,

    /// Bracket expansions per bound. Default: 60
    pub max_expansions: usize,

    /// Search the parameters in parallel (needs the `parallel` feature). Default: false
    pub parallel: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            delta_stat: DeltaStatPolicy::default(),
            eps: 1e-4,
            tol: 1e-6,
            maxiters: 200,
            max_expansions: 60,
            parallel: false,
        }
    }
}

impl EstimatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn with_delta_stat(mut self, policy: DeltaStatPolicy) -> Self {
        self.delta_stat = policy;
        self
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_maxiters(mut self, maxiters: usize) -> Self {
        self.maxiters = maxiters;
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check the options and return the statistic threshold they imply.
    pub fn validate(&self) -> Result<f64> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(EstError::InvalidInput(format!(
                "sigma must be positive, got {}",
                self.sigma
            )));
        }
        if !(self.eps > 0.0 && self.tol > 0.0) {
            return Err(EstError::InvalidInput(
                "eps and tol must be positive".to_string(),
            ));
        }
        if self.maxiters == 0 || self.max_expansions == 0 {
            return Err(EstError::InvalidInput(
                "maxiters and max_expansions must be at least 1".to_string(),
            ));
        }
        self.delta_stat.delta(self.sigma)
    }

    /// Percentage of the normal distribution covered by `sigma`.
    pub fn percent(&self) -> f64 {
        100.0 * coverage(self.sigma)
    }
}
