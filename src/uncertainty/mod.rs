//! # Parameter Error Estimation
//!
//! Three strategies compute bounds on the free parameters of a joint fit:
//!
//! - **covariance**: symmetric errors from the inverse curvature of the joint
//!   statistic at the best fit
//! - **confidence**: a one-dimensional bound search along each parameter with
//!   the other free parameters held at the best fit
//! - **projection**: the same search, re-optimizing the other free parameters
//!   at every trial value (profile likelihood)
//!
//! Every call checks the free parameter bindings out on entry and restores
//! them on exit, whatever the outcome.

mod checkout;
mod config;
mod confidence;
mod covariance;
mod results;

pub use checkout::ParameterCheckout;
pub use config::{coverage, DeltaStatPolicy, EstimatorConfig};
pub use confidence::{Bound, BoundSearch, SearchMode};
pub use covariance::{condition_number, curvature, invert, CovarianceOutcome, MAX_CONDITION};
pub use results::{BoundStatus, ErrorEstimationResult};

use crate::error::{EstError, Result};
use crate::joint::JointFitContext;
use crate::optimize::Reoptimizer;
use crate::registry::Registry;
use crate::resolve::{resolve, ErrorArg};
use crate::stats::Statistic;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The error-estimation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMethod {
    Covariance,
    Confidence,
    Projection,
}

impl ErrorMethod {
    pub const ALL: [ErrorMethod; 3] = [
        ErrorMethod::Covariance,
        ErrorMethod::Confidence,
        ErrorMethod::Projection,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ErrorMethod::Covariance => "covariance",
            ErrorMethod::Confidence => "confidence",
            ErrorMethod::Projection => "projection",
        }
    }

    /// Capitalized name, for report headers.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorMethod::Covariance => "Covariance",
            ErrorMethod::Confidence => "Confidence",
            ErrorMethod::Projection => "Projection",
        }
    }
}

impl fmt::Display for ErrorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ErrorMethod {
    type Err = EstError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "covar" | "covariance" => Ok(ErrorMethod::Covariance),
            "conf" | "confidence" => Ok(ErrorMethod::Confidence),
            "proj" | "projection" => Ok(ErrorMethod::Projection),
            other => Err(EstError::ArgumentType(format!(
                "'{}' is not a valid error estimation method",
                other
            ))),
        }
    }
}

/// Runs one error-estimation call against a registry.
pub struct ErrorEstimator<'a> {
    registry: &'a Registry,
    stat: Arc<dyn Statistic>,
    optimizer: &'a dyn Reoptimizer,
    config: &'a EstimatorConfig,
}

impl<'a> ErrorEstimator<'a> {
    pub fn new(
        registry: &'a Registry,
        stat: Arc<dyn Statistic>,
        optimizer: &'a dyn Reoptimizer,
        config: &'a EstimatorConfig,
    ) -> Self {
        Self {
            registry,
            stat,
            optimizer,
            config,
        }
    }

    /// Estimate bounds for the parameters selected by `args`.
    ///
    /// The current parameter values are taken as the best fit. Argument,
    /// identifier and parameter errors are raised before the statistic is
    /// evaluated; numerical failures are recorded per bound.
    pub fn estimate(&self, method: ErrorMethod, args: &[ErrorArg]) -> Result<ErrorEstimationResult> {
        let resolved = resolve(self.registry, args)?;
        let delta = self.config.validate()?;

        let ctx = JointFitContext::build(self.registry, &resolved.ids, Arc::clone(&self.stat))?;
        if ctx.free_params().is_empty() {
            return Err(EstError::Parameter("no thawed parameters found".to_string()));
        }

        let targets: Vec<usize> = if resolved.params.is_empty() {
            (0..ctx.free_params().len()).collect()
        } else {
            resolved
                .params
                .iter()
                .map(|p| {
                    ctx.index_of(p).ok_or_else(|| {
                        EstError::Parameter(format!(
                            "parameter '{}' is not a free parameter of the fit",
                            p.fullname()
                        ))
                    })
                })
                .collect::<Result<_>>()?
        };

        let checkout = ParameterCheckout::new(ctx.free_params());
        let best = ctx.values();
        let statval = ctx.statistic(&best)?;
        log::debug!(
            "{}: {} parameter(s) over data set(s) {:?}, statistic {}",
            method,
            targets.len(),
            resolved.ids,
            statval
        );

        let outcome = covariance::estimate(&ctx, &best, self.config.eps, delta)?;

        let (lower, upper, covariance, new_minimum) = match method {
            ErrorMethod::Covariance => {
                let mut lower = Vec::with_capacity(targets.len());
                let mut upper = Vec::with_capacity(targets.len());
                for &i in &targets {
                    let (lo, hi) = match outcome.errors[i] {
                        Some(err) => (
                            Bound {
                                offset: Some(-err),
                                status: BoundStatus::Converged,
                                new_minimum: false,
                            },
                            Bound {
                                offset: Some(err),
                                status: BoundStatus::Converged,
                                new_minimum: false,
                            },
                        ),
                        None => (undetermined(), undetermined()),
                    };
                    lower.push(lo);
                    upper.push(hi);
                }
                let covariance = outcome.matrix.as_ref().map(|m| {
                    Array2::from_shape_fn((targets.len(), targets.len()), |(a, b)| {
                        m[[targets[a], targets[b]]]
                    })
                });
                (lower, upper, covariance, false)
            }
            ErrorMethod::Confidence | ErrorMethod::Projection => {
                let mode = if method == ErrorMethod::Projection {
                    SearchMode::Profile(self.optimizer)
                } else {
                    SearchMode::Fixed
                };
                let bounds = ctx.bounds();
                let search = BoundSearch {
                    ctx: &ctx,
                    best: &best,
                    bounds: &bounds,
                    statval,
                    delta,
                    config: self.config,
                    mode,
                    mirror: !self.parallel(),
                };
                let seeds: Vec<f64> = targets
                    .iter()
                    .map(|&i| match outcome.errors[i] {
                        Some(err) => err,
                        None => self.config.eps * best[i].abs().max(1.0),
                    })
                    .collect();

                let pairs = self.search_all(&search, &targets, &seeds)?;
                let new_minimum = pairs.iter().any(|(lo, hi)| lo.new_minimum || hi.new_minimum);
                let (lower, upper): (Vec<Bound>, Vec<Bound>) = pairs.into_iter().unzip();
                (lower, upper, None, new_minimum)
            }
        };

        let new_minimum = new_minimum || outcome.lowest < statval - self.config.tol;
        if new_minimum {
            log::warn!("{}: a lower statistic than the best fit was found; refit and try again", method);
        }

        let free = ctx.free_params();
        let parvals: Vec<f64> = checkout.values().collect();
        let result = ErrorEstimationResult {
            method,
            datasets: resolved.ids,
            parnames: targets.iter().map(|&i| free[i].fullname()).collect(),
            parvals: targets.iter().map(|&i| parvals[i]).collect(),
            parmins: lower.iter().map(|b| b.offset).collect(),
            parmaxes: upper.iter().map(|b| b.offset).collect(),
            lower_status: lower.iter().map(|b| b.status).collect(),
            upper_status: upper.iter().map(|b| b.status).collect(),
            sigma: self.config.sigma,
            percent: self.config.percent(),
            statname: ctx.stat_name().to_string(),
            fitname: self.optimizer.name().to_string(),
            statval,
            numpoints: ctx.numpoints(),
            nfits: ctx.evaluations(),
            covariance,
            new_minimum,
        };

        drop(checkout);
        Ok(result)
    }

    fn parallel(&self) -> bool {
        cfg!(feature = "parallel") && self.config.parallel
    }

    fn search_all(&self, search: &BoundSearch<'_, '_>, targets: &[usize], seeds: &[f64]) -> Result<Vec<(Bound, Bound)>> {
        let both = |(&idx, &seed): (&usize, &f64)| -> Result<(Bound, Bound)> {
            let lower = search.search(idx, -1.0, seed)?;
            let upper = search.search(idx, 1.0, seed)?;
            Ok((lower, upper))
        };

        #[cfg(feature = "parallel")]
        {
            if self.parallel() {
                use rayon::prelude::*;
                return targets.par_iter().zip(seeds.par_iter()).map(&both).collect();
            }
        }

        targets.iter().zip(seeds.iter()).map(&both).collect()
    }
}

fn undetermined() -> Bound {
    Bound {
        offset: None,
        status: BoundStatus::Undetermined,
        new_minimum: false,
    }
}
