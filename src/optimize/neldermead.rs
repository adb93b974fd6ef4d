//! Bounded Nelder-Mead simplex minimizer.
//!
//! Trial points are clipped into the hard limits. After the simplex
//! converges it is rebuilt around the best vertex and the search restarted,
//! which guards against the simplex collapsing onto a non-stationary point.

use super::{clip_to_bounds, Objective, OptResult, Reoptimizer};
use crate::error::{EstError, Result};
use crate::parameters::Bounds;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const RHO: f64 = 1.0;
const CHI: f64 = 2.0;
const PSI: f64 = 0.5;
const SIGMA: f64 = 0.5;

/// Step used for a zero-valued start component.
const ZERO_STEP: f64 = 0.00025;

/// Configuration options for [`NelderMead`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NelderMeadConfig {
    /// Absolute spread of objective values across the simplex at convergence. Default: 1e-10
    pub ftol: f64,

    /// Absolute spread of vertices at convergence. Default: 1e-8
    pub xtol: f64,

    /// Maximum function evaluations; `None` means `1000 * (n + 1)`. Default: None
    pub maxfev: Option<usize>,

    /// Relative size of the initial simplex. Default: 0.05
    pub initial_step: f64,

    /// Simplex rebuilds after the first convergence. Default: 2
    pub restarts: usize,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            ftol: 1e-10,
            xtol: 1e-8,
            maxfev: None,
            initial_step: 0.05,
            restarts: 2,
        }
    }
}

/// Bounded Nelder-Mead minimizer.
#[derive(Debug, Clone, Default)]
pub struct NelderMead {
    config: NelderMeadConfig,
}

struct Run {
    best: Array1<f64>,
    cost: f64,
    iterations: usize,
    converged: bool,
}

struct Counter<'a, 'b> {
    objective: &'a Objective<'b>,
    nfev: usize,
}

impl Counter<'_, '_> {
    fn eval(&mut self, x: &Array1<f64>) -> Result<f64> {
        self.nfev += 1;
        let value = (self.objective)(x)?;
        Ok(if value.is_nan() { f64::INFINITY } else { value })
    }
}

impl NelderMead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NelderMeadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NelderMeadConfig {
        &self.config
    }

    fn initial_simplex(&self, x0: &Array1<f64>, bounds: &[Bounds]) -> Vec<Array1<f64>> {
        let mut simplex = Vec::with_capacity(x0.len() + 1);
        simplex.push(x0.clone());
        for i in 0..x0.len() {
            let delta = if x0[i] != 0.0 {
                self.config.initial_step * x0[i]
            } else {
                ZERO_STEP
            };
            let mut vertex = x0.clone();
            vertex[i] = bounds[i].clamp(x0[i] + delta);
            if vertex[i] == x0[i] {
                // sitting on a limit, step inwards
                vertex[i] = bounds[i].clamp(x0[i] - delta);
            }
            simplex.push(vertex);
        }
        simplex
    }

    fn converged(&self, simplex: &[Array1<f64>], fvals: &[f64]) -> bool {
        if fvals.iter().any(|f| !f.is_finite()) {
            return false;
        }
        let fspread = fvals[1..]
            .iter()
            .map(|f| (f - fvals[0]).abs())
            .fold(0.0, f64::max);
        let xspread = simplex[1..]
            .iter()
            .map(|x| {
                x.iter()
                    .zip(simplex[0].iter())
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0, f64::max)
            })
            .fold(0.0, f64::max);
        fspread <= self.config.ftol && xspread <= self.config.xtol
    }

    fn run(&self, counter: &mut Counter<'_, '_>, start: &Array1<f64>, bounds: &[Bounds], maxfev: usize) -> Result<Run> {
        let n = start.len();
        let mut simplex = self.initial_simplex(start, bounds);
        let mut fvals = simplex
            .iter()
            .map(|x| counter.eval(x))
            .collect::<Result<Vec<f64>>>()?;
        let mut iterations = 0;
        let mut converged = false;

        loop {
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| fvals[a].partial_cmp(&fvals[b]).unwrap_or(Ordering::Equal));
            simplex = order.iter().map(|&i| simplex[i].clone()).collect();
            fvals = order.iter().map(|&i| fvals[i]).collect();

            if self.converged(&simplex, &fvals) {
                converged = true;
                break;
            }
            if counter.nfev >= maxfev {
                break;
            }
            iterations += 1;

            let centroid = simplex[..n]
                .iter()
                .fold(Array1::<f64>::zeros(n), |acc, x| acc + x)
                / n as f64;
            let worst = simplex[n].clone();

            let xr = clip_to_bounds(&(&centroid + &((&centroid - &worst) * RHO)), bounds);
            let fr = counter.eval(&xr)?;

            if fr < fvals[0] {
                let xe = clip_to_bounds(&(&centroid + &((&xr - &centroid) * CHI)), bounds);
                let fe = counter.eval(&xe)?;
                if fe < fr {
                    simplex[n] = xe;
                    fvals[n] = fe;
                } else {
                    simplex[n] = xr;
                    fvals[n] = fr;
                }
                continue;
            }

            if fr < fvals[n - 1] {
                simplex[n] = xr;
                fvals[n] = fr;
                continue;
            }

            let outside = fr < fvals[n];
            let xc = if outside {
                &centroid + &((&xr - &centroid) * PSI)
            } else {
                &centroid + &((&worst - &centroid) * PSI)
            };
            let xc = clip_to_bounds(&xc, bounds);
            let fc = counter.eval(&xc)?;
            let accept = if outside { fc <= fr } else { fc < fvals[n] };

            if accept {
                simplex[n] = xc;
                fvals[n] = fc;
            } else {
                for i in 1..=n {
                    let shrunk = &simplex[0] + &((&simplex[i] - &simplex[0]) * SIGMA);
                    simplex[i] = clip_to_bounds(&shrunk, bounds);
                    fvals[i] = counter.eval(&simplex[i])?;
                }
            }
        }

        Ok(Run {
            best: simplex[0].clone(),
            cost: fvals[0],
            iterations,
            converged,
        })
    }
}

impl Reoptimizer for NelderMead {
    fn name(&self) -> &str {
        "neldermead"
    }

    fn reoptimize(&self, objective: &Objective<'_>, start: &Array1<f64>, bounds: &[Bounds]) -> Result<OptResult> {
        if bounds.len() != start.len() {
            return Err(EstError::DimensionMismatch(format!(
                "{} start values but {} bounds",
                start.len(),
                bounds.len()
            )));
        }

        let mut counter = Counter { objective, nfev: 0 };
        let start = clip_to_bounds(start, bounds);

        if start.is_empty() {
            let cost = counter.eval(&start)?;
            return Ok(OptResult {
                params: start,
                cost,
                iterations: 0,
                nfev: counter.nfev,
                success: true,
                message: "no free parameters".to_string(),
            });
        }

        let maxfev = self.config.maxfev.unwrap_or(1000 * (start.len() + 1));
        let mut run = self.run(&mut counter, &start, bounds, maxfev)?;
        let mut iterations = run.iterations;

        for _ in 0..self.config.restarts {
            if !run.converged || counter.nfev >= maxfev {
                break;
            }
            let next = self.run(&mut counter, &run.best, bounds, maxfev)?;
            iterations += next.iterations;
            let improvement = run.cost - next.cost;
            if next.cost <= run.cost {
                run = Run { iterations: 0, ..next };
            }
            if improvement <= self.config.ftol {
                break;
            }
        }

        let message = if run.converged {
            "simplex converged".to_string()
        } else {
            format!("maximum number of function evaluations ({}) reached", maxfev)
        };
        log::debug!(
            "neldermead: cost {:.6e} after {} evaluations ({})",
            run.cost,
            counter.nfev,
            message
        );

        Ok(OptResult {
            params: run.best,
            cost: run.cost,
            iterations,
            nfev: counter.nfev,
            success: run.converged,
            message,
        })
    }
}
