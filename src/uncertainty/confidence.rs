//! # Confidence and Projection Bound Search
//!
//! For one parameter and one direction, find the value at which the joint
//! statistic has risen by Δ above its best-fit value. The search steps
//! outwards from the best fit, doubling the step until the rise is bracketed
//! or the hard limit is reached, then refines the root with Illinois false
//! position.
//!
//! In confidence mode the other free parameters stay at the best fit. In
//! projection mode they are re-optimized at every trial value, warm-started
//! from the previous trial in the same direction.

use super::config::EstimatorConfig;
use super::results::BoundStatus;
use crate::error::Result;
use crate::joint::JointFitContext;
use crate::optimize::Reoptimizer;
use crate::parameters::Bounds;
use ndarray::Array1;

/// How the other free parameters are treated at a trial value.
#[derive(Clone, Copy)]
pub enum SearchMode<'o> {
    /// Held at the best fit
    Fixed,
    /// Re-optimized with the given optimizer
    Profile(&'o dyn Reoptimizer),
}

/// Outcome of one directional search.
#[derive(Debug, Clone, Copy)]
pub struct Bound {
    /// Offset from the best-fit value
    pub offset: Option<f64>,
    pub status: BoundStatus,
    /// A statistic below the best fit was seen
    pub new_minimum: bool,
}

/// One parameter's search state shared by both directions.
pub struct BoundSearch<'s, 'a> {
    pub ctx: &'s JointFitContext<'a>,
    pub best: &'s Array1<f64>,
    pub bounds: &'s [Bounds],
    pub statval: f64,
    pub delta: f64,
    pub config: &'s EstimatorConfig,
    pub mode: SearchMode<'s>,
    /// Write each trial vector into the live bindings
    pub mirror: bool,
}

struct Trial {
    /// Full vector of the trial, others re-optimized in projection mode
    x: Array1<f64>,
    /// Statistic minus best-fit statistic minus Δ
    f: f64,
}

impl BoundSearch<'_, '_> {
    fn evaluate(&self, idx: usize, value: f64, warm: &Array1<f64>) -> Result<Trial> {
        let mut x = warm.clone();
        x[idx] = value;

        let stat = match self.mode {
            SearchMode::Profile(optimizer) if x.len() > 1 => {
                let others: Vec<usize> = (0..x.len()).filter(|&k| k != idx).collect();
                let start: Array1<f64> = others.iter().map(|&k| x[k]).collect();
                let sub_bounds: Vec<Bounds> = others.iter().map(|&k| self.bounds[k]).collect();

                let compose = |sub: &Array1<f64>| -> Array1<f64> {
                    let mut full = x.clone();
                    for (&k, &v) in others.iter().zip(sub.iter()) {
                        full[k] = v;
                    }
                    full
                };
                let objective = |sub: &Array1<f64>| self.ctx.statistic(&compose(sub));
                let result = optimizer.reoptimize(&objective, &start, &sub_bounds)?;
                let full = compose(&result.params);
                let cost = result.cost;
                x = full;
                cost
            }
            _ => self.ctx.statistic(&x)?,
        };

        if self.mirror {
            self.ctx.apply(&x)?;
        }
        Ok(Trial {
            x,
            f: stat - self.statval - self.delta,
        })
    }

    /// Search from the best fit of parameter `idx` towards `direction`
    /// (negative for the lower bound).
    pub fn search(&self, idx: usize, direction: f64, seed: f64) -> Result<Bound> {
        let name = self.ctx.free_params()[idx].fullname();
        let x0 = self.best[idx];
        let limit = if direction < 0.0 {
            self.bounds[idx].min
        } else {
            self.bounds[idx].max
        };
        let side = if direction < 0.0 { "lower" } else { "upper" };

        // statistic below the best fit
        let below_best = -self.delta - self.config.tol;
        let mut new_minimum = false;

        // beyond this span, trial values no longer resolve the statistic
        let max_span = x0.abs().max(seed) / f64::EPSILON.sqrt();

        // bracket
        let mut warm = self.best.clone();
        let (mut a, mut fa) = (x0, -self.delta);
        let mut step = seed;
        let mut expansions = 0;
        let (b, fb) = loop {
            let mut trial = x0 + direction * step;
            let at_limit = if direction < 0.0 { trial <= limit } else { trial >= limit };
            if at_limit {
                trial = limit;
            } else if step > max_span {
                log::warn!(
                    "{} {} bound: the statistic stays flat up to an offset of {:e}",
                    name,
                    side,
                    step
                );
                return Ok(Bound {
                    offset: None,
                    status: BoundStatus::Undetermined,
                    new_minimum,
                });
            }

            let t = self.evaluate(idx, trial, &warm)?;
            new_minimum |= t.f < below_best;
            if t.f >= 0.0 {
                break (trial, t.f);
            }
            if at_limit {
                log::warn!("{} {} bound: hit hard limit {}", name, side, limit);
                return Ok(Bound {
                    offset: None,
                    status: BoundStatus::HardLimit,
                    new_minimum,
                });
            }

            a = trial;
            fa = t.f;
            warm = t.x;
            expansions += 1;
            if expansions >= self.config.max_expansions {
                log::warn!(
                    "{} {} bound: no bracket after {} expansions",
                    name,
                    side,
                    expansions
                );
                return Ok(Bound {
                    offset: None,
                    status: BoundStatus::Undetermined,
                    new_minimum,
                });
            }
            step *= 2.0;
        };
        log::debug!("{} {} bound bracketed in [{}, {}]", name, side, a, b);

        if fb <= self.config.tol {
            return Ok(Bound {
                offset: Some(b - x0),
                status: BoundStatus::Converged,
                new_minimum,
            });
        }

        // Illinois false position
        let (mut a, mut fa, mut b, mut fb) = (a, fa, b, fb);
        let mut retained = 0i8;
        for iteration in 0..self.config.maxiters {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            let mut c = b - fb * (b - a) / (fb - fa);
            if !(c > lo && c < hi) {
                c = 0.5 * (a + b);
            }

            let t = self.evaluate(idx, c, &warm)?;
            new_minimum |= t.f < below_best;
            let collapsed = (hi - lo) <= 4.0 * f64::EPSILON * c.abs().max(1.0);
            if t.f.abs() <= self.config.tol || collapsed {
                log::debug!("{} {} bound converged after {} iterations", name, side, iteration + 1);
                return Ok(Bound {
                    offset: Some(c - x0),
                    status: BoundStatus::Converged,
                    new_minimum,
                });
            }

            if t.f < 0.0 {
                a = c;
                fa = t.f;
                warm = t.x;
                if retained == -1 {
                    fb *= 0.5;
                }
                retained = -1;
            } else {
                b = c;
                fb = t.f;
                if retained == 1 {
                    fa *= 0.5;
                }
                retained = 1;
            }
        }

        log::warn!(
            "{} {} bound: {} iterations exhausted, reporting reduced precision",
            name,
            side,
            self.config.maxiters
        );
        let estimate = if fa.abs() < fb.abs() { a } else { b };
        Ok(Bound {
            offset: Some(estimate - x0),
            status: BoundStatus::ReducedPrecision,
            new_minimum,
        })
    }
}
