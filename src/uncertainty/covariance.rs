//! # Covariance Matrix Calculations
//!
//! The covariance matrix is the inverse of the curvature matrix, half the
//! Hessian of the joint statistic at the best fit. Rows with no usable
//! curvature (zero, negative or non-finite diagonal) are dropped before the
//! inversion and their parameters reported as undetermined. A curvature
//! matrix that is ill-conditioned after scaling to unit diagonal is treated
//! as singular: finite-difference noise can make a degenerate matrix
//! invertible, with meaningless errors.

use crate::error::Result;
use crate::joint::JointFitContext;
use crate::utils::{hessian, nalgebra_to_ndarray, ndarray_to_nalgebra};
use ndarray::{Array1, Array2};
use std::cell::Cell;

/// Largest accepted condition number of the scaled curvature matrix.
pub const MAX_CONDITION: f64 = 1e8;

/// Covariance of the free parameters and the errors derived from it.
#[derive(Debug, Clone)]
pub struct CovarianceOutcome {
    /// Full covariance matrix; `None` unless every row could be inverted
    pub matrix: Option<Array2<f64>>,
    /// `sqrt(delta * cov_ii)` per free parameter
    pub errors: Vec<Option<f64>>,
    /// Lowest statistic seen while differencing
    pub lowest: f64,
}

/// Curvature matrix of the joint statistic at `best`, and the lowest
/// statistic evaluated on the way.
pub fn curvature(ctx: &JointFitContext<'_>, best: &Array1<f64>, eps: f64) -> Result<(Array2<f64>, f64)> {
    let lowest = Cell::new(f64::INFINITY);
    let hess = hessian(
        |x| {
            let stat = ctx.statistic(x)?;
            if stat < lowest.get() {
                lowest.set(stat);
            }
            Ok(stat)
        },
        best,
        Some(eps),
    )?;
    Ok((hess * 0.5, lowest.get()))
}

/// Condition number of `matrix` after scaling it to unit diagonal.
///
/// Infinite when the matrix is singular or has a non-positive diagonal.
pub fn condition_number(matrix: &Array2<f64>) -> f64 {
    let n = matrix.nrows();
    if n == 0 {
        return 1.0;
    }
    if matrix.diag().iter().any(|&d| !(d > 0.0)) {
        return f64::INFINITY;
    }
    let scale: Vec<f64> = matrix.diag().iter().map(|d| 1.0 / d.sqrt()).collect();
    let scaled = Array2::from_shape_fn((n, n), |(i, j)| matrix[[i, j]] * scale[i] * scale[j]);

    let svd = ndarray_to_nalgebra(&scaled).svd(false, false);
    let s_max = svd.singular_values.iter().fold(0.0_f64, |a, &b| a.max(b));
    let s_min = svd.singular_values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    if s_min > 0.0 && s_max.is_finite() {
        s_max / s_min
    } else {
        f64::INFINITY
    }
}

/// Invert a symmetric matrix: Cholesky first, LU if that fails.
pub fn invert(matrix: &Array2<f64>) -> Option<Array2<f64>> {
    let mat = ndarray_to_nalgebra(matrix);
    let inverse = match mat.clone().cholesky() {
        Some(chol) => chol.inverse(),
        None => mat.try_inverse()?,
    };
    if inverse.iter().all(|v| v.is_finite()) {
        Some(nalgebra_to_ndarray(&inverse))
    } else {
        None
    }
}

/// Covariance errors for all free parameters of `ctx`.
pub fn estimate(ctx: &JointFitContext<'_>, best: &Array1<f64>, eps: f64, delta: f64) -> Result<CovarianceOutcome> {
    let n = best.len();
    let (curv, lowest) = curvature(ctx, best, eps)?;

    let usable: Vec<usize> = (0..n)
        .filter(|&i| curv[[i, i]].is_finite() && curv[[i, i]] > 0.0 && curv.row(i).iter().all(|v| v.is_finite()))
        .collect();
    for (i, param) in ctx.free_params().iter().enumerate() {
        if !usable.contains(&i) {
            log::warn!(
                "no curvature along {}; its covariance error is undetermined",
                param.fullname()
            );
        }
    }

    let reduced = Array2::from_shape_fn((usable.len(), usable.len()), |(a, b)| {
        curv[[usable[a], usable[b]]]
    });

    let mut errors = vec![None; n];
    if usable.is_empty() {
        return Ok(CovarianceOutcome { matrix: None, errors, lowest });
    }

    let cond = condition_number(&reduced);
    if cond > MAX_CONDITION {
        log::warn!(
            "curvature condition number = {:.1e}: the parameters are not identifiable; covariance errors are undetermined",
            cond
        );
        return Ok(CovarianceOutcome { matrix: None, errors, lowest });
    }

    let inverse = match invert(&reduced) {
        Some(inv) => inv,
        None => {
            log::warn!("the curvature matrix is singular; covariance errors are undetermined");
            return Ok(CovarianceOutcome { matrix: None, errors, lowest });
        }
    };

    for (a, &i) in usable.iter().enumerate() {
        let var = inverse[[a, a]];
        if var > 0.0 {
            errors[i] = Some((delta * var).sqrt());
        } else {
            log::warn!(
                "negative variance for {}; the curvature matrix is not positive definite",
                ctx.free_params()[i].fullname()
            );
        }
    }

    let matrix = if usable.len() == n && errors.iter().all(|e| e.is_some()) {
        Some(inverse)
    } else {
        None
    };
    Ok(CovarianceOutcome { matrix, errors, lowest })
}
