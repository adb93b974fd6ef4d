//! Finite difference methods for numerical differentiation.

use crate::error::{EstError, Result};
use ndarray::{Array1, Array2};

/// Default relative step size.
const DEFAULT_EPSILON: f64 = 1e-4;

/// Step for component `value`: relative to its magnitude, absolute near zero.
pub fn step_size(value: f64, epsilon: f64) -> f64 {
    if value.abs() > epsilon {
        value.abs() * epsilon
    } else {
        epsilon
    }
}

/// Compute the Hessian matrix using central finite differences.
///
/// The Hessian is the matrix of second partial derivatives of the function with
/// respect to the parameters: H[i,j] = ∂²f/∂param[i]∂param[j].
///
/// # Arguments
///
/// * `f` - The function to differentiate
/// * `params` - The parameter values at which to evaluate the Hessian
/// * `epsilon` - The relative step size (optional, default 1e-4)
///
/// # Returns
///
/// * `Result<Array2<f64>>` - The Hessian matrix
pub fn hessian<F>(f: F, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    if !(eps > 0.0) {
        return Err(EstError::InvalidInput(format!(
            "finite difference step must be positive, got {}",
            eps
        )));
    }

    let n_params = params.len();
    let mut hess = Array2::zeros((n_params, n_params));
    let steps: Vec<f64> = params.iter().map(|&p| step_size(p, eps)).collect();

    let f0 = f(params)?;

    let shifted = |moves: &[(usize, f64)]| -> Result<f64> {
        let mut x = params.clone();
        for &(k, delta) in moves {
            x[k] += delta;
        }
        f(&x)
    };

    for i in 0..n_params {
        let eps_i = steps[i];

        let f_p = shifted(&[(i, eps_i)])?;
        let f_m = shifted(&[(i, -eps_i)])?;
        hess[[i, i]] = (f_p - 2.0 * f0 + f_m) / (eps_i * eps_i);

        for j in 0..i {
            let eps_j = steps[j];
            let f_pp = shifted(&[(i, eps_i), (j, eps_j)])?;
            let f_pm = shifted(&[(i, eps_i), (j, -eps_j)])?;
            let f_mp = shifted(&[(i, -eps_i), (j, eps_j)])?;
            let f_mm = shifted(&[(i, -eps_i), (j, -eps_j)])?;

            hess[[i, j]] = (f_pp - f_pm - f_mp + f_mm) / (4.0 * eps_i * eps_j);
            hess[[j, i]] = hess[[i, j]];
        }
    }

    Ok(hess)
}
