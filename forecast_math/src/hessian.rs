//! Finite-difference Hessians and the standard errors they imply
//!
//! For a negative log-likelihood `f`, the Hessian at the optimum is the
//! observed information; its inverse is the asymptotic covariance of the
//! estimates.

use crate::{MathError, Result};
use finitediff::FiniteDiff;
use nalgebra::DMatrix;

/// Step in each parameter for the second differences (about `ε^{1/3}`)
const STEP: f64 = 1e-5;

/// Finite-difference Hessian of `f` at `x`, symmetrized.
///
/// `finitediff` perturbs by `√ε`, too small for second differences of a
/// likelihood in the hundreds, so the Hessian is taken in coordinates
/// `z = (θ - x) / scale`, where one `√ε` step in `z` moves `θ` by [`STEP`].
pub fn finite_difference_hessian<F>(f: &F, x: &[f64]) -> Result<DMatrix<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let n = x.len();
    if !f(x).is_finite() {
        return Err(MathError::CalculationError(
            "Function is not finite at the evaluation point".to_string(),
        ));
    }

    let scale = STEP / f64::EPSILON.sqrt();
    let stretched = |z: &Vec<f64>| {
        let theta: Vec<f64> = x.iter().zip(z).map(|(xi, zi)| xi + scale * zi).collect();
        f(&theta)
    };
    let rows = vec![0.0; n].forward_hessian_nograd(&stretched);
    if rows.len() != n || rows.iter().any(|row| row.len() != n) {
        return Err(MathError::CalculationError(format!(
            "Hessian has the wrong shape for {} parameters",
            n
        )));
    }

    let mut hess = DMatrix::from_fn(n, n, |i, j| rows[i][j] / (scale * scale));
    symmetrize(&mut hess);
    if hess.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Hessian contains non-finite entries".to_string(),
        ));
    }

    Ok(hess)
}

fn symmetrize(hess: &mut DMatrix<f64>) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[(i, j)] + hess[(j, i)]);
            hess[(i, j)] = avg;
            hess[(j, i)] = avg;
        }
    }
}

/// Inverse of a symmetric information matrix, `None` when it is singular.
pub fn covariance_from_information(information: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let mut symmetric = information.clone();
    symmetrize(&mut symmetric);
    symmetric.try_inverse()
}

/// Standard errors at the minimum `x` of the negative log-likelihood `f`.
///
/// Entries are NaN when the information matrix is singular or the implied
/// variance is not positive.
pub fn standard_errors<F>(f: &F, x: &[f64]) -> Result<Vec<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if x.is_empty() {
        return Ok(Vec::new());
    }
    let information = finite_difference_hessian(f, x)?;
    let se = match covariance_from_information(&information) {
        Some(cov) => (0..x.len())
            .map(|i| {
                let var = cov[(i, i)];
                if var > 0.0 {
                    var.sqrt()
                } else {
                    f64::NAN
                }
            })
            .collect(),
        None => vec![f64::NAN; x.len()],
    };
    Ok(se)
}
