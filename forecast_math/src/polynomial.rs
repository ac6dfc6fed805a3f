//! Lag-polynomial algebra for (seasonal) ARMA processes
//!
//! Polynomials are stored as coefficient vectors indexed by the power of the
//! backshift operator `B`, so `[1.0, -0.5]` is `1 - 0.5B`.
//!
//! Sign conventions follow the usual ARMA notation:
//! - AR operator: `φ(B) = 1 - φ₁B - … - φₚBᵖ`
//! - MA operator: `θ(B) = 1 + θ₁B + … + θ_qB^q`

use crate::{MathError, Result};

/// Product of two polynomials
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// AR operator `1 - φ₁B^s - φ₂B^{2s} - …` for coefficients spaced `spacing` apart
pub fn ar_operator(coefficients: &[f64], spacing: usize) -> Vec<f64> {
    spaced_operator(coefficients, spacing, -1.0)
}

/// MA operator `1 + θ₁B^s + θ₂B^{2s} + …` for coefficients spaced `spacing` apart
pub fn ma_operator(coefficients: &[f64], spacing: usize) -> Vec<f64> {
    spaced_operator(coefficients, spacing, 1.0)
}

fn spaced_operator(coefficients: &[f64], spacing: usize, sign: f64) -> Vec<f64> {
    let spacing = spacing.max(1);
    let mut out = vec![0.0; coefficients.len() * spacing + 1];
    out[0] = 1.0;
    for (k, &c) in coefficients.iter().enumerate() {
        out[(k + 1) * spacing] = sign * c;
    }
    out
}

/// Differencing operator `(1 - B)^d (1 - B^s)^D`
pub fn difference_operator(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut out = vec![1.0];
    for _ in 0..d {
        out = multiply(&out, &[1.0, -1.0]);
    }
    if period > 0 {
        for _ in 0..seasonal_d {
            out = multiply(&out, &ar_operator(&[1.0], period));
        }
    }
    out
}

/// Recursion coefficients of an AR operator: for `1 + c₁B + …` returns
/// `[-c₁, -c₂, …]`, the weights in `x_t = Σ a_i x_{t-i} + …`.
pub fn recursion_coefficients(operator: &[f64]) -> Vec<f64> {
    operator.iter().skip(1).map(|c| -c).collect()
}

/// First `n` ψ-weights of the MA(∞) representation `θ(B) / φ(B)`.
///
/// `ar` is the full AR operator (including any differencing factors) and `ma`
/// the full MA operator, both with a leading `1`.
pub fn psi_weights(ar: &[f64], ma: &[f64], n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        let mut value = if j == 0 {
            1.0
        } else {
            ma.get(j).copied().unwrap_or(0.0)
        };
        for i in 1..=j.min(ar.len().saturating_sub(1)) {
            value -= ar[i] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}

/// Map unconstrained reals to the coefficients of a stationary AR operator.
///
/// Each input is squashed with `tanh` into a partial autocorrelation in
/// `(-1, 1)` and the Durbin–Levinson recursion turns the sequence into
/// coefficients `φ` with all roots of `1 - Σ φ_i zⁱ` outside the unit circle.
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(unconstrained.len());
    for (k, &u) in unconstrained.iter().enumerate() {
        let r = u.tanh();
        let mut next: Vec<f64> = (0..k).map(|j| phi[j] - r * phi[k - 1 - j]).collect();
        next.push(r);
        phi = next;
    }
    phi
}

/// Inverse of [`constrain_stationary`].
///
/// Fails when the coefficients do not describe a stationary operator.
pub fn unconstrain_stationary(coefficients: &[f64]) -> Result<Vec<f64>> {
    let p = coefficients.len();
    let mut phi = coefficients.to_vec();
    let mut partials = vec![0.0; p];

    for k in (0..p).rev() {
        let r = phi[k];
        if r.abs() >= 1.0 {
            return Err(MathError::InvalidInput(format!(
                "Coefficients {:?} are not stationary",
                coefficients
            )));
        }
        partials[k] = r;
        let denom = 1.0 - r * r;
        let prev: Vec<f64> = (0..k).map(|j| (phi[j] + r * phi[k - 1 - j]) / denom).collect();
        phi = prev;
    }

    Ok(partials.into_iter().map(|r| r.atanh()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn multiply_seasonal_ma() {
        // (1 + 0.3B)(1 + 0.5B^2) = 1 + 0.3B + 0.5B^2 + 0.15B^3
        let out = multiply(&ma_operator(&[0.3], 1), &ma_operator(&[0.5], 2));
        assert_eq!(out.len(), 4);
        assert_relative_eq!(out[1], 0.3);
        assert_relative_eq!(out[2], 0.5);
        assert_relative_eq!(out[3], 0.15, epsilon = 1e-12);
    }

    #[test]
    fn difference_operator_expands() {
        // (1 - B)(1 - B^4) = 1 - B - B^4 + B^5
        let op = difference_operator(1, 1, 4);
        assert_eq!(op, vec![1.0, -1.0, 0.0, 0.0, -1.0, 1.0]);
        assert_eq!(difference_operator(0, 0, 12), vec![1.0]);
    }

    #[test]
    fn psi_weights_of_ar1() {
        let psi = psi_weights(&ar_operator(&[0.5], 1), &[1.0], 4);
        assert_relative_eq!(psi[0], 1.0);
        assert_relative_eq!(psi[1], 0.5);
        assert_relative_eq!(psi[2], 0.25);
        assert_relative_eq!(psi[3], 0.125);
    }

    #[test]
    fn psi_weights_of_random_walk_are_ones() {
        let psi = psi_weights(&difference_operator(1, 0, 0), &[1.0], 5);
        assert!(psi.iter().all(|&w| (w - 1.0).abs() < 1e-12));
    }

    #[test]
    fn stationary_transform_round_trip() {
        let u = [0.4, -1.2, 0.7];
        let phi = constrain_stationary(&u);
        let back = unconstrain_stationary(&phi).unwrap();
        for (a, b) in u.iter().zip(back.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn explosive_coefficients_are_rejected() {
        assert!(unconstrain_stationary(&[1.2]).is_err());
    }
}
