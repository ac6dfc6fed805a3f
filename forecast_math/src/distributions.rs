//! Reference distributions for hypothesis tests and interval construction

use crate::{MathError, Result};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal, StudentsT};

/// Two-sided standard normal critical value for significance level `alpha`,
/// i.e. `Φ⁻¹(1 - alpha / 2)`.
pub fn normal_critical_value(alpha: f64) -> Result<f64> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Significance level must be in (0, 1), got {}",
            alpha
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(format!("Normal distribution: {}", e)))?;
    Ok(normal.inverse_cdf(1.0 - alpha / 2.0))
}

/// Upper-tail probability `P(X > x)` for a chi-squared variable with `df`
/// degrees of freedom.
pub fn chi_squared_sf(x: f64, df: usize) -> Result<f64> {
    if df == 0 {
        return Err(MathError::InvalidInput(
            "Chi-squared degrees of freedom must be positive".to_string(),
        ));
    }
    if x.is_nan() {
        return Ok(f64::NAN);
    }
    if x <= 0.0 {
        return Ok(1.0);
    }
    let dist = ChiSquared::new(df as f64)
        .map_err(|e| MathError::CalculationError(format!("Chi-squared distribution: {}", e)))?;
    Ok((1.0 - dist.cdf(x)).clamp(0.0, 1.0))
}

/// Two-sided p-value of a Student-t statistic with `df` degrees of freedom
pub fn students_t_two_sided(statistic: f64, df: usize) -> Result<f64> {
    if df == 0 {
        return Err(MathError::InvalidInput(
            "Student-t degrees of freedom must be positive".to_string(),
        ));
    }
    let dist = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| MathError::CalculationError(format!("Student-t distribution: {}", e)))?;
    Ok((2.0 * dist.cdf(-statistic.abs())).clamp(0.0, 1.0))
}
