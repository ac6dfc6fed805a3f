//! Derivative-free minimization with the Nelder–Mead simplex method
//!
//! The likelihood surfaces minimized here are smooth but have no cheap
//! analytic gradient, so the simplex search is run one or more times, each
//! restart building a fresh simplex around the best vertex found so far.

use crate::{MathError, Result};

/// Tuning parameters for [`NelderMead`]
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum iterations per simplex run
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values in the simplex
    pub f_tolerance: f64,
    /// Absolute tolerance on the simplex diameter
    pub x_tolerance: f64,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub rho: f64,
    /// Shrink coefficient
    pub sigma: f64,
    /// Edge length of the first simplex
    pub initial_step: f64,
    /// Edge length of the simplex built on each restart
    pub restart_step: f64,
    /// Number of restarts after the first run
    pub restarts: usize,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            f_tolerance: 1e-10,
            x_tolerance: 1e-9,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.2,
            restart_step: 0.05,
            restarts: 2,
        }
    }
}

/// Outcome of a minimization
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations summed over all runs
    pub iterations: usize,
    /// Whether the final run met the tolerances before `max_iter`
    pub converged: bool,
}

/// Nelder–Mead simplex minimizer
#[derive(Debug, Clone, Default)]
pub struct NelderMead {
    config: NelderMeadConfig,
}

impl NelderMead {
    /// Create a minimizer with the given configuration
    pub fn new(config: NelderMeadConfig) -> Result<Self> {
        if config.max_iter == 0 {
            return Err(MathError::InvalidInput(
                "max_iter must be greater than zero".to_string(),
            ));
        }
        if config.initial_step <= 0.0 || config.restart_step <= 0.0 {
            return Err(MathError::InvalidInput(
                "Simplex step sizes must be positive".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &NelderMeadConfig {
        &self.config
    }

    /// Minimize `objective` starting from `initial`.
    ///
    /// NaN objective values are treated as `+∞`, so the objective may signal
    /// an infeasible point by returning NaN or infinity.
    pub fn minimize<F>(&self, objective: F, initial: &[f64]) -> Result<Minimum>
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |x: &[f64]| {
            let v = objective(x);
            if v.is_nan() {
                f64::INFINITY
            } else {
                v
            }
        };

        if initial.is_empty() {
            let value = eval(initial);
            return Ok(Minimum {
                point: Vec::new(),
                value,
                iterations: 0,
                converged: value.is_finite(),
            });
        }

        let start_value = eval(initial);
        if !start_value.is_finite() {
            return Err(MathError::CalculationError(
                "Objective is not finite at the starting point".to_string(),
            ));
        }

        let mut best = Minimum {
            point: initial.to_vec(),
            value: start_value,
            iterations: 0,
            converged: false,
        };

        for run in 0..=self.config.restarts {
            let step = if run == 0 {
                self.config.initial_step
            } else {
                self.config.restart_step
            };
            let previous = best.value;
            let (point, value, iterations, converged) = self.run_simplex(&eval, &best.point, step);

            best.iterations += iterations;
            best.converged = converged;
            if value <= best.value {
                best.point = point;
                best.value = value;
            }

            // Stop restarting once a run no longer improves the optimum
            if run > 0 && (previous - best.value).abs() <= self.tolerance_at(best.value) {
                break;
            }
        }

        if !best.value.is_finite() {
            return Err(MathError::CalculationError(
                "Minimization ended at a non-finite objective value".to_string(),
            ));
        }

        Ok(best)
    }

    fn tolerance_at(&self, value: f64) -> f64 {
        self.config.f_tolerance * (1.0 + value.abs())
    }

    fn run_simplex<F>(&self, eval: &F, start: &[f64], step: f64) -> (Vec<f64>, f64, usize, bool)
    where
        F: Fn(&[f64]) -> f64,
    {
        let cfg = &self.config;
        let n = start.len();

        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        simplex.push(start.to_vec());
        for i in 0..n {
            let mut vertex = start.to_vec();
            vertex[i] += step * start[i].abs().max(1.0);
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

        let mut iterations = 0;
        let mut converged = false;

        while iterations < cfg.max_iter {
            iterations += 1;

            // Order vertices from best to worst
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| {
                values[a]
                    .partial_cmp(&values[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            simplex = order.iter().map(|&i| simplex[i].clone()).collect();
            values = order.iter().map(|&i| values[i]).collect();

            let spread = values[n] - values[0];
            if spread.is_finite() && spread <= self.tolerance_at(values[0]) {
                converged = true;
                break;
            }
            if diameter(&simplex) <= cfg.x_tolerance {
                converged = true;
                break;
            }

            let centroid = centroid(&simplex[..n]);

            // Reflection
            let reflected = towards(&centroid, &simplex[n], -cfg.alpha);
            let f_reflected = eval(&reflected);

            if f_reflected >= values[0] && f_reflected < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_reflected;
                continue;
            }

            // Expansion
            if f_reflected < values[0] {
                let expanded = towards(&centroid, &reflected, cfg.gamma);
                let f_expanded = eval(&expanded);
                if f_expanded < f_reflected {
                    simplex[n] = expanded;
                    values[n] = f_expanded;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_reflected;
                }
                continue;
            }

            // Contraction
            if f_reflected < values[n] {
                let contracted = towards(&centroid, &reflected, cfg.rho);
                let f_contracted = eval(&contracted);
                if f_contracted <= f_reflected {
                    simplex[n] = contracted;
                    values[n] = f_contracted;
                    continue;
                }
            } else {
                let contracted = towards(&centroid, &simplex[n], cfg.rho);
                let f_contracted = eval(&contracted);
                if f_contracted < values[n] {
                    simplex[n] = contracted;
                    values[n] = f_contracted;
                    continue;
                }
            }

            // Shrink towards the best vertex
            let best = simplex[0].clone();
            for i in 1..=n {
                simplex[i] = towards(&best, &simplex[i], cfg.sigma);
                values[i] = eval(&simplex[i]);
            }
        }

        let best_idx = values
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);

        (
            simplex[best_idx].clone(),
            values[best_idx],
            iterations,
            converged,
        )
    }
}

/// Centroid of a set of vertices
fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let dim = vertices[0].len();
    let mut c = vec![0.0; dim];
    for v in vertices {
        for (ci, vi) in c.iter_mut().zip(v.iter()) {
            *ci += vi;
        }
    }
    let count = vertices.len() as f64;
    c.iter_mut().for_each(|ci| *ci /= count);
    c
}

/// `origin + coef * (point - origin)`
fn towards(origin: &[f64], point: &[f64], coef: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point.iter())
        .map(|(o, p)| o + coef * (p - o))
        .collect()
}

/// Largest distance from the first vertex to any other
fn diameter(simplex: &[Vec<f64>]) -> f64 {
    simplex
        .iter()
        .skip(1)
        .map(|v| {
            v.iter()
                .zip(simplex[0].iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimizes_shifted_quadratic() {
        let nm = NelderMead::default();
        let result = nm
            .minimize(|x| (x[0] - 2.0).powi(2) + (x[1] + 3.0).powi(2), &[0.0, 0.0])
            .unwrap();

        assert!(result.converged);
        assert_relative_eq!(result.point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.point[1], -3.0, epsilon = 1e-3);
    }

    #[test]
    fn minimizes_rosenbrock() {
        let nm = NelderMead::new(NelderMeadConfig {
            max_iter: 5000,
            restarts: 3,
            ..Default::default()
        })
        .unwrap();
        let result = nm
            .minimize(
                |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
                &[-1.2, 1.0],
            )
            .unwrap();

        assert_relative_eq!(result.point[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(result.point[1], 1.0, epsilon = 2e-2);
    }

    #[test]
    fn nan_regions_are_avoided() {
        let nm = NelderMead::default();
        let result = nm
            .minimize(
                |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 0.5).powi(2) },
                &[1.0],
            )
            .unwrap();
        assert_relative_eq!(result.point[0], 0.5, epsilon = 1e-3);
    }

    #[test]
    fn rejects_non_finite_start() {
        let nm = NelderMead::default();
        assert!(nm.minimize(|_| f64::INFINITY, &[0.0]).is_err());
    }

    #[test]
    fn empty_parameter_vector_evaluates_once() {
        let nm = NelderMead::default();
        let result = nm.minimize(|_| 4.0, &[]).unwrap();
        assert!(result.converged);
        assert_eq!(result.value, 4.0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = NelderMeadConfig {
            max_iter: 0,
            ..Default::default()
        };
        assert!(NelderMead::new(config).is_err());
    }
}
