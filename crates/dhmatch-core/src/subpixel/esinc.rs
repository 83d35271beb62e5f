//! Exponentially windowed sinc fit.
//!
//! Along each axis the three samples around the peak are matched by
//! `a·exp(-b²(k - c)²)·sinc(k - c)`, `k ∈ {-1, 0, 1}`, and `c` is the
//! sub-pixel offset. Writing the window width as `b²` keeps `b = 0` (a pure
//! sinc) inside the parameter space.

use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector3};
use ndarray::Axis;
use tracing::trace;

use crate::consts::{ESINC_INITIAL_BETA, ROOT_FINDER_MAX_ITERATIONS, ROOT_FINDER_TOLERANCE};
use crate::error::{MatchError, Result};

use super::separable::{self, Line};
use super::{finite_or_zero, Neighborhood};

/// Solver for square systems of three nonlinear equations.
pub trait RootFinder: Send + Sync {
    /// Finds `x` with `residual(x) ≈ 0`, starting from `initial`.
    fn solve(
        &self,
        residual: &dyn Fn(&Vector3<f64>) -> Vector3<f64>,
        initial: Vector3<f64>,
    ) -> Result<Vector3<f64>>;
}

/// Levenberg-Marquardt with a central-difference Jacobian and LU-solved
/// damped normal equations.
#[derive(Clone, Copy, Debug)]
pub struct LevenbergMarquardt {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            max_iterations: ROOT_FINDER_MAX_ITERATIONS,
            tolerance: ROOT_FINDER_TOLERANCE,
        }
    }
}

const LAMBDA_INITIAL: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e12;

impl RootFinder for LevenbergMarquardt {
    fn solve(
        &self,
        residual: &dyn Fn(&Vector3<f64>) -> Vector3<f64>,
        initial: Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let mut x = initial;
        let mut r = residual(&x);
        let mut cost = r.norm_squared();
        let mut lambda = LAMBDA_INITIAL;

        for iteration in 0..self.max_iterations {
            if !cost.is_finite() {
                return Err(MatchError::SolverDidNotConverge {
                    iterations: iteration,
                });
            }
            if cost <= self.tolerance * self.tolerance {
                return Ok(x);
            }

            let jac = jacobian(residual, &x);
            let jtj = jac.transpose() * jac;
            let jtr = jac.transpose() * r;

            let mut improved = false;
            while lambda < LAMBDA_MAX {
                let damping = Matrix3::from_diagonal(&jtj.diagonal().map(|d| lambda * d.max(1e-6)));
                if let Some(step) = (jtj + damping).lu().solve(&(-jtr)) {
                    let candidate = x + step;
                    let r_candidate = residual(&candidate);
                    let cost_candidate = r_candidate.norm_squared();
                    if cost_candidate.is_finite() && cost_candidate < cost {
                        x = candidate;
                        r = r_candidate;
                        cost = cost_candidate;
                        lambda = (lambda / 10.0).max(1e-12);
                        improved = true;
                        if step.norm() <= self.tolerance * (1.0 + x.norm()) {
                            return Ok(x);
                        }
                        break;
                    }
                }
                lambda *= 10.0;
            }

            if !improved {
                // Local minimum of the residual: best least-squares answer.
                trace!(iteration, cost, "esinc solver stalled");
                return Ok(x);
            }
        }

        Err(MatchError::SolverDidNotConverge {
            iterations: self.max_iterations,
        })
    }
}

/// Fits the windowed sinc along both axes and returns `(ddi, ddj)`.
pub fn esinc(nb: &Neighborhood<'_>, solver: &dyn RootFinder) -> Result<(f64, f64)> {
    let rows = Line::new(nb, Axis(0));
    let cols = Line::new(nb, Axis(1));
    Ok((fit_axis(&rows, solver)?, fit_axis(&cols, solver)?))
}

fn fit_axis(line: &Line<'_>, solver: &dyn RootFinder) -> Result<f64> {
    let samples = [line.at(-1), line.at(0), line.at(1)];
    let start = finite_or_zero(separable::parabolic(line)).clamp(-0.5, 0.5);
    let initial = Vector3::new(samples[1], ESINC_INITIAL_BETA.sqrt(), start);

    let residual = |p: &Vector3<f64>| {
        let (a, b, c) = (p[0], p[1], p[2]);
        let model = |k: f64| a * (-(b * b) * (k - c) * (k - c)).exp() * sinc(k - c);
        Vector3::new(
            samples[0] - model(-1.0),
            samples[1] - model(0.0),
            samples[2] - model(1.0),
        )
    };
    let root = solver.solve(&residual, initial)?;
    Ok(finite_or_zero(root[2]))
}

/// Normalized sinc, `sin(πt)/(πt)`.
fn sinc(t: f64) -> f64 {
    if t.abs() < 1e-12 {
        1.0
    } else {
        (PI * t).sin() / (PI * t)
    }
}

fn jacobian(residual: &dyn Fn(&Vector3<f64>) -> Vector3<f64>, x: &Vector3<f64>) -> Matrix3<f64> {
    let mut jac = Matrix3::zeros();
    for j in 0..3 {
        let h = 1e-7 * x[j].abs().max(1.0);
        let mut forward = *x;
        let mut backward = *x;
        forward[j] += h;
        backward[j] -= h;
        jac.set_column(j, &((residual(&forward) - residual(&backward)) / (2.0 * h)));
    }
    jac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jacobian_of_linear_map() {
        let a = Matrix3::new(2.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 4.0);
        let residual = |p: &Vector3<f64>| a * p;
        let jac = jacobian(&residual, &Vector3::new(0.5, -1.0, 2.0));
        assert!((jac - a).amax() < 1e-6, "jacobian {jac}");
    }

    #[test]
    fn test_levenberg_marquardt_linear_root() {
        let solver = LevenbergMarquardt::default();
        let residual = |p: &Vector3<f64>| p - Vector3::new(1.0, -2.0, 0.25);
        let root = solver.solve(&residual, Vector3::zeros()).unwrap();
        assert!((root[0] - 1.0).abs() < 1e-9);
        assert!((root[1] + 2.0).abs() < 1e-9);
        assert!((root[2] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_levenberg_marquardt_nonlinear_root() {
        let solver = LevenbergMarquardt::default();
        let residual = |p: &Vector3<f64>| {
            Vector3::new(p[0] * p[0] - 4.0, p[0] * p[1] - 1.0, p[2].exp() - 1.5)
        };
        let root = solver.solve(&residual, Vector3::new(1.0, 1.0, 0.0)).unwrap();
        assert!((root[0] - 2.0).abs() < 1e-6, "root {root}");
        assert!((root[1] - 0.5).abs() < 1e-6, "root {root}");
        assert!((root[2] - 1.5f64.ln()).abs() < 1e-6, "root {root}");
    }
}
