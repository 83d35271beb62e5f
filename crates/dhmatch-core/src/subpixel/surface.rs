//! Two-dimensional neighbourhood fits.

use nalgebra::{Matrix2, Vector2};
use tracing::trace;

use crate::consts::{BLUE_WEIGHTS, VARIANCE_EPSILON};

use super::{finite_or_zero, Neighborhood};

/// Weighted centroid of the positive residuals after removing the mean of
/// the non-centre pixels in a `(2ds+1)²` window.
pub fn moment(nb: &Neighborhood<'_>, ds: usize) -> (f64, f64) {
    let ds = ds as isize;
    let offsets: Vec<(isize, isize)> = (-ds..=ds)
        .flat_map(|i| (-ds..=ds).map(move |j| (i, j)))
        .collect();

    let ring: Vec<f64> = offsets
        .iter()
        .filter(|&&(i, j)| i != 0 || j != 0)
        .map(|&(i, j)| nb.at(i, j))
        .collect();
    let mean = ring.iter().sum::<f64>() / ring.len() as f64;

    let (mut wi, mut wj, mut total) = (0.0, 0.0, 0.0);
    for &(i, j) in &offsets {
        let w = (nb.at(i, j) - mean).max(0.0);
        wi += i as f64 * w;
        wj += j as f64 * w;
        total += w;
    }
    if total == 0.0 {
        trace!("flat moment window, correction set to zero");
        return (0.0, 0.0);
    }
    (wi / total, wj / total)
}

/// Quadratic regression on the log of the 3x3 neighbourhood.
pub fn gaussian_2d(nb: &Neighborhood<'_>) -> (f64, f64) {
    quadratic_vertex(|i, j| nb.at(i, j).ln())
}

/// Quadratic regression on the 3x3 neighbourhood itself.
pub fn paraboloid(nb: &Neighborhood<'_>) -> (f64, f64) {
    quadratic_vertex(|i, j| nb.at(i, j))
}

/// Least-squares fit of `c00 + c10·i + c01·j + c11·ij + c20·i² + c02·j²`
/// over the 3x3 grid, written with the closed-form moment sums.
fn quadratic_vertex(value: impl Fn(isize, isize) -> f64) -> (f64, f64) {
    let (mut c10, mut c01, mut c11, mut c20, mut c02) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for i in -1..=1isize {
        for j in -1..=1isize {
            let v = value(i, j);
            let (fi, fj) = (i as f64, j as f64);
            c10 += fi * v;
            c01 += fj * v;
            c11 += fi * fj * v;
            c20 += (3.0 * fi * fi - 2.0) * v;
            c02 += (3.0 * fj * fj - 2.0) * v;
        }
    }
    c10 /= 6.0;
    c01 /= 6.0;
    c11 /= 4.0;
    c20 /= 6.0;
    c02 /= 6.0;

    let den = 4.0 * c20 * c02 - c11 * c11;
    (
        finite_or_zero((c11 * c01 - 2.0 * c10 * c02) / den),
        finite_or_zero((c11 * c10 - 2.0 * c01 * c20) / den),
    )
}

/// One Newton step `-H⁻¹g` from smoothed finite differences. `None` when the
/// Hessian is singular.
pub fn blue(nb: &Neighborhood<'_>) -> Option<(f64, f64)> {
    let mut g = Vector2::zeros();
    let mut h = Matrix2::zeros();
    for (k, weight) in (-1..=1isize).zip(BLUE_WEIGHTS) {
        g[0] += weight * 0.5 * (nb.at(1, k) - nb.at(-1, k));
        g[1] += weight * 0.5 * (nb.at(k, 1) - nb.at(k, -1));
        h[(0, 0)] += weight * (nb.at(1, k) - 2.0 * nb.at(0, k) + nb.at(-1, k));
        h[(1, 1)] += weight * (nb.at(k, 1) - 2.0 * nb.at(k, 0) + nb.at(k, -1));
    }
    let hij = 0.25 * (nb.at(1, 1) - nb.at(1, -1) - nb.at(-1, 1) + nb.at(-1, -1));
    h[(0, 1)] = hij;
    h[(1, 0)] = hij;

    // Near-singular counts as singular, relative to the Hessian's scale.
    let det = h.determinant();
    let scale = (h[(0, 0)] * h[(1, 1)]).abs() + hij * hij;
    if !det.is_finite() || det.abs() <= VARIANCE_EPSILON * scale {
        return None;
    }
    let step = -(h.try_inverse()? * g);
    (step[0].is_finite() && step[1].is_finite()).then_some((step[0], step[1]))
}
