//! One-dimensional peak models, fitted independently along the row and the
//! column through the integer peak.

use ndarray::Axis;

use super::{finite_or_zero, Neighborhood};

/// Samples of the surface along one axis, indexed relative to the peak.
pub struct Line<'a> {
    nb: &'a Neighborhood<'a>,
    axis: Axis,
}

impl<'a> Line<'a> {
    pub(crate) fn new(nb: &'a Neighborhood<'a>, axis: Axis) -> Self {
        Self { nb, axis }
    }

    pub fn at(&self, k: isize) -> f64 {
        self.nb.along(self.axis, k)
    }
}

/// Applies a 1D model along both axes and returns `(ddi, ddj)`.
pub fn fit(nb: &Neighborhood<'_>, model: fn(&Line<'_>) -> f64) -> (f64, f64) {
    let rows = Line::new(nb, Axis(0));
    let cols = Line::new(nb, Axis(1));
    (finite_or_zero(model(&rows)), finite_or_zero(model(&cols)))
}

/// Vertex of the parabola through the three samples around the peak.
pub fn parabolic(line: &Line<'_>) -> f64 {
    let (m, c, p) = (line.at(-1), line.at(0), line.at(1));
    (p - m) / (2.0 * (2.0 * c - m - p))
}

/// Parabolic vertex of the log samples; exact for Gaussian peaks.
pub fn gaussian(line: &Line<'_>) -> f64 {
    let (m, c, p) = (line.at(-1).ln(), line.at(0).ln(), line.at(1).ln());
    (p - m) / (2.0 * (2.0 * c - m - p))
}

pub fn centroid(line: &Line<'_>) -> f64 {
    let (m, c, p) = (line.at(-1), line.at(0), line.at(1));
    (p - m) / (m + c + p)
}

/// Centre of mass over five samples.
pub fn mass(line: &Line<'_>) -> f64 {
    let (moment, total) = (-2..=2).fold((0.0, 0.0), |(moment, total), k| {
        let v = line.at(k);
        (moment + k as f64 * v, total + v)
    });
    moment / total
}

/// Intersection of two lines of equal and opposite slope, the steeper side
/// anchored on the lower neighbour.
pub fn equiangular(line: &Line<'_>) -> f64 {
    let (m, c, p) = (line.at(-1), line.at(0), line.at(1));
    if p >= m {
        (p - m) / (2.0 * (c - m))
    } else {
        (p - m) / (2.0 * (c - p))
    }
}

pub fn triangular(line: &Line<'_>) -> f64 {
    let (m, c, p) = (line.at(-1), line.at(0), line.at(1));
    let side = sign(p - m);
    if side == 0.0 {
        return 0.0;
    }
    let (high, low) = (m.max(p), m.min(p));
    side * 0.5 * (1.0 - (c - high) / (c - low))
}

/// Birchfield & Tomasi: compares linearly interpolated half-sample values.
pub fn birchfield(line: &Line<'_>) -> f64 {
    let (m, c, p) = (line.at(-1), line.at(0), line.at(1));
    let half_m = 0.5 * (m + c);
    let half_p = 0.5 * (p + c);
    0.5 * (half_p - half_m) / (c - half_m.min(half_p))
}

pub fn ren(line: &Line<'_>) -> f64 {
    let d = line.at(1) - line.at(-1);
    if d == 0.0 {
        return 0.0;
    }
    sign(d) / (1.0 + line.at(0) / d.abs())
}

/// Blais & Rioux: zero crossing of a fourth-order derivative filter between
/// the peak and its larger neighbour.
pub fn blais(line: &Line<'_>) -> f64 {
    let derivative = |k: isize| line.at(k - 2) + line.at(k - 1) - line.at(k + 1) - line.at(k + 2);
    let g0 = derivative(0);
    if line.at(1) > line.at(-1) {
        let g1 = derivative(1);
        g0 / (g0 - g1)
    } else {
        let g1 = derivative(-1);
        g1 / (g1 - g0) - 1.0
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
