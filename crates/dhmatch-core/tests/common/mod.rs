#![allow(dead_code)]

use ndarray::Array2;

use dhmatch_core::patch::Patch;
use dhmatch_core::synthetic::smooth_noise;

/// Circular integer shift: `out(i, j) = data(i + di, j + dj)`.
pub fn roll(data: &Array2<f64>, di: i64, dj: i64) -> Array2<f64> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(i, j)| {
        let r = (i as i64 + di).rem_euclid(h as i64) as usize;
        let c = (j as i64 + dj).rem_euclid(w as i64) as usize;
        data[[r, c]]
    })
}

/// Textured patch and its circularly shifted copy.
pub fn rolled_pair(size: usize, di: i64, dj: i64, seed: u64) -> (Patch, Patch) {
    let a = smooth_noise(size, size, 1.5, seed);
    let b = roll(&a, di, dj);
    (Patch::new(a), Patch::new(b))
}

/// Separable sinc peak centred on displacement `(di, dj)`.
pub fn sinc_peak(shape: (usize, usize), di: f64, dj: f64) -> Array2<f64> {
    let sinc = |t: f64| {
        if t.abs() < 1e-12 {
            1.0
        } else {
            (std::f64::consts::PI * t).sin() / (std::f64::consts::PI * t)
        }
    };
    let (ci, cj) = (shape.0 / 2, shape.1 / 2);
    Array2::from_shape_fn(shape, |(i, j)| {
        sinc(i as f64 - ci as f64 - di) * sinc(j as f64 - cj as f64 - dj)
    })
}

pub fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}
