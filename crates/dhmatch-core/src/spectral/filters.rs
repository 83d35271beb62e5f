//! Spectral normalization and windowing primitives.
//!
//! Frequency-domain masks are built in unshifted FFT order so they multiply
//! spectra returned by [`super::fft::fft2`] directly.

use ndarray::{Array1, Array2};
use num_complex::Complex;
use std::f64::consts::{PI, TAU};

use crate::coords::normalized_frequency;

/// Scales every element to unit magnitude. Exact zeros stay zero.
pub fn normalize_power_spectrum(spectrum: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    spectrum.mapv(unit_phasor)
}

/// `z / |z|`, or zero for `z == 0`.
pub fn unit_phasor(z: Complex<f64>) -> Complex<f64> {
    let mag = z.norm();
    if mag == 0.0 {
        Complex::new(0.0, 0.0)
    } else {
        z / mag
    }
}

/// `a / b`, or zero where `b` is exactly zero.
pub fn guarded_div(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

/// Radial raised-cosine window over normalized frequency `r`.
///
/// Passes `r < 0.5 - beta` unchanged, rolls off as
/// `cos²(π/(2β) · (r - (0.5 - β)))` up to `r = 0.5` and is zero beyond.
pub fn raised_cosine(shape: (usize, usize), beta: f64) -> Array2<f64> {
    let (rows, cols) = shape;
    let knee = 0.5 - beta;
    Array2::from_shape_fn(shape, |(i, j)| {
        let fi = normalized_frequency(i, rows);
        let fj = normalized_frequency(j, cols);
        let r = (fi * fi + fj * fj).sqrt();
        if r < knee {
            1.0
        } else if r <= 0.5 && beta > 0.0 {
            (PI / (2.0 * beta) * (r - knee)).cos().powi(2)
        } else {
            0.0
        }
    })
}

/// Separable Gaussian low-pass `exp(-½(f_i/σ)²) · exp(-½(f_j/σ)²)` over
/// normalized frequency.
pub fn gaussian_mask(shape: (usize, usize), sigma: f64) -> Array2<f64> {
    let (rows, cols) = shape;
    let profile = |f: f64| (-0.5 * (f / sigma).powi(2)).exp();
    Array2::from_shape_fn(shape, |(i, j)| {
        profile(normalized_frequency(i, rows)) * profile(normalized_frequency(j, cols))
    })
}

/// Marks bins whose magnitude exceeds `fraction * max|S|`.
pub fn threshold_mask(spectrum: &Array2<Complex<f64>>, fraction: f64) -> Array2<bool> {
    let magnitude = spectrum.mapv(|z| z.norm());
    let peak = magnitude.iter().copied().fold(0.0_f64, f64::max);
    let threshold = peak * fraction;
    magnitude.mapv(|m| m > threshold)
}

/// Hamming window `0.54 - 0.46 cos(2πk/(n-1))`.
pub fn hamming(n: usize) -> Array1<f64> {
    if n < 2 {
        return Array1::ones(n);
    }
    let denom = (n - 1) as f64;
    Array1::from_shape_fn(n, |k| 0.54 - 0.46 * (TAU * k as f64 / denom).cos())
}
