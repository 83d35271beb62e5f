//! Synthetic test data: textures, exactly shifted pairs and ideal
//! correlation peaks with a known displacement.

use std::f64::consts::{LN_2, TAU};

use ndarray::{Array2, Array3, Axis};
use num_complex::Complex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::coords::{frequency_index, surface_center};
use crate::error::{MatchError, Result};
use crate::patch::Patch;
use crate::spectral::filters::gaussian_mask;
use crate::spectral::{fft2_real, ifft2_real};

/// Band-limited random texture with zero mean and unit variance. `sigma` is
/// the spatial correlation length in pixels.
pub fn smooth_noise(rows: usize, cols: usize, sigma: f64, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let white = Array2::from_shape_fn((rows, cols), |_| rng.random::<f64>() - 0.5);
    if sigma <= 0.0 {
        return standardize(white);
    }

    let mask = gaussian_mask((rows, cols), 1.0 / (TAU * sigma));
    let mut spectrum = fft2_real(white.view());
    spectrum.zip_mut_with(&mask, |s, &m| *s *= m);
    standardize(ifft2_real(&spectrum))
}

/// Circularly shifts `data` by a possibly fractional `(di, dj)` through the
/// Fourier shift theorem, so that `out(i, j) = data(i + di, j + dj)`.
pub fn fourier_shift(data: &Array2<f64>, di: f64, dj: f64) -> Array2<f64> {
    let (rows, cols) = data.dim();
    let mut spectrum = fft2_real(data.view());
    for ((i, j), s) in spectrum.indexed_iter_mut() {
        let phase = TAU
            * (frequency_index(i, rows) * di / rows as f64
                + frequency_index(j, cols) * dj / cols as f64);
        *s *= Complex::new(phase.cos(), phase.sin());
    }
    ifft2_real(&spectrum)
}

/// A textured patch and its copy displaced by `(di, dj)`.
pub fn shifted_pair(rows: usize, cols: usize, di: f64, dj: f64, seed: u64) -> (Patch, Patch) {
    let a = smooth_noise(rows, cols, 1.5, seed);
    let b = fourier_shift(&a, di, dj);
    (Patch::new(a), Patch::new(b))
}

/// Multi-band version of [`shifted_pair`]; every band carries its own
/// texture and the same displacement.
pub fn shifted_pair_bands(
    rows: usize,
    cols: usize,
    bands: usize,
    di: f64,
    dj: f64,
    seed: u64,
) -> Result<(Patch, Patch)> {
    let mut a = Array3::<f64>::zeros((rows, cols, bands));
    let mut b = Array3::<f64>::zeros((rows, cols, bands));
    for k in 0..bands {
        let texture = smooth_noise(rows, cols, 1.5, seed.wrapping_add(k as u64));
        b.index_axis_mut(Axis(2), k)
            .assign(&fourier_shift(&texture, di, dj));
        a.index_axis_mut(Axis(2), k).assign(&texture);
    }
    Ok((Patch::from_bands(a)?, Patch::from_bands(b)?))
}

/// A textured patch and a sheared, displaced copy:
/// `b(i, j) = a(i + di + shear_i·(j − cj), j + dj + shear_j·(i − ci))` with
/// `(ci, cj)` the patch centre. Off-grid samples are bilinear and wrap
/// around the patch edges.
pub fn sheared_pair(
    rows: usize,
    cols: usize,
    shear_i: f64,
    shear_j: f64,
    di: f64,
    dj: f64,
    seed: u64,
) -> (Patch, Patch) {
    let (ci, cj) = surface_center((rows, cols));
    warped_pair(rows, cols, seed, |i, j| {
        (
            i + di + shear_i * (j - cj as f64),
            j + dj + shear_j * (i - ci as f64),
        )
    })
}

/// A textured patch and a copy magnified by `(scale_i, scale_j)` about the
/// patch centre, then displaced: `b(i, j) = a(ci + (i − ci)/scale_i + di, ..)`.
pub fn scaled_pair(
    rows: usize,
    cols: usize,
    scale_i: f64,
    scale_j: f64,
    di: f64,
    dj: f64,
    seed: u64,
) -> Result<(Patch, Patch)> {
    if scale_i <= 0.0 || scale_j <= 0.0 {
        return Err(MatchError::InvalidInputShape(format!(
            "scale factors must be positive, got ({scale_i}, {scale_j})"
        )));
    }
    let (ci, cj) = surface_center((rows, cols));
    let (ci, cj) = (ci as f64, cj as f64);
    Ok(warped_pair(rows, cols, seed, |i, j| {
        (ci + (i - ci) / scale_i + di, cj + (j - cj) / scale_j + dj)
    }))
}

fn warped_pair(
    rows: usize,
    cols: usize,
    seed: u64,
    source: impl Fn(f64, f64) -> (f64, f64),
) -> (Patch, Patch) {
    let a = smooth_noise(rows, cols, 1.5, seed);
    let b = Array2::from_shape_fn((rows, cols), |(i, j)| {
        let (y, x) = source(i as f64, j as f64);
        bilinear_wrapped(&a, y, x)
    });
    (Patch::new(a), Patch::new(b))
}

/// Bilinear sample at `(y, x)`, periodic in both axes.
fn bilinear_wrapped(data: &Array2<f64>, y: f64, x: f64) -> f64 {
    let (h, w) = data.dim();
    let (y0, x0) = (y.floor(), x.floor());
    let (fy, fx) = (y - y0, x - x0);
    let at = |r: f64, c: f64| {
        let r = (r as i64).rem_euclid(h as i64) as usize;
        let c = (c as i64).rem_euclid(w as i64) as usize;
        data[[r, c]]
    };
    at(y0, x0) * (1.0 - fy) * (1.0 - fx)
        + at(y0, x0 + 1.0) * (1.0 - fy) * fx
        + at(y0 + 1.0, x0) * fy * (1.0 - fx)
        + at(y0 + 1.0, x0 + 1.0) * fy * fx
}

/// Gaussian correlation peak of full width at half maximum `fwhm`, centred
/// on displacement `(di, dj)` of an fftshift-ed surface.
pub fn correlation_peak(shape: (usize, usize), di: f64, dj: f64, fwhm: f64) -> Array2<f64> {
    let (ci, cj) = surface_center(shape);
    let scale = 4.0 * LN_2 / (fwhm * fwhm);
    Array2::from_shape_fn(shape, |(i, j)| {
        let x = i as f64 - ci as f64 - di;
        let y = j as f64 - cj as f64 - dj;
        (-scale * (x * x + y * y)).exp()
    })
}

/// Ideal cross-spectrum of a pure displacement `(di, dj)`; its inverse
/// transform is a sinc-like peak at that displacement.
pub fn phase_plane(shape: (usize, usize), di: f64, dj: f64) -> Array2<Complex<f64>> {
    let (rows, cols) = shape;
    Array2::from_shape_fn(shape, |(i, j)| {
        let phase = -TAU
            * (frequency_index(i, rows) * di / rows as f64
                + frequency_index(j, cols) * dj / cols as f64);
        Complex::new(phase.cos(), phase.sin())
    })
}

fn standardize(mut data: Array2<f64>) -> Array2<f64> {
    let mean = data.mean().unwrap_or(0.0);
    data.mapv_inplace(|v| v - mean);
    let std = data.std(0.0);
    if std > 0.0 {
        data.mapv_inplace(|v| v / std);
    }
    data
}
