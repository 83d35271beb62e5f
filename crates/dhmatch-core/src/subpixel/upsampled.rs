//! Upsampled cross-correlation: a half-pixel estimate from a twice
//! zero-padded phase correlation, then an optional local refinement on a
//! `1/upsampling` grid through the matrix-multiply DFT.

use ndarray::Array2;
use num_complex::Complex;
use tracing::debug;

use crate::consts::UPSAMPLED_SEARCH_WINDOW;
use crate::coords::frequency_index;
use crate::correlate::fourier::phase_corr;
use crate::error::Result;
use crate::patch::{validate_pair, Patch};
use crate::peak::IntegerPeak;
use crate::spectral::{ifft2_real, normalize_power_spectrum, pad_spectrum, upsample_spectrum};
use crate::template::equalize_size;

/// Estimates the displacement `(di, dj)` of `b` relative to `a` to within
/// `1/upsampling` of a pixel. `upsampling <= 2` stops at the half-pixel
/// estimate.
pub fn upsampled_cross_corr(a: &Patch, b: &Patch, upsampling: usize) -> Result<(f64, f64)> {
    validate_pair(a, b)?;
    let (a, b) = equalize_size(a, b);
    let (rows, cols) = a.dim();

    let cross_power = normalize_power_spectrum(&phase_corr(&a, &b)?);
    let doubled = ifft2_real(&pad_spectrum(&cross_power, 2 * rows, 2 * cols));
    let (row, col) = argmax(&doubled);
    let shift_i = frequency_index(row, 2 * rows) / 2.0;
    let shift_j = frequency_index(col, 2 * cols) / 2.0;

    if upsampling <= 2 {
        debug!(di = shift_i, dj = shift_j, "half-pixel estimate");
        return Ok((shift_i, shift_j));
    }

    let up = upsampling as f64;
    let region = (UPSAMPLED_SEARCH_WINDOW * up).ceil();
    let center = (region / 2.0).floor();
    let shift_i = (shift_i * up).round() / up;
    let shift_j = (shift_j * up).round() / up;

    let local = upsample_spectrum(
        &cross_power,
        region as usize,
        region as usize,
        up,
        center - shift_i * up,
        center - shift_j * up,
    )
    .mapv(|z| z.re);
    let (u, v) = argmax(&local);
    let di = shift_i + (u as f64 - center) / up;
    let dj = shift_j + (v as f64 - center) / up;
    debug!(di, dj, upsampling, "upsampled estimate");
    Ok((di, dj))
}

/// Refines an integer peak of `spectrum`'s correlation by evaluating its
/// inverse DFT on a `1/upsampling` grid over the pixel around the peak.
/// Returns the peak displacement plus a correction of at most
/// `UPSAMPLED_SEARCH_WINDOW / 2` pixels per axis.
pub fn upsample_peak(
    spectrum: &Array2<Complex<f64>>,
    peak: &IntegerPeak,
    upsampling: usize,
) -> (f64, f64) {
    let (di, dj) = (peak.di as f64, peak.dj as f64);
    if upsampling <= 1 {
        return (di, dj);
    }

    let up = upsampling as f64;
    let region = (UPSAMPLED_SEARCH_WINDOW * up).ceil();
    let center = (region / 2.0).floor();
    let local = upsample_spectrum(
        spectrum,
        region as usize,
        region as usize,
        up,
        center - di * up,
        center - dj * up,
    )
    .mapv(|z| z.re);
    let (u, v) = argmax(&local);
    (di + (u as f64 - center) / up, dj + (v as f64 - center) / up)
}

fn argmax(data: &Array2<f64>) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_val = f64::NEG_INFINITY;
    for ((row, col), &v) in data.indexed_iter() {
        if v > best_val {
            best_val = v;
            best = (row, col);
        }
    }
    best
}
