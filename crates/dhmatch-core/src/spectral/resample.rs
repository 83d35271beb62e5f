//! Frequency-domain resampling: spectrum padding/cropping and the
//! matrix-multiply upsampled DFT (Guizar-Sicairos et al., 2008).
//!
//! Reference: "Efficient subpixel image registration algorithms",
//!            M. Guizar-Sicairos, S. T. Thurman, J. R. Fienup, Optics Letters 33(2), 2008.

use ndarray::{s, Array2};
use num_complex::Complex;
use std::f64::consts::TAU;

use crate::coords::frequency_index;

use super::fft::{fftshift, ifftshift};

/// Zero-pads (or crops) a spectrum to `new_rows x new_cols` around its zero
/// frequency, rescaling by `(new_rows*new_cols)/(rows*cols)` so the inverse
/// transform keeps the original amplitude.
pub fn pad_spectrum(
    spectrum: &Array2<Complex<f64>>,
    new_rows: usize,
    new_cols: usize,
) -> Array2<Complex<f64>> {
    let (rows, cols) = spectrum.dim();
    let centered = fftshift(spectrum);
    let mut padded = Array2::<Complex<f64>>::zeros((new_rows, new_cols));

    let (row_src, row_dst, row_len) = aligned_span(rows, new_rows);
    let (col_src, col_dst, col_len) = aligned_span(cols, new_cols);
    padded
        .slice_mut(s![row_dst..row_dst + row_len, col_dst..col_dst + col_len])
        .assign(&centered.slice(s![row_src..row_src + row_len, col_src..col_src + col_len]));

    let scale = (new_rows * new_cols) as f64 / (rows * cols) as f64;
    let mut result = ifftshift(&padded);
    result.mapv_inplace(|v| v * scale);
    result
}

/// Start offsets in the old and new arrays and the copied length, keeping
/// index `len/2` of both aligned.
fn aligned_span(old: usize, new: usize) -> (usize, usize, usize) {
    if new >= old {
        (0, new / 2 - old / 2, old)
    } else {
        (old / 2 - new / 2, 0, new)
    }
}

/// Evaluates the inverse DFT of `spectrum` on an `up_rows x up_cols` grid
/// with spacing `1/upsample_factor`, where grid index `(u, v)` sits at
/// position `((u - i_offset) / f, (v - j_offset) / f)` in unshifted pixel
/// coordinates.
///
/// Computed as `K_row^T * spectrum * K_col` without a full-size FFT. With a
/// factor of 1 and zero offsets the result equals `rows*cols * ifft2(spectrum)`.
pub fn upsample_spectrum(
    spectrum: &Array2<Complex<f64>>,
    up_rows: usize,
    up_cols: usize,
    upsample_factor: f64,
    i_offset: f64,
    j_offset: f64,
) -> Array2<Complex<f64>> {
    let (rows, cols) = spectrum.dim();
    let row_kernel = build_dft_kernel(rows, up_rows, upsample_factor, i_offset);
    let col_kernel = build_dft_kernel(cols, up_cols, upsample_factor, j_offset);
    row_kernel.t().dot(spectrum).dot(&col_kernel)
}

/// Inverse-DFT kernel of shape `(n, upsampled_size)`:
/// `exp(i * 2π * freq_k * (j - offset) / (n * upsample_factor))`.
fn build_dft_kernel(
    n: usize,
    upsampled_size: usize,
    upsample_factor: f64,
    offset: f64,
) -> Array2<Complex<f64>> {
    let scale = TAU / (n as f64 * upsample_factor);
    Array2::from_shape_fn((n, upsampled_size), |(k, j)| {
        let phase = scale * frequency_index(k, n) * (j as f64 - offset);
        Complex::new(phase.cos(), phase.sin())
    })
}
