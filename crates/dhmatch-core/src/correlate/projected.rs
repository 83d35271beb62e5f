use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};

use crate::error::Result;
use crate::patch::{running_band_average, Patch};
use crate::spectral::fft::{fft1, fftshift1, ifft1};
use crate::spectral::filters::{hamming, unit_phasor};

use super::masked::mask_weights;

/// Projected phase correlation.
///
/// Masked row and column sums of each patch are Hamming-windowed and
/// phase-correlated in 1D; the two 1D surfaces are recombined as
/// `sqrt(max(0, C_rows ⊗ C_cols))`. Only separable displacements are
/// recovered.
pub fn projected_phase_corr(
    a: &Patch,
    b: &Patch,
    mask_a: Option<&Array2<bool>>,
    mask_b: Option<&Array2<bool>>,
) -> Result<Array2<f64>> {
    let shape = a.dim();
    let m1 = mask_weights(mask_a, shape);
    let m2 = mask_weights(mask_b, shape);

    running_band_average(a, b, |band_a, band_b| {
        let c_rows = phase_corr_1d(&project(band_a, &m1, Axis(1)), &project(band_b, &m2, Axis(1)));
        let c_cols = phase_corr_1d(&project(band_a, &m1, Axis(0)), &project(band_b, &m2, Axis(0)));
        Ok(Array2::from_shape_fn(shape, |(i, j)| {
            (c_rows[i] * c_cols[j]).max(0.0).sqrt()
        }))
    })
}

/// Sum of masked intensities along `axis`.
fn project(band: ArrayView2<f64>, mask: &Array2<f64>, axis: Axis) -> Array1<f64> {
    (&band * mask).sum_axis(axis)
}

/// fftshift-ed 1D phase correlation of two Hamming-windowed signals.
fn phase_corr_1d(a: &Array1<f64>, b: &Array1<f64>) -> Array1<f64> {
    let window = hamming(a.len());
    let s1 = fft1(&(a * &window));
    let s2 = fft1(&(b * &window));
    let q = Zip::from(&s1)
        .and(&s2)
        .map_collect(|&x, &y| unit_phasor(x * y.conj()));
    fftshift1(&ifft1(&q).mapv(|v| v.re))
}
