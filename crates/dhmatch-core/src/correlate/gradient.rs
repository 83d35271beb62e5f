//! Gradient-domain correlators.
//!
//! The patch is turned into a complex gradient field `G = Gx + iGy` with
//! the Kroon 3x3 derivative kernel, and the fields are cross-correlated
//! instead of the intensities. This makes the match insensitive to
//! brightness offsets and, for the orientation variant, to contrast.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex;

use crate::consts::KROON_WEIGHTS;
use crate::error::Result;
use crate::patch::{running_band_average, Patch};
use crate::spectral::fft2;
use crate::spectral::filters::unit_phasor;

type Field = Array2<Complex<f64>>;

/// Complex gradient `Gx + iGy`, `x` along columns and `y` along rows.
///
/// Uses the Kroon kernel (central difference, 17:61:17 smoothing across the
/// derivative axis). Borders repeat the edge pixel.
pub fn kroon_gradient(data: ArrayView2<f64>) -> Field {
    let (h, w) = data.dim();
    let at = |row: isize, col: isize| -> f64 {
        let r = row.clamp(0, h as isize - 1) as usize;
        let c = col.clamp(0, w as isize - 1) as usize;
        data[[r, c]]
    };

    Array2::from_shape_fn((h, w), |(row, col)| {
        let (row, col) = (row as isize, col as isize);
        let mut gx = 0.0;
        let mut gy = 0.0;
        for (k, weight) in KROON_WEIGHTS.iter().enumerate() {
            let offset = k as isize - 1;
            gx += weight * (at(row + offset, col + 1) - at(row + offset, col - 1));
            gy += weight * (at(row + 1, col + offset) - at(row - 1, col + offset));
        }
        Complex::new(gx, gy)
    })
}

/// Cross-correlation of the complex gradient fields.
pub fn gradient_corr(a: &Patch, b: &Patch) -> Result<Field> {
    field_cross_spectra(a, b, kroon_gradient)
}

/// Gradient correlation on fields shifted to zero mean and scaled to unit
/// maximum magnitude.
pub fn normalized_gradient_corr(a: &Patch, b: &Patch) -> Result<Field> {
    field_cross_spectra(a, b, |band| normalize_field(kroon_gradient(band)))
}

/// Orientation correlation: every gradient vector is reduced to its
/// direction before correlation.
pub fn orientation_corr(a: &Patch, b: &Patch) -> Result<Field> {
    field_cross_spectra(a, b, |band| kroon_gradient(band).mapv(unit_phasor))
}

fn normalize_field(field: Field) -> Field {
    let n = field.len().max(1) as f64;
    let mean = field.iter().fold(Complex::new(0.0, 0.0), |acc, &z| acc + z) / n;
    let centered = field.mapv(|z| z - mean);
    let peak = centered.iter().map(|z| z.norm()).fold(0.0_f64, f64::max);
    if peak == 0.0 {
        return centered;
    }
    centered.mapv(|z| z / peak)
}

fn field_cross_spectra<F>(a: &Patch, b: &Patch, to_field: F) -> Result<Field>
where
    F: Fn(ArrayView2<f64>) -> Field,
{
    running_band_average(a, b, |band_a, band_b| {
        let s1 = fft2(&to_field(band_a));
        let s2 = fft2(&to_field(band_b));
        Ok(super::fourier::elementwise(&s1, &s2, |x, y| x * y.conj()))
    })
}
