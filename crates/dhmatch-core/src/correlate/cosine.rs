//! Cosine-transform correlation.
//!
//! Each patch is represented by its complex cosine transform (DCT-II plus
//! sine quadrature), which behaves like the positive-frequency half of the
//! spectrum of the patch zero-padded to twice its size. The cross-spectrum
//! of the two transforms is inverted on the doubled grid, so template edges
//! do not wrap around, and the central window is kept.

use ndarray::{s, Array2};
use num_complex::Complex;

use crate::error::Result;
use crate::patch::{running_band_average, Patch};
use crate::spectral::dct::complex_dct2;
use crate::spectral::filters::unit_phasor;
use crate::spectral::{fftshift, ifft2_real};

use super::fourier::{complex_sign, elementwise};

/// Correlation surface from the complex cosine transforms of both patches.
///
/// With `sign_only` the transforms are quantized to their quadrant signs
/// before correlation; otherwise the cross-spectrum is phase-normalized.
pub fn cosine_corr(a: &Patch, b: &Patch, sign_only: bool) -> Result<Array2<f64>> {
    let q = running_band_average(a, b, |band_a, band_b| {
        let c1 = complex_dct2(band_a);
        let c2 = complex_dct2(band_b);
        Ok(if sign_only {
            elementwise(&c1, &c2, |x, y| complex_sign(x) * complex_sign(y).conj())
        } else {
            elementwise(&c1, &c2, |x, y| unit_phasor(x * y.conj()))
        })
    })?;
    Ok(one_sided_surface(&q))
}

/// Inverts a positive-frequency cross-spectrum on the doubled grid and
/// returns the centred window of the original size.
fn one_sided_surface(q: &Array2<Complex<f64>>) -> Array2<f64> {
    let (m, n) = q.dim();
    let mut doubled = Array2::<Complex<f64>>::zeros((2 * m, 2 * n));
    doubled.slice_mut(s![..m, ..n]).assign(q);
    let surface = fftshift(&ifft2_real(&doubled));
    let (r0, c0) = (m - m / 2, n - n / 2);
    surface.slice(s![r0..r0 + m, c0..c0 + n]).to_owned()
}
