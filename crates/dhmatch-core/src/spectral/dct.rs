use ndarray::{s, Array2, ArrayView2};
use num_complex::Complex;
use std::f64::consts::PI;

use super::fft::fft2;

/// Complex cosine transform of a real patch: the DCT-II in the real part
/// with its sine quadrature in the imaginary part,
/// `C[k,l] = Σ x[p,q] exp(-iπ(k(2p+1)/(2m) + l(2q+1)/(2n)))`.
///
/// Evaluated as a zero-padded `2m x 2n` FFT followed by a half-sample
/// twiddle, so a spatial shift of the patch appears as a linear phase ramp
/// without circular wraparound.
pub fn complex_dct2(data: ArrayView2<f64>) -> Array2<Complex<f64>> {
    let (m, n) = data.dim();
    let padded_spectrum = doubled_spectrum(data);
    Array2::from_shape_fn((m, n), |(k, l)| {
        let phase = -PI * (k as f64 / (2.0 * m as f64) + l as f64 / (2.0 * n as f64));
        padded_spectrum[[k, l]] * Complex::new(phase.cos(), phase.sin())
    })
}

/// FFT of the patch zero-padded to twice its size in both axes.
pub fn doubled_spectrum(data: ArrayView2<f64>) -> Array2<Complex<f64>> {
    let (m, n) = data.dim();
    let mut padded = Array2::<Complex<f64>>::zeros((2 * m, 2 * n));
    padded
        .slice_mut(s![..m, ..n])
        .assign(&data.mapv(|v| Complex::new(v, 0.0)));
    fft2(&padded)
}
