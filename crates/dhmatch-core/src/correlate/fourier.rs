//! Weighted cross-spectrum correlators.
//!
//! Every method here produces `Q = S1 · conj(W · S2)` for a per-method
//! weighting `W`, band by band, combined with a running average. The
//! result stays in unshifted FFT order; [`super::Correlation::into_surface`]
//! inverts it.

use ndarray::{Array2, ArrayView2, Zip};
use num_complex::Complex;

use crate::error::Result;
use crate::patch::{running_band_average, Patch};
use crate::spectral::filters::{gaussian_mask, guarded_div, unit_phasor};
use crate::spectral::{fft2, fft2_real};

type Spectrum = Array2<Complex<f64>>;

/// Plain cross-correlation, `W = 1`.
pub fn cross_corr(a: &Patch, b: &Patch) -> Result<Spectrum> {
    band_cross_spectra(a, b, |s1, s2| elementwise(s1, s2, |x, y| x * y.conj()))
}

/// Phase correlation: the full cross-spectrum normalized to unit magnitude.
pub fn phase_corr(a: &Patch, b: &Patch) -> Result<Spectrum> {
    band_cross_spectra(a, b, |s1, s2| {
        elementwise(s1, s2, |x, y| unit_phasor(x * y.conj()))
    })
}

/// Classical phase-only correlation, `W = 1/|S2|`.
pub fn phase_only_corr(a: &Patch, b: &Patch) -> Result<Spectrum> {
    band_cross_spectra(a, b, |s1, s2| {
        elementwise(s1, s2, |x, y| x * y.conj() * guarded_div(1.0, y.norm()))
    })
}

/// Symmetric phase-only filter, `W = 1/sqrt(|S1||S2|)`.
pub fn symmetric_phase_corr(a: &Patch, b: &Patch) -> Result<Spectrum> {
    band_cross_spectra(a, b, |s1, s2| {
        elementwise(s1, s2, |x, y| {
            x * y.conj() * guarded_div(1.0, (x.norm() * y.norm()).sqrt())
        })
    })
}

/// Amplitude-compensated filter.
///
/// With `s0 = cutoff * max|S2|`, bins at or below the cutoff get the
/// constant weight `1/s0`; stronger bins get `s0/|S2|²`. The two branches
/// meet at `|S2| = s0`.
pub fn amplitude_comp_corr(a: &Patch, b: &Patch, cutoff: f64) -> Result<Spectrum> {
    band_cross_spectra(a, b, |s1, s2| {
        let peak = s2.iter().map(|z| z.norm()).fold(0.0_f64, f64::max);
        let s0 = cutoff * peak;
        elementwise(s1, s2, |x, y| {
            let mag = y.norm();
            let weight = if mag <= s0 {
                guarded_div(1.0, s0)
            } else {
                s0 / (mag * mag)
            };
            x * y.conj() * weight
        })
    })
}

/// Windrose correlation: both spectra quantized to the four phase quadrants.
pub fn windrose_corr(a: &Patch, b: &Patch) -> Result<Spectrum> {
    band_cross_spectra(a, b, |s1, s2| {
        elementwise(s1, s2, |x, y| complex_sign(x) * complex_sign(y).conj())
    })
}

/// Binary phase-only filter: the reference spectrum replaced by the sign of
/// its real part, `Q = S1 · sign(Re S2)`.
pub fn binary_orientation_corr(a: &Patch, b: &Patch) -> Result<Spectrum> {
    band_cross_spectra(a, b, |s1, s2| elementwise(s1, s2, |x, y| x * sign(y.re)))
}

/// Robust (M-estimator) correlation.
///
/// For each `p = 10^k` over `exponents`, both patches are mapped to
/// `p^(-1/3) · exp(i(2p - 1)I)` and their cross-spectra are summed.
/// Intensities are expected in roughly `[0, 1]`.
pub fn robust_corr(a: &Patch, b: &Patch, exponents: &[f64]) -> Result<Spectrum> {
    running_band_average(a, b, |band_a, band_b| {
        let mut sum = Array2::<Complex<f64>>::zeros(band_a.dim());
        for &k in exponents {
            let p = 10f64.powf(k);
            let s1 = fft2(&robust_transform(band_a, p));
            let s2 = fft2(&robust_transform(band_b, p));
            Zip::from(&mut sum)
                .and(&s1)
                .and(&s2)
                .for_each(|q, &x, &y| *q += x * y.conj());
        }
        Ok(sum)
    })
}

fn robust_transform(band: ArrayView2<f64>, p: f64) -> Array2<Complex<f64>> {
    let amplitude = p.powf(-1.0 / 3.0);
    let frequency = 2.0 * p - 1.0;
    band.mapv(|v| Complex::from_polar(amplitude, frequency * v))
}

/// Phase correlation tapered by a Gaussian low-pass in the frequency domain.
pub fn gaussian_transformed_phase_corr(a: &Patch, b: &Patch, sigma: f64) -> Result<Spectrum> {
    let mask = gaussian_mask(a.dim(), sigma);
    let mut q = phase_corr(a, b)?;
    Zip::from(&mut q).and(&mask).for_each(|q, &m| *q *= m);
    Ok(q)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Transforms each band pair and combines the spectra with `combine`,
/// averaging over bands.
pub(crate) fn band_cross_spectra<F>(a: &Patch, b: &Patch, combine: F) -> Result<Spectrum>
where
    F: Fn(&Spectrum, &Spectrum) -> Spectrum,
{
    running_band_average(a, b, |band_a, band_b| {
        let s1 = fft2_real(band_a);
        let s2 = fft2_real(band_b);
        Ok(combine(&s1, &s2))
    })
}

pub(crate) fn elementwise<F>(s1: &Spectrum, s2: &Spectrum, f: F) -> Spectrum
where
    F: Fn(Complex<f64>, Complex<f64>) -> Complex<f64>,
{
    Zip::from(s1).and(s2).map_collect(|&x, &y| f(x, y))
}

/// Sign function with `sign(0) = 0`.
pub(crate) fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Quadrant sign `sign(Re z) + i·sign(Im z)`.
pub(crate) fn complex_sign(z: Complex<f64>) -> Complex<f64> {
    Complex::new(sign(z.re), sign(z.im))
}
