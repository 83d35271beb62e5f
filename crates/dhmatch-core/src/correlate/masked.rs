//! Masked normalized cross-correlation (Padfield, 2012) and its unmasked
//! counterpart.
//!
//! Reference: "Masked Object Registration in the Fourier Domain",
//!            D. Padfield, IEEE Transactions on Image Processing 21(5), 2012.
//!
//! Both operate on circular correlations `corr(f, g)(x) = Σ_y f(y + x) g(y)`
//! evaluated through the FFT, and return fftshift-ed surfaces in `[-1, 1]`.

use ndarray::{Array2, ArrayView2, Zip};
use num_complex::Complex;

use crate::consts::{MASKED_MIN_OVERLAP, VARIANCE_EPSILON};
use crate::error::Result;
use crate::patch::{running_band_average, Patch};
use crate::spectral::{fft2_real, fftshift, ifft2_real};

/// Masked NCC: at every lag, only pixels valid in both masks contribute.
/// Lags without overlap, or with zero variance in either patch, score zero.
pub fn masked_corr(
    a: &Patch,
    b: &Patch,
    mask_a: Option<&Array2<bool>>,
    mask_b: Option<&Array2<bool>>,
) -> Result<Array2<f64>> {
    let shape = a.dim();
    let m1 = mask_weights(mask_a, shape);
    let m2 = mask_weights(mask_b, shape);

    running_band_average(a, b, |band_a, band_b| {
        Ok(fftshift(&masked_band(band_a, band_b, &m1, &m2)))
    })
}

fn masked_band(
    band_a: ArrayView2<f64>,
    band_b: ArrayView2<f64>,
    m1: &Array2<f64>,
    m2: &Array2<f64>,
) -> Array2<f64> {
    let f1 = &band_a * m1;
    let f2 = &band_b * m2;

    let fm1 = fft2_real(m1.view());
    let fm2 = fft2_real(m2.view());
    let ff1 = fft2_real(f1.view());
    let ff2 = fft2_real(f2.view());
    let ff1_sq = fft2_real((&f1 * &band_a).view());
    let ff2_sq = fft2_real((&f2 * &band_b).view());

    // Overlap counts are integers; rounding removes FFT noise.
    let overlap = circular_corr(&fm1, &fm2).mapv(f64::round);
    let sum_a = circular_corr(&ff1, &fm2);
    let sum_b = circular_corr(&fm1, &ff2);
    let sum_aa = circular_corr(&ff1_sq, &fm2);
    let sum_bb = circular_corr(&fm1, &ff2_sq);
    let sum_ab = circular_corr(&ff1, &ff2);

    let centered = |sum_xy: &Array2<f64>, sum_x: &Array2<f64>, sum_y: &Array2<f64>| {
        Array2::from_shape_fn(overlap.dim(), |idx| {
            let n = overlap[idx];
            if n < MASKED_MIN_OVERLAP {
                0.0
            } else {
                sum_xy[idx] - sum_x[idx] * sum_y[idx] / n
            }
        })
    };
    let numerator = centered(&sum_ab, &sum_a, &sum_b);
    let var_a = centered(&sum_aa, &sum_a, &sum_a);
    let var_b = centered(&sum_bb, &sum_b, &sum_b);

    ncc_from_moments(&numerator, &var_a, &var_b)
}

/// Zero-mean, unit-variance circular NCC of two equally sized patches.
pub fn normalized_cross_corr(a: &Patch, b: &Patch) -> Result<Array2<f64>> {
    running_band_average(a, b, |band_a, band_b| {
        let n = band_a.len() as f64;
        let (za, sa) = standardize(band_a);
        let (zb, sb) = standardize(band_b);
        if sa * sb <= VARIANCE_EPSILON {
            return Ok(Array2::zeros(band_a.dim()));
        }
        let corr = circular_corr(&fft2_real(za.view()), &fft2_real(zb.view()));
        Ok(fftshift(&corr.mapv(|v| (v / n).clamp(-1.0, 1.0))))
    })
}

/// `corr(f, g)` from the spectra of `f` and `g`.
fn circular_corr(f: &Array2<Complex<f64>>, g: &Array2<Complex<f64>>) -> Array2<f64> {
    let q = Zip::from(f).and(g).map_collect(|&x, &y| x * y.conj());
    ifft2_real(&q)
}

/// `num / sqrt(var_a * var_b)`, zero where either variance is negligible
/// relative to its largest value, clipped to `[-1, 1]`.
fn ncc_from_moments(
    numerator: &Array2<f64>,
    var_a: &Array2<f64>,
    var_b: &Array2<f64>,
) -> Array2<f64> {
    let floor_a = VARIANCE_EPSILON * var_a.iter().copied().fold(0.0_f64, f64::max);
    let floor_b = VARIANCE_EPSILON * var_b.iter().copied().fold(0.0_f64, f64::max);
    Zip::from(numerator)
        .and(var_a)
        .and(var_b)
        .map_collect(|&num, &va, &vb| {
            if va <= floor_a || vb <= floor_b {
                0.0
            } else {
                (num / (va * vb).sqrt()).clamp(-1.0, 1.0)
            }
        })
}

/// Subtracts the mean and divides by the standard deviation.
/// Returns the standardized band and its standard deviation.
fn standardize(band: ArrayView2<f64>) -> (Array2<f64>, f64) {
    let n = band.len() as f64;
    let mean = band.sum() / n;
    let centered = band.mapv(|v| v - mean);
    let std = (centered.iter().map(|v| v * v).sum::<f64>() / n).sqrt();
    if std == 0.0 {
        return (centered, 0.0);
    }
    (centered.mapv(|v| v / std), std)
}

/// `{0, 1}` weights from an optional mask; `None` means all valid.
pub(crate) fn mask_weights(mask: Option<&Array2<bool>>, shape: (usize, usize)) -> Array2<f64> {
    match mask {
        Some(m) => m.mapv(|valid| if valid { 1.0 } else { 0.0 }),
        None => Array2::ones(shape),
    }
}
