//! COSI-Corr frequency correlator (Leprince et al., 2007).
//!
//! Phase correlation of raised-cosine weighted spectra. When the two
//! templates differ in size, the larger one is re-cropped around the
//! integer peak of the previous pass, so the returned cross-spectrum only
//! holds the residual displacement on top of an integer coarse offset.

use ndarray::{Array2, Zip};
use num_complex::Complex;
use tracing::debug;

use crate::config::CosiCorrConfig;
use crate::error::Result;
use crate::patch::{running_band_average, Patch};
use crate::peak::locate_peak;
use crate::spectral::filters::{raised_cosine, threshold_mask};
use crate::spectral::{fft2_real, fftshift, ifft2_real, normalize_power_spectrum};
use crate::template::CropWindows;

use super::fourier::band_cross_spectra;

#[derive(Clone, Debug)]
pub struct CosiCorrOutput {
    /// Normalized cross-spectrum of the final pass.
    pub spectrum: Array2<Complex<f64>>,
    /// Frequency bins where the windowed reference spectrum is significant.
    pub mask: Array2<bool>,
    /// Integer displacement already compensated by re-cropping.
    pub coarse_offset: (i64, i64),
}

pub fn cosi_corr(a: &Patch, b: &Patch, params: &CosiCorrConfig) -> Result<CosiCorrOutput> {
    let passes = if a.dim() == b.dim() {
        1
    } else {
        params.passes.max(1)
    };

    let mut offset = (0_i64, 0_i64);
    let mut pass = 0;
    loop {
        let windows = CropWindows::new(a.dim(), b.dim(), offset.0, offset.1);
        let (ta, tb) = windows.apply(a, b);
        let shape = ta.dim();
        let w1 = raised_cosine(shape, params.beta_reference);
        let w2 = raised_cosine(shape, params.beta_search);

        let q = band_cross_spectra(&ta, &tb, |s1, s2| {
            let mut q = Array2::<Complex<f64>>::zeros(shape);
            Zip::from(&mut q)
                .and(s1)
                .and(s2)
                .and(&w1)
                .and(&w2)
                .for_each(|q, &x, &y, &u, &v| *q = (x * u) * (y * v).conj());
            q
        })?;
        let reference = running_band_average(&ta, &ta, |band, _| {
            Ok(fft2_real(band).mapv(|z| z.norm()) * &w1)
        })?;

        let spectrum = normalize_power_spectrum(&q);
        let mask = threshold_mask(&reference.mapv(|m| Complex::new(m, 0.0)), params.threshold);

        pass += 1;
        let peak = locate_peak(&fftshift(&ifft2_real(&spectrum)));
        debug!(pass, di = peak.di, dj = peak.dj, "cosi-corr pass");
        if pass >= passes || (peak.di == 0 && peak.dj == 0) {
            return Ok(CosiCorrOutput {
                spectrum,
                mask,
                coarse_offset: offset,
            });
        }

        let requested = CropWindows::new(
            a.dim(),
            b.dim(),
            offset.0 + peak.di,
            offset.1 + peak.dj,
        );
        let next = requested.applied_shift(a.dim(), b.dim());
        if next == offset {
            return Ok(CosiCorrOutput {
                spectrum,
                mask,
                coarse_offset: offset,
            });
        }
        offset = next;
    }
}
