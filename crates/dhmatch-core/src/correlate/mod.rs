//! The correlator family.
//!
//! Every [`CorrelatorMethod`] turns two patches into either a cross-spectrum
//! (unshifted FFT order) or a real correlation surface (fftshift-ed, zero
//! displacement at the centre). Unequal patch sizes are centre-cropped to
//! the common shape first; multi-band patches are averaged band by band.

pub mod cosi;
pub mod cosine;
pub mod fourier;
pub mod gradient;
pub mod masked;
pub mod projected;

use ndarray::Array2;
use num_complex::Complex;
use tracing::debug;

use crate::config::CorrelatorMethod;
use crate::error::Result;
use crate::patch::{validate_mask, validate_pair, Patch};
use crate::spectral::{fft2_real, fftshift, ifft2_real, ifftshift};
use crate::template::CropWindows;

/// Output of a correlator.
#[derive(Clone, Debug)]
pub enum Correlation {
    /// Cross-spectrum in unshifted FFT order.
    Spectrum(Array2<Complex<f64>>),
    /// Correlation surface, zero displacement at `(rows/2, cols/2)`.
    Surface(Array2<f64>),
}

impl Correlation {
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Correlation::Spectrum(q) => q.dim(),
            Correlation::Surface(c) => c.dim(),
        }
    }

    /// The correlation surface; spectra are inverted and fftshift-ed.
    pub fn into_surface(self) -> Array2<f64> {
        match self {
            Correlation::Spectrum(q) => fftshift(&ifft2_real(&q)),
            Correlation::Surface(c) => c,
        }
    }

    /// The cross-spectrum in unshifted FFT order; surfaces are
    /// ifftshift-ed and transformed.
    pub fn spectrum(&self) -> Array2<Complex<f64>> {
        match self {
            Correlation::Spectrum(q) => q.clone(),
            Correlation::Surface(c) => fft2_real(ifftshift(c).view()),
        }
    }
}

/// A correlation plus any integer displacement the correlator already
/// compensated internally (COSI-Corr recentering). The total displacement
/// is `coarse_offset` plus whatever the correlation shows.
#[derive(Clone, Debug)]
pub struct CorrelatorOutput {
    pub correlation: Correlation,
    pub coarse_offset: (i64, i64),
    /// Frequency bins judged reliable, for correlators that estimate them
    /// (COSI-Corr). Same shape and order as the spectrum.
    pub spectral_mask: Option<Array2<bool>>,
}

impl CorrelatorMethod {
    /// Correlates two patches with all pixels valid.
    pub fn correlate(&self, a: &Patch, b: &Patch) -> Result<CorrelatorOutput> {
        self.correlate_masked(a, b, None, None)
    }

    /// Correlates two patches with optional validity masks. Masks are used by
    /// the masked NCC and projected phase correlation; other methods ignore
    /// them.
    pub fn correlate_masked(
        &self,
        a: &Patch,
        b: &Patch,
        mask_a: Option<&Array2<bool>>,
        mask_b: Option<&Array2<bool>>,
    ) -> Result<CorrelatorOutput> {
        validate_pair(a, b)?;
        validate_mask(a, mask_a)?;
        validate_mask(b, mask_b)?;

        if (mask_a.is_some() || mask_b.is_some()) && !self.supports_masks() {
            debug!(method = %self, "masks ignored by correlator");
        }

        // COSI-Corr re-crops unequal originals itself, pass by pass.
        if let CorrelatorMethod::CosiCorr(params) = self {
            if a.dim() != b.dim() {
                let output = cosi::cosi_corr(a, b, params)?;
                return Ok(CorrelatorOutput {
                    correlation: Correlation::Spectrum(output.spectrum),
                    coarse_offset: output.coarse_offset,
                    spectral_mask: Some(output.mask),
                });
            }
        }

        let windows = CropWindows::new(a.dim(), b.dim(), 0, 0);
        let (a, b) = windows.apply(a, b);
        let (mask_a, mask_b) = windows.apply_masks(mask_a, mask_b);

        let mut spectral_mask = None;
        let correlation = match self {
            CorrelatorMethod::CrossCorrelation => Correlation::Spectrum(fourier::cross_corr(&a, &b)?),
            CorrelatorMethod::PhaseCorrelation => Correlation::Spectrum(fourier::phase_corr(&a, &b)?),
            CorrelatorMethod::PhaseOnly => Correlation::Spectrum(fourier::phase_only_corr(&a, &b)?),
            CorrelatorMethod::SymmetricPhase => {
                Correlation::Spectrum(fourier::symmetric_phase_corr(&a, &b)?)
            }
            CorrelatorMethod::AmplitudeCompensated(params) => {
                Correlation::Spectrum(fourier::amplitude_comp_corr(&a, &b, params.cutoff)?)
            }
            CorrelatorMethod::OrientationCorrelation => {
                Correlation::Spectrum(gradient::orientation_corr(&a, &b)?)
            }
            CorrelatorMethod::GradientCorrelation => {
                Correlation::Spectrum(gradient::gradient_corr(&a, &b)?)
            }
            CorrelatorMethod::NormalizedGradientCorrelation => {
                Correlation::Spectrum(gradient::normalized_gradient_corr(&a, &b)?)
            }
            CorrelatorMethod::WindroseCorrelation => {
                Correlation::Spectrum(fourier::windrose_corr(&a, &b)?)
            }
            CorrelatorMethod::BinaryOrientation => {
                Correlation::Spectrum(fourier::binary_orientation_corr(&a, &b)?)
            }
            CorrelatorMethod::RobustCorrelation(params) => {
                Correlation::Spectrum(fourier::robust_corr(&a, &b, &params.exponents)?)
            }
            CorrelatorMethod::GaussianTransformedPhase(params) => Correlation::Spectrum(
                fourier::gaussian_transformed_phase_corr(&a, &b, params.sigma)?,
            ),
            CorrelatorMethod::CosineCorrelation(params) => {
                Correlation::Surface(cosine::cosine_corr(&a, &b, params.sign_only)?)
            }
            CorrelatorMethod::MaskedCorrelation => Correlation::Surface(masked::masked_corr(
                &a,
                &b,
                mask_a.as_ref(),
                mask_b.as_ref(),
            )?),
            CorrelatorMethod::NormalizedCrossCorrelation => {
                Correlation::Surface(masked::normalized_cross_corr(&a, &b)?)
            }
            CorrelatorMethod::ProjectedPhaseCorrelation => {
                Correlation::Surface(projected::projected_phase_corr(
                    &a,
                    &b,
                    mask_a.as_ref(),
                    mask_b.as_ref(),
                )?)
            }
            CorrelatorMethod::CosiCorr(params) => {
                let output = cosi::cosi_corr(&a, &b, params)?;
                spectral_mask = Some(output.mask);
                Correlation::Spectrum(output.spectrum)
            }
        };

        Ok(CorrelatorOutput {
            correlation,
            coarse_offset: (0, 0),
            spectral_mask,
        })
    }

    /// Whether the method honours validity masks.
    pub fn supports_masks(&self) -> bool {
        matches!(
            self,
            CorrelatorMethod::MaskedCorrelation | CorrelatorMethod::ProjectedPhaseCorrelation
        )
    }
}
