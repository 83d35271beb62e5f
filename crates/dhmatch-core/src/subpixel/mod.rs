//! Sub-pixel refinement of integer correlation peaks.
//!
//! Every [`RefinerMethod`] reads a small neighbourhood around the integer
//! peak of a correlation surface and returns a fractional correction
//! `(ddi, ddj)`. The final displacement is the integer peak plus the
//! correction.
//!
//! Border policy: when the neighbourhood of radius `ds` would leave the
//! surface, refinement is skipped and `(0, 0)` is returned with the peak
//! unchanged.

pub mod esinc;
pub mod separable;
pub mod surface;
pub mod upsampled;

use ndarray::{Array2, Axis};
use tracing::trace;

use crate::config::RefinerMethod;
use crate::coords::{displacement_to_index, is_away_from_border};
use crate::error::{MatchError, Result};
use crate::peak::{locate_peak, IntegerPeak};

pub use esinc::{LevenbergMarquardt, RootFinder};
pub use upsampled::{upsample_peak, upsampled_cross_corr};

/// A fractional correction and the integer peak it refines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubpixelEstimate {
    pub ddi: f64,
    pub ddj: f64,
    pub peak: IntegerPeak,
}

impl SubpixelEstimate {
    /// Combined displacement along rows.
    pub fn di(&self) -> f64 {
        self.peak.di as f64 + self.ddi
    }

    /// Combined displacement along columns.
    pub fn dj(&self) -> f64 {
        self.peak.dj as f64 + self.ddj
    }
}

/// Read-only access to the surface around an integer peak.
pub struct Neighborhood<'a> {
    surface: &'a Array2<f64>,
    row: usize,
    col: usize,
}

impl<'a> Neighborhood<'a> {
    fn new(surface: &'a Array2<f64>, peak: &IntegerPeak) -> Option<Self> {
        let (row, col) = displacement_to_index(surface.dim(), peak.di, peak.dj)?;
        Some(Self { surface, row, col })
    }

    /// Surface value at offset `(di, dj)` from the peak.
    pub fn at(&self, di: isize, dj: isize) -> f64 {
        let row = (self.row as isize + di) as usize;
        let col = (self.col as isize + dj) as usize;
        self.surface[[row, col]]
    }

    /// Surface value `k` samples from the peak along `axis`.
    pub fn along(&self, axis: Axis, k: isize) -> f64 {
        match axis.index() {
            0 => self.at(k, 0),
            _ => self.at(0, k),
        }
    }
}

impl RefinerMethod {
    /// Neighbourhood radius `ds` the method reads around the peak.
    pub fn radius(&self) -> usize {
        match self {
            RefinerMethod::Mass => 2,
            RefinerMethod::Blais => 3,
            RefinerMethod::Moment(params) => params.radius.max(1),
            _ => 1,
        }
    }

    /// Refines `peak` (or the surface maximum when `None`) with the default
    /// root finder for the esinc estimator.
    pub fn refine(&self, surface: &Array2<f64>, peak: Option<IntegerPeak>) -> Result<SubpixelEstimate> {
        self.refine_with(surface, peak, &LevenbergMarquardt::default())
    }

    /// Refines with an explicit root finder for the esinc estimator.
    pub fn refine_with(
        &self,
        surface: &Array2<f64>,
        peak: Option<IntegerPeak>,
        solver: &dyn RootFinder,
    ) -> Result<SubpixelEstimate> {
        let ds = self.radius();
        let (rows, cols) = surface.dim();
        let window = 2 * ds + 1;
        if rows < window || cols < window {
            return Err(MatchError::InvalidInputShape(format!(
                "{} needs a {}x{} neighbourhood, surface is {}x{}",
                self, window, window, rows, cols
            )));
        }

        let peak = peak.unwrap_or_else(|| locate_peak(surface));
        let unrefined = SubpixelEstimate {
            ddi: 0.0,
            ddj: 0.0,
            peak,
        };
        if !is_away_from_border(surface.dim(), peak.di, peak.dj, ds) {
            trace!(di = peak.di, dj = peak.dj, ds, "peak at border, refinement skipped");
            return Ok(unrefined);
        }
        let Some(nb) = Neighborhood::new(surface, &peak) else {
            return Ok(unrefined);
        };

        let (ddi, ddj) = match self {
            RefinerMethod::Parabolic => separable::fit(&nb, separable::parabolic),
            RefinerMethod::Gaussian => separable::fit(&nb, separable::gaussian),
            RefinerMethod::Centroid => separable::fit(&nb, separable::centroid),
            RefinerMethod::Mass => separable::fit(&nb, separable::mass),
            RefinerMethod::Equiangular => separable::fit(&nb, separable::equiangular),
            RefinerMethod::Triangular => separable::fit(&nb, separable::triangular),
            RefinerMethod::Birchfield => separable::fit(&nb, separable::birchfield),
            RefinerMethod::Ren => separable::fit(&nb, separable::ren),
            RefinerMethod::Blais => separable::fit(&nb, separable::blais),
            RefinerMethod::Moment(_) => surface::moment(&nb, ds),
            RefinerMethod::Gaussian2d => surface::gaussian_2d(&nb),
            RefinerMethod::Paraboloid => surface::paraboloid(&nb),
            RefinerMethod::Blue => surface::blue(&nb).ok_or(MatchError::SingularHessian {
                di: peak.di,
                dj: peak.dj,
            })?,
            RefinerMethod::Esinc => esinc::esinc(&nb, solver)?,
        };

        Ok(SubpixelEstimate { ddi, ddj, peak })
    }
}

/// Replaces a non-finite correction (zero denominator, log of a
/// non-positive sample) with zero.
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        trace!(value, "degenerate sub-pixel fit, correction set to zero");
        0.0
    }
}
