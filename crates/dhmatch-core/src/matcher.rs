//! End-to-end matching: correlate, locate the integer peak, refine.

use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::config::{MatchConfig, SubpixelMethod};
use crate::consts::PARALLEL_PAIR_THRESHOLD;
use crate::error::{MatchError, Result};
use crate::patch::Patch;
use crate::peak::locate_peak_with;
use crate::subpixel::upsample_peak;

/// Displacement of the second patch relative to the first,
/// `b(i, j) ≈ a(i + di, j + dj)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Displacement {
    pub di: f64,
    pub dj: f64,
    /// Integer displacement before sub-pixel refinement.
    pub integer: (i64, i64),
    /// Correlation value at the integer peak.
    pub score: f64,
    pub snr: f64,
}

/// Two patches and their optional validity masks.
#[derive(Clone, Debug)]
pub struct PatchPair {
    pub a: Patch,
    pub b: Patch,
    pub mask_a: Option<Array2<bool>>,
    pub mask_b: Option<Array2<bool>>,
}

impl PatchPair {
    pub fn new(a: Patch, b: Patch) -> Self {
        Self {
            a,
            b,
            mask_a: None,
            mask_b: None,
        }
    }

    pub fn with_masks(mut self, mask_a: Array2<bool>, mask_b: Array2<bool>) -> Self {
        self.mask_a = Some(mask_a);
        self.mask_b = Some(mask_b);
        self
    }
}

/// Matches two patches with every pixel valid.
pub fn estimate_displacement(a: &Patch, b: &Patch, config: &MatchConfig) -> Result<Displacement> {
    estimate_displacement_masked(a, b, None, None, config)
}

/// Matches two patches with optional validity masks.
pub fn estimate_displacement_masked(
    a: &Patch,
    b: &Patch,
    mask_a: Option<&Array2<bool>>,
    mask_b: Option<&Array2<bool>>,
    config: &MatchConfig,
) -> Result<Displacement> {
    let output = config.correlator.correlate_masked(a, b, mask_a, mask_b)?;
    let (ci, cj) = output.coarse_offset;
    let surface = output.correlation.clone().into_surface();
    let peak = locate_peak_with(&surface, config.snr);
    let integer = (ci + peak.di, cj + peak.dj);

    let (di, dj) = match &config.subpixel {
        SubpixelMethod::None => (integer.0 as f64, integer.1 as f64),
        SubpixelMethod::Surface(refiner) => {
            let estimate = refiner.refine(&surface, Some(peak))?;
            (ci as f64 + estimate.di(), cj as f64 + estimate.dj())
        }
        // Interpolates the correlator's own result around its integer peak,
        // so masks and the chosen method carry through.
        SubpixelMethod::UpsampledDft(params) => {
            let spectrum = output.correlation.spectrum();
            let (di, dj) = upsample_peak(&spectrum, &peak, params.upsampling);
            (ci as f64 + di, cj as f64 + dj)
        }
    };

    debug!(
        correlator = %config.correlator,
        subpixel = %config.subpixel,
        di,
        dj,
        score = peak.score,
        snr = peak.snr,
        "matched pair"
    );

    Ok(Displacement {
        di,
        dj,
        integer,
        score: peak.score,
        snr: peak.snr,
    })
}

/// Matches every pair with the same configuration.
pub fn estimate_displacements(pairs: &[PatchPair], config: &MatchConfig) -> Result<Vec<Displacement>> {
    estimate_displacements_with_progress(pairs, config, |_| {})
}

/// Matches every pair, calling `on_pair_done` with the number of finished
/// pairs after each one. Runs in parallel above [`PARALLEL_PAIR_THRESHOLD`]
/// pairs; results keep the input order.
pub fn estimate_displacements_with_progress<F>(
    pairs: &[PatchPair],
    config: &MatchConfig,
    on_pair_done: F,
) -> Result<Vec<Displacement>>
where
    F: Fn(usize) + Send + Sync,
{
    if pairs.is_empty() {
        return Err(MatchError::EmptyBatch);
    }

    let counter = AtomicUsize::new(0);
    let match_one = |pair: &PatchPair| {
        let result = estimate_displacement_masked(
            &pair.a,
            &pair.b,
            pair.mask_a.as_ref(),
            pair.mask_b.as_ref(),
            config,
        );
        let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
        on_pair_done(done);
        result
    };

    if pairs.len() >= PARALLEL_PAIR_THRESHOLD {
        let results: Vec<Result<Displacement>> = pairs.par_iter().map(match_one).collect();
        results.into_iter().collect()
    } else {
        pairs.iter().map(match_one).collect()
    }
}
