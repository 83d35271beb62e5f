mod common;

use ndarray::{s, Array2, Array3, Axis};

use dhmatch_core::config::{CorrelatorMethod, CosiCorrConfig, CosineConfig};
use dhmatch_core::correlate::cosi::cosi_corr;
use dhmatch_core::correlate::gradient::kroon_gradient;
use dhmatch_core::correlate::masked::{masked_corr, normalized_cross_corr};
use dhmatch_core::correlate::Correlation;
use dhmatch_core::patch::Patch;
use dhmatch_core::peak::locate_peak;
use dhmatch_core::synthetic::{shifted_pair_bands, smooth_noise};

use common::{max_abs_diff, rolled_pair, roll};

fn surface_of(method: &CorrelatorMethod, a: &Patch, b: &Patch) -> Array2<f64> {
    method
        .correlate(a, b)
        .unwrap()
        .correlation
        .into_surface()
}

// ===== Integer recovery =====

#[test]
fn test_every_correlator_recovers_integer_shift() {
    let (a, b) = rolled_pair(32, 3, -2, 7);
    for method in CorrelatorMethod::all() {
        let peak = locate_peak(&surface_of(&method, &a, &b));
        assert_eq!(
            (peak.di, peak.dj),
            (3, -2),
            "{method} found ({}, {})",
            peak.di,
            peak.dj
        );
    }
}

#[test]
fn test_zero_shift_peaks_at_centre() {
    let (a, _) = rolled_pair(24, 0, 0, 3);
    for method in [
        CorrelatorMethod::PhaseCorrelation,
        CorrelatorMethod::OrientationCorrelation,
        CorrelatorMethod::NormalizedCrossCorrelation,
        CorrelatorMethod::CosineCorrelation(CosineConfig::default()),
    ] {
        let peak = locate_peak(&surface_of(&method, &a, &a));
        assert_eq!((peak.di, peak.dj), (0, 0), "{method}");
    }
}

#[test]
fn test_odd_sized_patch_shift() {
    let (a, b) = rolled_pair(31, -4, 5, 11);
    let peak = locate_peak(&surface_of(&CorrelatorMethod::PhaseCorrelation, &a, &b));
    assert_eq!((peak.di, peak.dj), (-4, 5));
}

#[test]
fn test_phase_correlation_peak_is_unity() {
    let (a, b) = rolled_pair(32, 2, 2, 5);
    let peak = locate_peak(&surface_of(&CorrelatorMethod::PhaseCorrelation, &a, &b));
    assert!((peak.score - 1.0).abs() < 1e-9, "score {}", peak.score);
}

#[test]
fn test_spectrum_correlators_return_spectra() {
    let (a, b) = rolled_pair(16, 1, 1, 2);
    let output = CorrelatorMethod::PhaseCorrelation.correlate(&a, &b).unwrap();
    assert!(matches!(output.correlation, Correlation::Spectrum(_)));
    let output = CorrelatorMethod::MaskedCorrelation.correlate(&a, &b).unwrap();
    assert!(matches!(output.correlation, Correlation::Surface(_)));
    assert_eq!(output.correlation.dim(), (16, 16));
}

#[test]
fn test_produces_surface_matches_output() {
    let (a, b) = rolled_pair(16, 1, 1, 2);
    for method in CorrelatorMethod::all() {
        let output = method.correlate(&a, &b).unwrap();
        let is_surface = matches!(output.correlation, Correlation::Surface(_));
        assert_eq!(is_surface, method.produces_surface(), "{}", method);
    }
}

// ===== Unequal sizes =====

#[test]
fn test_unequal_sizes_centre_cropped() {
    let big = smooth_noise(48, 48, 1.5, 21);
    // b(i, j) = window(i + 3, j - 2) of the centred 32x32 window of `big`.
    let small = big.slice(s![11..43, 6..38]).to_owned();
    let a = Patch::new(big);
    let b = Patch::new(small);
    let peak = locate_peak(&surface_of(&CorrelatorMethod::PhaseCorrelation, &a, &b));
    assert_eq!((peak.di, peak.dj), (3, -2));
}

#[test]
fn test_cosi_corr_recenters_unequal_templates() {
    let big = smooth_noise(48, 48, 1.5, 21);
    let small = big.slice(s![11..43, 6..38]).to_owned();
    let a = Patch::new(big);
    let b = Patch::new(small);

    let output = cosi_corr(&a, &b, &CosiCorrConfig::default()).unwrap();
    assert_eq!(output.coarse_offset, (3, -2));
    assert!(output.mask.iter().any(|&m| m));
    assert!(output.mask.iter().any(|&m| !m));
    let residual = locate_peak(&Correlation::Spectrum(output.spectrum).into_surface());
    assert_eq!((residual.di, residual.dj), (0, 0));
}

#[test]
fn test_cosi_corr_through_dispatch_reports_offset() {
    let big = smooth_noise(48, 48, 1.5, 21);
    let small = big.slice(s![11..43, 6..38]).to_owned();
    let method = CorrelatorMethod::CosiCorr(CosiCorrConfig::default());
    let output = method
        .correlate(&Patch::new(big), &Patch::new(small))
        .unwrap();
    let peak = locate_peak(&output.correlation.into_surface());
    assert_eq!(
        (output.coarse_offset.0 + peak.di, output.coarse_offset.1 + peak.dj),
        (3, -2)
    );
}

#[test]
fn test_spectral_mask_only_from_cosi_corr() {
    let (a, b) = rolled_pair(32, 3, -2, 5);
    for method in CorrelatorMethod::all() {
        let output = method.correlate(&a, &b).unwrap();
        let is_cosi = matches!(method, CorrelatorMethod::CosiCorr(_));
        assert_eq!(output.spectral_mask.is_some(), is_cosi, "{}", method);
        if let Some(mask) = output.spectral_mask {
            assert_eq!(mask.dim(), output.correlation.dim());
            assert!(mask.iter().any(|&m| m));
        }
    }
}

#[test]
fn test_surface_spectrum_round_trips() {
    let (a, b) = rolled_pair(20, 2, -3, 9);
    let output = CorrelatorMethod::NormalizedCrossCorrelation
        .correlate(&a, &b)
        .unwrap();
    let spectrum = output.correlation.spectrum();
    let back = Correlation::Spectrum(spectrum).into_surface();
    let surface = output.correlation.into_surface();
    assert!(max_abs_diff(&back, &surface) < 1e-9);
}

// ===== Multi-band =====

#[test]
fn test_band_permutation_invariance() {
    let (a, b) = shifted_pair_bands(24, 24, 3, 2.0, -1.0, 40).unwrap();
    let permute = |p: &Patch| {
        let mut data = Array3::<f64>::zeros(p.data().dim());
        for (dst, src) in [(0, 2), (1, 0), (2, 1)] {
            data.index_axis_mut(Axis(2), dst).assign(&p.band(src));
        }
        Patch::from_bands(data).unwrap()
    };
    let (pa, pb) = (permute(&a), permute(&b));
    for method in [
        CorrelatorMethod::PhaseCorrelation,
        CorrelatorMethod::CrossCorrelation,
        CorrelatorMethod::NormalizedCrossCorrelation,
        CorrelatorMethod::GradientCorrelation,
    ] {
        let original = surface_of(&method, &a, &b);
        let permuted = surface_of(&method, &pa, &pb);
        assert!(
            max_abs_diff(&original, &permuted) < 1e-9,
            "{method} depends on band order"
        );
        let peak = locate_peak(&original);
        assert_eq!((peak.di, peak.dj), (2, -1), "{method}");
    }
}

// ===== Masks =====

#[test]
fn test_masked_corr_with_full_masks_equals_ncc() {
    let (a, b) = rolled_pair(20, 2, -3, 9);
    let ones = Array2::from_elem((20, 20), true);
    let masked = masked_corr(&a, &b, Some(&ones), Some(&ones)).unwrap();
    let plain = normalized_cross_corr(&a, &b).unwrap();
    assert!(
        max_abs_diff(&masked, &plain) < 1e-8,
        "max diff {}",
        max_abs_diff(&masked, &plain)
    );
}

#[test]
fn test_masked_corr_ignores_corrupted_pixels() {
    let texture = smooth_noise(32, 32, 1.5, 13);
    let mut shifted = roll(&texture, 2, 4);
    let mut mask_b = Array2::from_elem((32, 32), true);
    for i in 4..14 {
        for j in 18..28 {
            shifted[[i, j]] = 50.0;
            mask_b[[i, j]] = false;
        }
    }
    let a = Patch::new(texture);
    let b = Patch::new(shifted);
    let surface = masked_corr(&a, &b, None, Some(&mask_b)).unwrap();
    let peak = locate_peak(&surface);
    assert_eq!((peak.di, peak.dj), (2, 4));
    assert!(surface.iter().all(|v| (-1.0..=1.0).contains(v)));
}

#[test]
fn test_ncc_is_bounded() {
    let (a, b) = rolled_pair(16, 1, 0, 4);
    let surface = normalized_cross_corr(&a, &b).unwrap();
    let peak = locate_peak(&surface);
    assert!((peak.score - 1.0).abs() < 1e-9);
    assert!(surface.iter().all(|v| (-1.0..=1.0).contains(v)));
}

#[test]
fn test_constant_patch_gives_zero_ncc() {
    let a = Patch::new(Array2::from_elem((8, 8), 3.0));
    let surface = normalized_cross_corr(&a, &a).unwrap();
    assert!(surface.iter().all(|&v| v == 0.0));
}

#[test]
fn test_unmasked_methods_ignore_masks() {
    let (a, b) = rolled_pair(16, 1, 2, 6);
    let mut mask = Array2::from_elem((16, 16), true);
    mask[[0, 0]] = false;
    let method = CorrelatorMethod::PhaseCorrelation;
    let with = method
        .correlate_masked(&a, &b, Some(&mask), Some(&mask))
        .unwrap()
        .correlation
        .into_surface();
    let without = surface_of(&method, &a, &b);
    assert!(max_abs_diff(&with, &without) < 1e-12);
    assert!(!method.supports_masks());
    assert!(CorrelatorMethod::MaskedCorrelation.supports_masks());
}

#[test]
fn test_mask_shape_mismatch_rejected() {
    let (a, b) = rolled_pair(16, 0, 0, 1);
    let mask = Array2::from_elem((8, 8), true);
    let result = CorrelatorMethod::MaskedCorrelation.correlate_masked(&a, &b, Some(&mask), None);
    assert!(result.is_err());
}

// ===== Gradients =====

#[test]
fn test_kroon_gradient_of_ramp() {
    let ramp = Array2::from_shape_fn((6, 6), |(i, j)| 2.0 * i as f64 + 3.0 * j as f64);
    let g = kroon_gradient(ramp.view());
    // Unscaled central difference: twice the slope along each axis.
    let z = g[[3, 3]];
    assert!((z.re - 6.0).abs() < 1e-9, "gx = {}", z.re);
    assert!((z.im - 4.0).abs() < 1e-9, "gy = {}", z.im);
}
