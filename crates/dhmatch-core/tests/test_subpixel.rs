mod common;

use nalgebra::Vector3;
use ndarray::Array2;

use dhmatch_core::config::{MomentConfig, RefinerMethod};
use dhmatch_core::error::MatchError;
use dhmatch_core::peak::{locate_peak, IntegerPeak};
use dhmatch_core::spectral::{fftshift, ifft2_real};
use dhmatch_core::subpixel::{LevenbergMarquardt, RootFinder};
use dhmatch_core::synthetic::{correlation_peak, phase_plane};

use common::sinc_peak;

const SHAPE: (usize, usize) = (21, 21);

fn refine(method: RefinerMethod, surface: &Array2<f64>) -> (f64, f64) {
    let estimate = method.refine(surface, None).unwrap();
    (estimate.di(), estimate.dj())
}

fn assert_recovers(method: RefinerMethod, surface: &Array2<f64>, di: f64, dj: f64, tol: f64) {
    let (got_i, got_j) = refine(method.clone(), surface);
    assert!(
        (got_i - di).abs() < tol && (got_j - dj).abs() < tol,
        "{method}: got ({got_i:.4}, {got_j:.4}), want ({di}, {dj}) within {tol}"
    );
}

// ===== 1D fits on Gaussian peaks =====

#[test]
fn test_parabolic_on_gaussian_peak() {
    let surface = correlation_peak(SHAPE, 3.3, -1.2, 3.0);
    assert_recovers(RefinerMethod::Parabolic, &surface, 3.3, -1.2, 0.05);
}

#[test]
fn test_gaussian_fit_is_exact_on_gaussian_peak() {
    let surface = correlation_peak(SHAPE, -2.45, 0.3, 3.0);
    assert_recovers(RefinerMethod::Gaussian, &surface, -2.45, 0.3, 1e-9);
}

#[test]
fn test_blais_on_gaussian_peak() {
    let surface = correlation_peak(SHAPE, 1.3, -0.2, 3.0);
    assert_recovers(RefinerMethod::Blais, &surface, 1.3, -0.2, 0.02);
}

#[test]
fn test_line_fits_on_gaussian_peak() {
    let surface = correlation_peak(SHAPE, 0.3, -0.2, 3.0);
    for method in [
        RefinerMethod::Equiangular,
        RefinerMethod::Triangular,
        RefinerMethod::Birchfield,
    ] {
        assert_recovers(method, &surface, 0.3, -0.2, 0.07);
    }
}

#[test]
fn test_biased_estimators_keep_direction() {
    let surface = correlation_peak(SHAPE, 0.3, -0.2, 3.0);
    for method in [RefinerMethod::Centroid, RefinerMethod::Mass, RefinerMethod::Ren] {
        let estimate = method.refine(&surface, None).unwrap();
        assert!(estimate.ddi > 0.0 && estimate.ddi < 0.5, "{method}: ddi {}", estimate.ddi);
        assert!(estimate.ddj < 0.0 && estimate.ddj > -0.5, "{method}: ddj {}", estimate.ddj);
    }
}

#[test]
fn test_symmetric_peak_needs_no_correction() {
    let surface = correlation_peak(SHAPE, 2.0, -1.0, 3.0);
    for method in RefinerMethod::all() {
        if method == RefinerMethod::Esinc {
            continue;
        }
        let estimate = method.refine(&surface, None).unwrap();
        assert!(
            estimate.ddi.abs() < 1e-9 && estimate.ddj.abs() < 1e-9,
            "{method}: ({}, {})",
            estimate.ddi,
            estimate.ddj
        );
        assert_eq!((estimate.peak.di, estimate.peak.dj), (2, -1));
    }
}

// ===== 1D fits on sinc peaks =====

#[test]
fn test_ren_and_equiangular_on_sinc_peak() {
    let surface = sinc_peak(SHAPE, 0.3, -0.2);
    assert_recovers(RefinerMethod::Ren, &surface, 0.3, -0.2, 0.1);
    assert_recovers(RefinerMethod::Equiangular, &surface, 0.3, -0.2, 0.04);
    assert_recovers(RefinerMethod::Blais, &surface, 0.3, -0.2, 0.005);
}

// ===== 2D fits =====

#[test]
fn test_gaussian_2d_exact_on_gaussian_peak() {
    let surface = correlation_peak(SHAPE, 0.3, -0.2, 3.0);
    assert_recovers(RefinerMethod::Gaussian2d, &surface, 0.3, -0.2, 1e-9);
}

#[test]
fn test_paraboloid_and_blue() {
    let surface = correlation_peak(SHAPE, -0.4, 0.15, 3.0);
    assert_recovers(RefinerMethod::Paraboloid, &surface, -0.4, 0.15, 0.03);
    assert_recovers(RefinerMethod::Blue, &surface, -0.4, 0.15, 0.03);
}

#[test]
fn test_moment_radius_one_and_two() {
    let surface = correlation_peak(SHAPE, 0.3, -0.2, 3.0);
    assert_recovers(RefinerMethod::Moment(MomentConfig { radius: 1 }), &surface, 0.3, -0.2, 0.15);
    assert_recovers(RefinerMethod::Moment(MomentConfig { radius: 2 }), &surface, 0.3, -0.2, 0.06);
}

#[test]
fn test_blue_singular_on_flat_surface() {
    let surface = Array2::from_elem(SHAPE, 0.5);
    let peak = IntegerPeak {
        di: 0,
        dj: 0,
        score: 0.5,
        snr: 1.0,
    };
    let result = RefinerMethod::Blue.refine(&surface, Some(peak));
    assert!(matches!(result, Err(MatchError::SingularHessian { di: 0, dj: 0 })));
}

// ===== esinc =====

#[test]
fn test_esinc_on_sinc_peak() {
    let surface = sinc_peak(SHAPE, 0.3, -0.2);
    assert_recovers(RefinerMethod::Esinc, &surface, 0.3, -0.2, 1e-3);
}

#[test]
fn test_esinc_on_phase_correlation_peak() {
    let surface = fftshift(&ifft2_real(&phase_plane((64, 64), 1.35, -2.2)));
    assert_recovers(RefinerMethod::Esinc, &surface, 1.35, -2.2, 0.02);
}

#[test]
fn test_esinc_fails_on_peak_wider_than_sinc() {
    let surface = correlation_peak(SHAPE, 0.3, -0.2, 3.0);
    let result = RefinerMethod::Esinc.refine(&surface, None);
    assert!(matches!(result, Err(MatchError::SolverDidNotConverge { .. })));
}

#[test]
fn test_esinc_reports_solver_failure() {
    let surface = sinc_peak(SHAPE, 0.3, -0.2);
    let solver = LevenbergMarquardt {
        max_iterations: 0,
        tolerance: 1e-12,
    };
    let result = RefinerMethod::Esinc.refine_with(&surface, None, &solver);
    assert!(matches!(
        result,
        Err(MatchError::SolverDidNotConverge { iterations: 0 })
    ));
}

struct FixedRoot;

impl RootFinder for FixedRoot {
    fn solve(
        &self,
        _residual: &dyn Fn(&Vector3<f64>) -> Vector3<f64>,
        _initial: Vector3<f64>,
    ) -> dhmatch_core::error::Result<Vector3<f64>> {
        Ok(Vector3::new(1.0, 0.0, 0.25))
    }
}

#[test]
fn test_esinc_uses_injected_root_finder() {
    let surface = sinc_peak(SHAPE, 0.0, 0.0);
    let estimate = RefinerMethod::Esinc
        .refine_with(&surface, None, &FixedRoot)
        .unwrap();
    assert_eq!((estimate.ddi, estimate.ddj), (0.25, 0.25));
}

// ===== Border policy and degenerate input =====

#[test]
fn test_border_peak_is_not_refined() {
    let surface = correlation_peak((9, 9), 3.0, 0.0, 2.0);
    let peak = locate_peak(&surface);
    assert_eq!(peak.di, 3);
    // |3| + ds reaches half the surface for the wider neighbourhoods.
    for method in RefinerMethod::all().into_iter().filter(|m| m.radius() >= 2) {
        let estimate = method.refine(&surface, Some(peak)).unwrap();
        assert_eq!((estimate.ddi, estimate.ddj), (0.0, 0.0), "{method}");
        assert_eq!(estimate.peak, peak, "{method}");
    }
    let at_edge = correlation_peak((9, 9), 4.0, 0.0, 2.0);
    for method in RefinerMethod::all() {
        let estimate = method.refine(&at_edge, None).unwrap();
        assert_eq!((estimate.ddi, estimate.ddj), (0.0, 0.0), "{method}");
    }
}

#[test]
fn test_surface_smaller_than_neighbourhood_rejected() {
    let surface = correlation_peak((5, 5), 0.0, 0.0, 2.0);
    let result = RefinerMethod::Blais.refine(&surface, None);
    assert!(matches!(result, Err(MatchError::InvalidInputShape(_))));
    assert!(RefinerMethod::Parabolic.refine(&surface, None).is_ok());
}

#[test]
fn test_flat_line_fit_falls_back_to_zero() {
    let surface = Array2::from_elem((7, 7), 1.0);
    for method in [
        RefinerMethod::Parabolic,
        RefinerMethod::Equiangular,
        RefinerMethod::Triangular,
        RefinerMethod::Birchfield,
        RefinerMethod::Gaussian,
        RefinerMethod::Paraboloid,
    ] {
        let peak = IntegerPeak {
            di: 0,
            dj: 0,
            score: 1.0,
            snr: 1.0,
        };
        let estimate = method.refine(&surface, Some(peak)).unwrap();
        assert_eq!((estimate.ddi, estimate.ddj), (0.0, 0.0), "{method}");
    }
}
