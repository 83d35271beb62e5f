use ndarray::{Array1, Array2};
use num_complex::Complex;

use dhmatch_core::spectral::dct::complex_dct2;
use dhmatch_core::spectral::fft::{fftshift1, ifftshift1};
use dhmatch_core::spectral::filters::{
    gaussian_mask, guarded_div, hamming, raised_cosine, threshold_mask, unit_phasor,
};
use dhmatch_core::spectral::{
    fft2, fft2_real, fftshift, ifft2, ifft2_real, ifftshift, normalize_power_spectrum,
    pad_spectrum, upsample_spectrum,
};

fn ramp(h: usize, w: usize) -> Array2<f64> {
    Array2::from_shape_fn((h, w), |(i, j)| ((i * 7 + j * 3) % 11) as f64 - 4.0 + 0.1 * i as f64)
}

fn max_complex_diff(a: &Array2<Complex<f64>>, b: &Array2<Complex<f64>>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}

// ===== FFT =====

#[test]
fn test_fft_round_trip() {
    let data = ramp(6, 9);
    let back = ifft2_real(&fft2_real(data.view()));
    for (x, y) in data.iter().zip(back.iter()) {
        assert!((x - y).abs() < 1e-10, "round trip mismatch: {x} vs {y}");
    }
}

#[test]
fn test_fft_dc_is_sum() {
    let data = ramp(4, 5);
    let spectrum = fft2_real(data.view());
    assert!((spectrum[[0, 0]].re - data.sum()).abs() < 1e-10);
    assert!(spectrum[[0, 0]].im.abs() < 1e-10);
}

#[test]
fn test_complex_fft_round_trip() {
    let data = ramp(5, 4).mapv(|v| Complex::new(v, -0.5 * v));
    let back = ifft2(&fft2(&data));
    assert!(max_complex_diff(&data, &back) < 1e-10);
}

#[test]
fn test_fftshift_moves_origin_to_centre() {
    let mut data = Array2::<f64>::zeros((5, 6));
    data[[0, 0]] = 1.0;
    let shifted = fftshift(&data);
    assert_eq!(shifted[[2, 3]], 1.0);
    assert_eq!(ifftshift(&shifted), data);
}

#[test]
fn test_fftshift1_odd_length() {
    let data = Array1::from(vec![0, 1, 2, 3, -3, -2, -1]);
    let shifted = fftshift1(&data);
    assert_eq!(shifted.to_vec(), vec![-3, -2, -1, 0, 1, 2, 3]);
    assert_eq!(ifftshift1(&shifted), data);
}

// ===== Normalization =====

#[test]
fn test_normalize_power_spectrum_idempotent() {
    let spectrum = fft2_real(ramp(8, 8).view());
    let once = normalize_power_spectrum(&spectrum);
    let twice = normalize_power_spectrum(&once);
    assert!(max_complex_diff(&once, &twice) < 1e-12);
    for z in once.iter().filter(|z| z.norm() > 0.0) {
        assert!((z.norm() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_unit_phasor_keeps_zero() {
    assert_eq!(unit_phasor(Complex::new(0.0, 0.0)), Complex::new(0.0, 0.0));
    let z = unit_phasor(Complex::new(3.0, 4.0));
    assert!((z.re - 0.6).abs() < 1e-12 && (z.im - 0.8).abs() < 1e-12);
}

#[test]
fn test_guarded_div_zero_denominator() {
    assert_eq!(guarded_div(5.0, 0.0), 0.0);
    assert_eq!(guarded_div(6.0, 3.0), 2.0);
}

// ===== Resampling =====

#[test]
fn test_pad_spectrum_then_crop_restores() {
    for (h, w) in [(6, 8), (5, 7)] {
        let spectrum = fft2_real(ramp(h, w).view());
        let padded = pad_spectrum(&spectrum, 2 * h, 2 * w);
        assert_eq!(padded.dim(), (2 * h, 2 * w));
        let back = pad_spectrum(&padded, h, w);
        assert!(
            max_complex_diff(&spectrum, &back) < 1e-9,
            "pad/crop mismatch for {h}x{w}"
        );
    }
}

#[test]
fn test_pad_spectrum_interpolates_samples() {
    // Band-limited (odd-size) signal: even samples of the 2x interpolation
    // reproduce the original samples.
    let data = ramp(5, 5);
    let padded = pad_spectrum(&fft2_real(data.view()), 10, 10);
    let interpolated = ifft2_real(&padded);
    for ((i, j), &v) in data.indexed_iter() {
        assert!(
            (interpolated[[2 * i, 2 * j]] - v).abs() < 1e-9,
            "sample ({i}, {j}) changed"
        );
    }
}

#[test]
fn test_upsample_spectrum_factor_one_matches_ifft() {
    let spectrum = fft2_real(ramp(6, 5).view());
    let direct = ifft2(&spectrum).mapv(|z| z * 30.0);
    let via_dft = upsample_spectrum(&spectrum, 6, 5, 1.0, 0.0, 0.0);
    assert!(max_complex_diff(&direct, &via_dft) < 1e-9);
}

#[test]
fn test_upsample_spectrum_offset_window() {
    let spectrum = fft2_real(ramp(8, 8).view());
    let full = ifft2(&spectrum).mapv(|z| z * 64.0);
    // A 3x3 window starting at pixel (2, 5).
    let window = upsample_spectrum(&spectrum, 3, 3, 1.0, -2.0, -5.0);
    for u in 0..3 {
        for v in 0..3 {
            assert!((window[[u, v]] - full[[2 + u, 5 + v]]).norm() < 1e-9);
        }
    }
}

// ===== Filters =====

#[test]
fn test_raised_cosine_passband_and_stopband() {
    let window = raised_cosine((16, 16), 0.25);
    assert!((window[[0, 0]] - 1.0).abs() < 1e-12);
    assert!(window[[8, 8]].abs() < 1e-12);
    assert!(window.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_gaussian_mask_peaks_at_dc() {
    let mask = gaussian_mask((8, 8), 0.2);
    assert!((mask[[0, 0]] - 1.0).abs() < 1e-12);
    assert!(mask[[4, 4]] < mask[[1, 1]]);
}

#[test]
fn test_threshold_mask_fraction() {
    let spectrum = Array2::from_shape_vec(
        (1, 3),
        vec![
            Complex::new(10.0, 0.0),
            Complex::new(0.5, 0.0),
            Complex::new(2.0, 0.0),
        ],
    )
    .unwrap();
    let mask = threshold_mask(&spectrum, 0.1);
    assert_eq!(mask.iter().copied().collect::<Vec<_>>(), vec![true, false, true]);
}

#[test]
fn test_hamming_endpoints() {
    let w = hamming(9);
    assert!((w[0] - 0.08).abs() < 1e-12);
    assert!((w[4] - 1.0).abs() < 1e-12);
    assert!((w[8] - 0.08).abs() < 1e-12);
}

// ===== Cosine transform =====

#[test]
fn test_complex_dct_real_part_is_dct2() {
    let data = ramp(4, 3);
    let dct = complex_dct2(data.view());
    let (m, n) = data.dim();
    for k in 0..m {
        for l in 0..n {
            let mut expected = 0.0;
            for p in 0..m {
                for q in 0..n {
                    expected += data[[p, q]]
                        * (std::f64::consts::PI * k as f64 * (2 * p + 1) as f64 / (2 * m) as f64)
                            .cos()
                        * (std::f64::consts::PI * l as f64 * (2 * q + 1) as f64 / (2 * n) as f64)
                            .cos();
                }
            }
            // Re of the product of two complex exponentials keeps a
            // sin·sin cross term; compare only the separable rows/columns.
            if k == 0 || l == 0 {
                assert!(
                    (dct[[k, l]].re - expected).abs() < 1e-9,
                    "bin ({k}, {l}): {} vs {expected}",
                    dct[[k, l]].re
                );
            }
        }
    }
}
