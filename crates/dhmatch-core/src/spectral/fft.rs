use std::sync::Arc;

use ndarray::parallel::prelude::*;
use ndarray::{Array1, Array2, ArrayView2, ArrayViewMut1, Axis};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

// ---------------------------------------------------------------------------
// 2D transforms
// ---------------------------------------------------------------------------

/// 2D forward FFT with parallel row/column processing for large arrays.
pub fn fft2(data: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.clone();
    transform_lanes(&mut result, Axis(1), &fft_row);
    transform_lanes(&mut result, Axis(0), &fft_col);
    result
}

/// 2D forward FFT of a real-valued array.
pub fn fft2_real(data: ArrayView2<f64>) -> Array2<Complex<f64>> {
    fft2(&data.mapv(|v| Complex::new(v, 0.0)))
}

/// 2D inverse FFT normalized by `1/(h*w)`.
pub fn ifft2(data: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();
    transform_lanes(&mut work, Axis(0), &ifft_col);
    transform_lanes(&mut work, Axis(1), &ifft_row);

    let scale = 1.0 / (h * w) as f64;
    work.mapv_inplace(|v| v * scale);
    work
}

/// 2D inverse FFT, returning the real part normalized by `1/(h*w)`.
pub fn ifft2_real(data: &Array2<Complex<f64>>) -> Array2<f64> {
    ifft2(data).mapv(|v| v.re)
}

/// Transforms every 1D lane of `data` running along `axis`, in place.
fn transform_lanes(data: &mut Array2<Complex<f64>>, axis: Axis, fft: &Arc<dyn Fft<f64>>) {
    let process = |mut lane: ArrayViewMut1<Complex<f64>>| {
        let mut buffer = lane.to_vec();
        fft.process(&mut buffer);
        for (dst, src) in lane.iter_mut().zip(buffer) {
            *dst = src;
        }
    };

    // Lanes along `axis` are the subviews obtained by iterating the other axis.
    let across = Axis(1 - axis.index());
    if data.len() >= PARALLEL_PIXEL_THRESHOLD {
        data.axis_iter_mut(across).into_par_iter().for_each(process);
    } else {
        data.axis_iter_mut(across).for_each(process);
    }
}

// ---------------------------------------------------------------------------
// 1D transforms
// ---------------------------------------------------------------------------

/// 1D forward FFT of a real-valued signal.
pub fn fft1(data: &Array1<f64>) -> Array1<Complex<f64>> {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(data.len());
    let mut buffer: Vec<Complex<f64>> = data.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft.process(&mut buffer);
    Array1::from(buffer)
}

/// 1D inverse FFT normalized by `1/n`.
pub fn ifft1(data: &Array1<Complex<f64>>) -> Array1<Complex<f64>> {
    let n = data.len();
    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(n);
    let mut buffer = data.to_vec();
    ifft.process(&mut buffer);
    let scale = 1.0 / n as f64;
    buffer.into_iter().map(|v| v * scale).collect()
}

// ---------------------------------------------------------------------------
// Zero-frequency shifts
// ---------------------------------------------------------------------------

/// Moves the zero-frequency element of a 2D array to `(h/2, w/2)`.
pub fn fftshift<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (h, w) = data.dim();
    roll(data, h / 2, w / 2)
}

/// Inverse of [`fftshift`]; moves `(h/2, w/2)` back to the origin.
pub fn ifftshift<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (h, w) = data.dim();
    roll(data, h - h / 2, w - w / 2)
}

/// 1D [`fftshift`].
pub fn fftshift1<T: Clone>(data: &Array1<T>) -> Array1<T> {
    let n = data.len();
    let shift = n / 2;
    Array1::from_shape_fn(n, |i| data[(i + n - shift) % n].clone())
}

/// 1D [`ifftshift`].
pub fn ifftshift1<T: Clone>(data: &Array1<T>) -> Array1<T> {
    let n = data.len();
    let shift = n - n / 2;
    Array1::from_shape_fn(n, |i| data[(i + n - shift) % n].clone())
}

/// Circularly shifts `data` by `(si, sj)` elements towards higher indices.
fn roll<T: Clone>(data: &Array2<T>, si: usize, sj: usize) -> Array2<T> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(i, j)| {
        data[[(i + h - si) % h, (j + w - sj) % w]].clone()
    })
}
