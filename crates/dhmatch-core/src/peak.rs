use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::coords::{displacement_to_index, index_to_displacement};
use crate::spectral::filters::guarded_div;

/// How the signal-to-noise ratio of a peak is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnrMetric {
    /// Peak value over the mean absolute surface value.
    #[default]
    MeanRatio,
    /// Peak value over the highest value outside the peak's 3x3 neighbourhood.
    SecondPeak,
}

/// Integer-pixel maximum of a correlation surface, relative to its centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegerPeak {
    pub di: i64,
    pub dj: i64,
    /// Surface value at the peak.
    pub score: f64,
    pub snr: f64,
}

/// Locates the global maximum of a surface, with the mean-ratio SNR.
pub fn locate_peak(surface: &Array2<f64>) -> IntegerPeak {
    locate_peak_with(surface, SnrMetric::MeanRatio)
}

/// Locates the global maximum of a surface. NaN samples are skipped; a
/// surface without any finite sample reports the centre with zero score.
pub fn locate_peak_with(surface: &Array2<f64>, metric: SnrMetric) -> IntegerPeak {
    let (h, w) = surface.dim();
    let mut best_row = h / 2;
    let mut best_col = w / 2;
    let mut best_val = f64::NEG_INFINITY;

    for row in 0..h {
        for col in 0..w {
            if surface[[row, col]] > best_val {
                best_val = surface[[row, col]];
                best_row = row;
                best_col = col;
            }
        }
    }

    if !best_val.is_finite() {
        return IntegerPeak {
            di: 0,
            dj: 0,
            score: 0.0,
            snr: 0.0,
        };
    }

    let (di, dj) = index_to_displacement((h, w), best_row, best_col);
    IntegerPeak {
        di,
        dj,
        score: best_val,
        snr: signal_to_noise(surface, best_row, best_col, metric),
    }
}

/// Builds a peak record for an externally supplied candidate displacement.
/// Returns `None` when the candidate lies outside the surface.
pub fn peak_at(surface: &Array2<f64>, di: i64, dj: i64, metric: SnrMetric) -> Option<IntegerPeak> {
    let (row, col) = displacement_to_index(surface.dim(), di, dj)?;
    Some(IntegerPeak {
        di,
        dj,
        score: surface[[row, col]],
        snr: signal_to_noise(surface, row, col, metric),
    })
}

fn signal_to_noise(surface: &Array2<f64>, row: usize, col: usize, metric: SnrMetric) -> f64 {
    let peak = surface[[row, col]];
    match metric {
        SnrMetric::MeanRatio => {
            let (sum, count) = surface
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, n), v| (s + v.abs(), n + 1));
            guarded_div(peak, guarded_div(sum, count as f64))
        }
        SnrMetric::SecondPeak => {
            let mut second = f64::NEG_INFINITY;
            for ((r, c), &v) in surface.indexed_iter() {
                if r.abs_diff(row) <= 1 && c.abs_diff(col) <= 1 {
                    continue;
                }
                if v > second {
                    second = v;
                }
            }
            if second.is_finite() {
                guarded_div(peak, second)
            } else {
                0.0
            }
        }
    }
}
