use std::ops::{Add, Mul};

use ndarray::{s, Array2, Array3, ArrayView2, Axis, Zip};

use crate::consts::MIN_PATCH_SIZE;
use crate::error::{MatchError, Result};

/// A single- or multi-band image patch.
/// Pixel data is stored band-last, shape = (rows, cols, bands).
#[derive(Clone, Debug)]
pub struct Patch {
    data: Array3<f64>,
}

impl Patch {
    /// Wraps a single-band patch.
    pub fn new(data: Array2<f64>) -> Self {
        Self {
            data: data.insert_axis(Axis(2)),
        }
    }

    /// Wraps a band-last multi-band patch.
    pub fn from_bands(data: Array3<f64>) -> Result<Self> {
        if data.dim().2 == 0 {
            return Err(MatchError::InvalidInputShape(
                "patch must have at least one band".into(),
            ));
        }
        Ok(Self { data })
    }

    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    /// Spatial shape `(rows, cols)`.
    pub fn dim(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    pub fn bands(&self) -> usize {
        self.data.dim().2
    }

    pub fn band(&self, index: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(2), index)
    }

    pub fn iter_bands(&self) -> impl Iterator<Item = ArrayView2<'_, f64>> {
        self.data.axis_iter(Axis(2))
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// Copies the spatial window starting at `(row, col)` across all bands.
    pub fn crop(&self, row: usize, col: usize, rows: usize, cols: usize) -> Patch {
        Patch {
            data: self
                .data
                .slice(s![row..row + rows, col..col + cols, ..])
                .to_owned(),
        }
    }
}

impl From<Array2<f64>> for Patch {
    fn from(data: Array2<f64>) -> Self {
        Patch::new(data)
    }
}

/// Checks that two patches can be matched: equal band counts and a spatial
/// extent of at least [`MIN_PATCH_SIZE`] along both axes.
pub fn validate_pair(a: &Patch, b: &Patch) -> Result<()> {
    if a.bands() != b.bands() {
        return Err(MatchError::InvalidInputShape(format!(
            "band count mismatch: {} vs {}",
            a.bands(),
            b.bands()
        )));
    }
    for (name, patch) in [("first", a), ("second", b)] {
        if patch.rows() < MIN_PATCH_SIZE || patch.cols() < MIN_PATCH_SIZE {
            return Err(MatchError::InvalidInputShape(format!(
                "{} patch is {}x{}, need at least {}x{}",
                name,
                patch.rows(),
                patch.cols(),
                MIN_PATCH_SIZE,
                MIN_PATCH_SIZE
            )));
        }
    }
    Ok(())
}

/// Checks that an optional mask covers the patch's spatial shape.
pub fn validate_mask(patch: &Patch, mask: Option<&Array2<bool>>) -> Result<()> {
    match mask {
        Some(m) if m.dim() != patch.dim() => Err(MatchError::InvalidInputShape(format!(
            "mask is {}x{}, patch is {}x{}",
            m.nrows(),
            m.ncols(),
            patch.rows(),
            patch.cols()
        ))),
        _ => Ok(()),
    }
}

/// Matches two patches band by band and combines the per-band results with
/// an equally weighted running average:
/// `Q = Q_k / (k+1) + Q * k / (k+1)`.
pub fn running_band_average<T, F>(a: &Patch, b: &Patch, mut per_band: F) -> Result<Array2<T>>
where
    T: Copy + Add<Output = T> + Mul<f64, Output = T>,
    F: FnMut(ArrayView2<f64>, ArrayView2<f64>) -> Result<Array2<T>>,
{
    if a.bands() != b.bands() {
        return Err(MatchError::InvalidInputShape(format!(
            "band count mismatch: {} vs {}",
            a.bands(),
            b.bands()
        )));
    }

    let mut combined: Option<Array2<T>> = None;
    for (k, (band_a, band_b)) in a.iter_bands().zip(b.iter_bands()).enumerate() {
        let q = per_band(band_a, band_b)?;
        combined = Some(match combined {
            None => q,
            Some(mut acc) => {
                accumulate(&mut acc, &q, k);
                acc
            }
        });
    }
    combined.ok_or_else(|| MatchError::InvalidInputShape("patch has no bands".into()))
}

/// Folds the `k`-th (zero-based) band result into a running average.
pub fn accumulate<T>(acc: &mut Array2<T>, q: &Array2<T>, k: usize)
where
    T: Copy + Add<Output = T> + Mul<f64, Output = T>,
{
    let w_new = 1.0 / (k + 1) as f64;
    let w_prev = k as f64 / (k + 1) as f64;
    Zip::from(acc)
        .and(q)
        .for_each(|a, &q| *a = q * w_new + *a * w_prev);
}
