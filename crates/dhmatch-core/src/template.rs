//! Template conditioning: bringing two patches of unequal size onto a
//! common, centre-aligned window.

use ndarray::{s, Array2};
use tracing::warn;

use crate::patch::Patch;

/// Crop windows that bring two patches to the same spatial shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropWindows {
    /// Top-left corner of the window in the first patch.
    pub origin_a: (usize, usize),
    /// Top-left corner of the window in the second patch.
    pub origin_b: (usize, usize),
    /// Common shape `(rows, cols)`.
    pub shape: (usize, usize),
}

impl CropWindows {
    /// Windows for patches of `shape_a` and `shape_b`, with the larger
    /// input's window moved to compensate an integer displacement
    /// `(di, dj)` of the second patch relative to the first.
    pub fn new(shape_a: (usize, usize), shape_b: (usize, usize), di: i64, dj: i64) -> Self {
        let (row_a, row_b, rows) = axis_window(shape_a.0, shape_b.0, di);
        let (col_a, col_b, cols) = axis_window(shape_a.1, shape_b.1, dj);
        Self {
            origin_a: (row_a, col_a),
            origin_b: (row_b, col_b),
            shape: (rows, cols),
        }
    }

    /// Integer displacement these windows compensate, relative to the
    /// centre-aligned windows of the same shapes. Axes of equal length
    /// cannot be shifted and report zero.
    pub fn applied_shift(&self, shape_a: (usize, usize), shape_b: (usize, usize)) -> (i64, i64) {
        let centred = CropWindows::new(shape_a, shape_b, 0, 0);
        let axis = |now_a: usize, base_a: usize, now_b: usize, base_b: usize| {
            (now_a as i64 - base_a as i64) - (now_b as i64 - base_b as i64)
        };
        (
            axis(
                self.origin_a.0,
                centred.origin_a.0,
                self.origin_b.0,
                centred.origin_b.0,
            ),
            axis(
                self.origin_a.1,
                centred.origin_a.1,
                self.origin_b.1,
                centred.origin_b.1,
            ),
        )
    }

    pub fn apply(&self, a: &Patch, b: &Patch) -> (Patch, Patch) {
        let (rows, cols) = self.shape;
        (
            a.crop(self.origin_a.0, self.origin_a.1, rows, cols),
            b.crop(self.origin_b.0, self.origin_b.1, rows, cols),
        )
    }

    pub fn apply_masks(
        &self,
        mask_a: Option<&Array2<bool>>,
        mask_b: Option<&Array2<bool>>,
    ) -> (Option<Array2<bool>>, Option<Array2<bool>>) {
        (
            mask_a.map(|m| crop_mask(m, self.origin_a, self.shape)),
            mask_b.map(|m| crop_mask(m, self.origin_b, self.shape)),
        )
    }
}

/// Centre-crops the larger patch along each axis so both share the smaller
/// shape and the same centre pixel `(rows/2, cols/2)`.
pub fn equalize_size(a: &Patch, b: &Patch) -> (Patch, Patch) {
    recenter(a, b, 0, 0)
}

/// Like [`equalize_size`], but shifts the larger patch's crop window by the
/// integer displacement `(di, dj)` first. Windows that would leave the patch
/// are clamped to its edge.
pub fn recenter(a: &Patch, b: &Patch, di: i64, dj: i64) -> (Patch, Patch) {
    CropWindows::new(a.dim(), b.dim(), di, dj).apply(a, b)
}

/// `(start_a, start_b, len)` along one axis.
fn axis_window(len_a: usize, len_b: usize, shift: i64) -> (usize, usize, usize) {
    if len_a > len_b {
        let base = (len_a / 2 - len_b / 2) as i64;
        let start = clamp_start(base + shift, len_a - len_b);
        (start, 0, len_b)
    } else if len_b > len_a {
        let base = (len_b / 2 - len_a / 2) as i64;
        let start = clamp_start(base - shift, len_b - len_a);
        (0, start, len_a)
    } else {
        (0, 0, len_a)
    }
}

fn clamp_start(start: i64, max: usize) -> usize {
    let clamped = start.clamp(0, max as i64);
    if clamped != start {
        warn!(start, max, "crop window clamped to patch edge");
    }
    clamped as usize
}

fn crop_mask(mask: &Array2<bool>, origin: (usize, usize), shape: (usize, usize)) -> Array2<bool> {
    mask.slice(s![
        origin.0..origin.0 + shape.0,
        origin.1..origin.1 + shape.1
    ])
    .to_owned()
}
