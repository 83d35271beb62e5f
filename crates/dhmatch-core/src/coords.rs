//! Coordinate conventions shared by every correlator and refiner.
//!
//! Correlation surfaces are fftshift-ed: zero displacement sits at
//! `(rows / 2, cols / 2)` and a displacement `(di, dj)` is stored at
//! `(rows / 2 + di, cols / 2 + dj)`. Spectra stay in unshifted FFT order,
//! with bin `k` holding the signed frequency index [`frequency_index`].
//!
//! A displacement `d` between patches `a` and `b` means
//! `b(i, j) ≈ a(i + di, j + dj)`.

/// Surface index of zero displacement.
pub fn surface_center(shape: (usize, usize)) -> (usize, usize) {
    (shape.0 / 2, shape.1 / 2)
}

/// Converts a surface index into a signed displacement.
pub fn index_to_displacement(shape: (usize, usize), row: usize, col: usize) -> (i64, i64) {
    let (ci, cj) = surface_center(shape);
    (row as i64 - ci as i64, col as i64 - cj as i64)
}

/// Converts a signed displacement into a surface index, if it lies inside.
pub fn displacement_to_index(shape: (usize, usize), di: i64, dj: i64) -> Option<(usize, usize)> {
    let (ci, cj) = surface_center(shape);
    let row = ci as i64 + di;
    let col = cj as i64 + dj;
    if row < 0 || col < 0 || row >= shape.0 as i64 || col >= shape.1 as i64 {
        return None;
    }
    Some((row as usize, col as usize))
}

/// Border policy: `true` when a `(2ds+1)`-wide neighbourhood around the
/// displacement `(di, dj)` can be read from a surface of `shape`.
pub fn is_away_from_border(shape: (usize, usize), di: i64, dj: i64, ds: usize) -> bool {
    let ds = ds as i64;
    let half_rows = (shape.0 as i64 + 1) / 2;
    let half_cols = (shape.1 as i64 + 1) / 2;
    di.abs() + ds < half_rows && dj.abs() + ds < half_cols
}

/// Signed frequency index of bin `k` in an unshifted FFT of length `n`.
///
/// Equals `fftshift(arange(n) - n/2)[k]` for even `n`, and stays correct
/// for odd `n`.
pub fn frequency_index(k: usize, n: usize) -> f64 {
    if k < (n + 1) / 2 {
        k as f64
    } else {
        k as f64 - n as f64
    }
}

/// Normalized frequency (cycles per sample) of bin `k`, in `[-0.5, 0.5)`.
pub fn normalized_frequency(k: usize, n: usize) -> f64 {
    frequency_index(k, n) / n as f64
}
