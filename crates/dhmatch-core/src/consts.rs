/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum pair count to use pair-level Rayon parallelism in batch matching.
pub const PARALLEL_PAIR_THRESHOLD: usize = 4;

/// Smallest spatial extent a patch may have along either axis.
pub const MIN_PATCH_SIZE: usize = 3;

/// Raised-cosine roll-off applied to the reference spectrum in COSI-Corr.
pub const DEFAULT_COSI_BETA_REFERENCE: f64 = 0.35;

/// Raised-cosine roll-off applied to the search spectrum in COSI-Corr.
pub const DEFAULT_COSI_BETA_SEARCH: f64 = 0.5;

/// Fraction of the peak spectral magnitude below which COSI-Corr marks bins invalid.
pub const DEFAULT_COSI_THRESHOLD: f64 = 1e-4;

/// Number of recentering passes COSI-Corr performs on unequal-size templates.
pub const DEFAULT_COSI_PASSES: usize = 2;

/// Cutoff fraction `F0` of the amplitude-compensated filter.
pub const DEFAULT_AMPLITUDE_CUTOFF: f64 = 0.04;

/// Standard deviation (in normalized frequency) of the Gaussian mask used by
/// Gaussian-transformed phase correlation.
pub const DEFAULT_GAUSSIAN_MASK_SIGMA: f64 = 0.25;

/// Decimal exponents `k` of the robust correlation ladder, `p = 10^k`.
pub const DEFAULT_ROBUST_EXPONENTS: [f64; 2] = [0.0, 0.5];

/// Kroon 3x3 derivative kernel: weights across the derivative axis.
pub const KROON_WEIGHTS: [f64; 3] = [17.0 / 95.0, 61.0 / 95.0, 17.0 / 95.0];

/// Smoothing weights across the differentiation axis of the BLUE estimator.
/// Same profile as the Kroon kernel, normalized to unit sum.
pub const BLUE_WEIGHTS: [f64; 3] = KROON_WEIGHTS;

/// Default upsampling factor of the upsampled cross-correlation.
/// 2 stops at the half-pixel grid; 20 gives ~0.05 px resolution.
pub const DEFAULT_UPSAMPLING: usize = 20;

/// Search window (in pixels) around the half-pixel estimate that the
/// matrix-multiply DFT evaluates.
pub const UPSAMPLED_SEARCH_WINDOW: f64 = 1.5;

/// Default neighbourhood radius of the moment refiner.
pub const DEFAULT_MOMENT_RADIUS: usize = 1;

/// Maximum iterations of the Levenberg-Marquardt root finder.
pub const ROOT_FINDER_MAX_ITERATIONS: usize = 100;

/// Residual and step tolerance of the Levenberg-Marquardt root finder.
pub const ROOT_FINDER_TOLERANCE: f64 = 1e-12;

/// Initial Gaussian envelope parameter `β` of the esinc model.
pub const ESINC_INITIAL_BETA: f64 = 0.1;

/// Overlap (in pixels) below which masked NCC reports zero.
pub const MASKED_MIN_OVERLAP: f64 = 0.5;

/// Relative variance below which (normalized) cross-correlation reports zero.
pub const VARIANCE_EPSILON: f64 = 1e-12;
