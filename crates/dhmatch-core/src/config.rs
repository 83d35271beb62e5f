use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_AMPLITUDE_CUTOFF, DEFAULT_COSI_BETA_REFERENCE, DEFAULT_COSI_BETA_SEARCH,
    DEFAULT_COSI_PASSES, DEFAULT_COSI_THRESHOLD, DEFAULT_GAUSSIAN_MASK_SIGMA,
    DEFAULT_MOMENT_RADIUS, DEFAULT_ROBUST_EXPONENTS, DEFAULT_UPSAMPLING,
};
use crate::peak::SnrMetric;

/// Full matching configuration: which correlator builds the surface and how
/// the integer peak is refined.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default)]
    pub correlator: CorrelatorMethod,
    #[serde(default)]
    pub subpixel: SubpixelMethod,
    #[serde(default)]
    pub snr: SnrMetric,
}

// ---------------------------------------------------------------------------
// Correlators
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelatorMethod {
    CrossCorrelation,
    #[default]
    PhaseCorrelation,
    PhaseOnly,
    SymmetricPhase,
    AmplitudeCompensated(AmplitudeConfig),
    OrientationCorrelation,
    GradientCorrelation,
    NormalizedGradientCorrelation,
    WindroseCorrelation,
    BinaryOrientation,
    RobustCorrelation(RobustConfig),
    GaussianTransformedPhase(GaussianPhaseConfig),
    CosiCorr(CosiCorrConfig),
    CosineCorrelation(CosineConfig),
    MaskedCorrelation,
    NormalizedCrossCorrelation,
    ProjectedPhaseCorrelation,
}

impl CorrelatorMethod {
    /// Every correlator with default parameters.
    pub fn all() -> Vec<CorrelatorMethod> {
        vec![
            CorrelatorMethod::CrossCorrelation,
            CorrelatorMethod::PhaseCorrelation,
            CorrelatorMethod::PhaseOnly,
            CorrelatorMethod::SymmetricPhase,
            CorrelatorMethod::AmplitudeCompensated(AmplitudeConfig::default()),
            CorrelatorMethod::OrientationCorrelation,
            CorrelatorMethod::GradientCorrelation,
            CorrelatorMethod::NormalizedGradientCorrelation,
            CorrelatorMethod::WindroseCorrelation,
            CorrelatorMethod::BinaryOrientation,
            CorrelatorMethod::RobustCorrelation(RobustConfig::default()),
            CorrelatorMethod::GaussianTransformedPhase(GaussianPhaseConfig::default()),
            CorrelatorMethod::CosiCorr(CosiCorrConfig::default()),
            CorrelatorMethod::CosineCorrelation(CosineConfig::default()),
            CorrelatorMethod::CosineCorrelation(CosineConfig { sign_only: true }),
            CorrelatorMethod::MaskedCorrelation,
            CorrelatorMethod::NormalizedCrossCorrelation,
            CorrelatorMethod::ProjectedPhaseCorrelation,
        ]
    }

    /// Whether the correlator returns a spatial surface rather than a
    /// cross-power spectrum.
    pub fn produces_surface(&self) -> bool {
        matches!(
            self,
            Self::CosineCorrelation(_)
                | Self::MaskedCorrelation
                | Self::NormalizedCrossCorrelation
                | Self::ProjectedPhaseCorrelation
        )
    }
}

impl fmt::Display for CorrelatorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CrossCorrelation => write!(f, "Cross Correlation"),
            Self::PhaseCorrelation => write!(f, "Phase Correlation"),
            Self::PhaseOnly => write!(f, "Phase-Only Correlation"),
            Self::SymmetricPhase => write!(f, "Symmetric Phase Correlation"),
            Self::AmplitudeCompensated(_) => write!(f, "Amplitude Compensated"),
            Self::OrientationCorrelation => write!(f, "Orientation Correlation"),
            Self::GradientCorrelation => write!(f, "Gradient Correlation"),
            Self::NormalizedGradientCorrelation => write!(f, "Normalized Gradient Correlation"),
            Self::WindroseCorrelation => write!(f, "Windrose Correlation"),
            Self::BinaryOrientation => write!(f, "Binary Orientation Correlation"),
            Self::RobustCorrelation(_) => write!(f, "Robust Correlation"),
            Self::GaussianTransformedPhase(_) => write!(f, "Gaussian-Transformed Phase Correlation"),
            Self::CosiCorr(_) => write!(f, "COSI-Corr"),
            Self::CosineCorrelation(c) if c.sign_only => write!(f, "Sign-Only Cosine Correlation"),
            Self::CosineCorrelation(_) => write!(f, "Cosine Correlation"),
            Self::MaskedCorrelation => write!(f, "Masked NCC"),
            Self::NormalizedCrossCorrelation => write!(f, "NCC"),
            Self::ProjectedPhaseCorrelation => write!(f, "Projected Phase Correlation"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeConfig {
    /// Cutoff `F0` as a fraction of the maximum reference amplitude.
    pub cutoff: f64,
}

impl Default for AmplitudeConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_AMPLITUDE_CUTOFF,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RobustConfig {
    /// Decimal exponents `k` of the ladder `p = 10^k`.
    pub exponents: Vec<f64>,
}

impl Default for RobustConfig {
    fn default() -> Self {
        Self {
            exponents: DEFAULT_ROBUST_EXPONENTS.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianPhaseConfig {
    /// Standard deviation of the frequency-domain Gaussian, in cycles/pixel.
    pub sigma: f64,
}

impl Default for GaussianPhaseConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_GAUSSIAN_MASK_SIGMA,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CosiCorrConfig {
    /// Raised-cosine roll-off of the reference spectrum window.
    pub beta_reference: f64,
    /// Raised-cosine roll-off of the search spectrum window.
    pub beta_search: f64,
    /// Fraction of the peak reference amplitude kept by the frequency mask.
    pub threshold: f64,
    /// Maximum recentering passes for unequal-size templates.
    pub passes: usize,
}

impl Default for CosiCorrConfig {
    fn default() -> Self {
        Self {
            beta_reference: DEFAULT_COSI_BETA_REFERENCE,
            beta_search: DEFAULT_COSI_BETA_SEARCH,
            threshold: DEFAULT_COSI_THRESHOLD,
            passes: DEFAULT_COSI_PASSES,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CosineConfig {
    /// Correlate quadrant signs instead of phase-normalized transforms.
    pub sign_only: bool,
}

// ---------------------------------------------------------------------------
// Sub-pixel refinement
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubpixelMethod {
    /// Integer peak only.
    None,
    /// Refine the integer peak from its surface neighbourhood.
    Surface(RefinerMethod),
    /// Matrix-DFT upsampling of the correlation around its integer peak.
    UpsampledDft(UpsampledConfig),
}

impl Default for SubpixelMethod {
    fn default() -> Self {
        SubpixelMethod::UpsampledDft(UpsampledConfig::default())
    }
}

impl fmt::Display for SubpixelMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Surface(method) => write!(f, "{}", method),
            Self::UpsampledDft(c) => write!(f, "Upsampled DFT (x{})", c.upsampling),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpsampledConfig {
    /// Upsampling factor. 2 stops at the half-pixel grid.
    pub upsampling: usize,
}

impl Default for UpsampledConfig {
    fn default() -> Self {
        Self {
            upsampling: DEFAULT_UPSAMPLING,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinerMethod {
    Parabolic,
    Gaussian,
    Centroid,
    Mass,
    Equiangular,
    Triangular,
    Birchfield,
    Ren,
    Blais,
    Moment(MomentConfig),
    Gaussian2d,
    Paraboloid,
    Blue,
    Esinc,
}

impl RefinerMethod {
    /// Every refiner with default parameters.
    pub fn all() -> Vec<RefinerMethod> {
        vec![
            RefinerMethod::Parabolic,
            RefinerMethod::Gaussian,
            RefinerMethod::Centroid,
            RefinerMethod::Mass,
            RefinerMethod::Equiangular,
            RefinerMethod::Triangular,
            RefinerMethod::Birchfield,
            RefinerMethod::Ren,
            RefinerMethod::Blais,
            RefinerMethod::Moment(MomentConfig::default()),
            RefinerMethod::Gaussian2d,
            RefinerMethod::Paraboloid,
            RefinerMethod::Blue,
            RefinerMethod::Esinc,
        ]
    }
}

impl fmt::Display for RefinerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parabolic => write!(f, "Parabolic"),
            Self::Gaussian => write!(f, "Gaussian"),
            Self::Centroid => write!(f, "Centroid"),
            Self::Mass => write!(f, "Center of Mass"),
            Self::Equiangular => write!(f, "Equiangular"),
            Self::Triangular => write!(f, "Triangular"),
            Self::Birchfield => write!(f, "Birchfield"),
            Self::Ren => write!(f, "Ren"),
            Self::Blais => write!(f, "Blais"),
            Self::Moment(c) => write!(f, "Moment (ds={})", c.radius),
            Self::Gaussian2d => write!(f, "2D Gaussian"),
            Self::Paraboloid => write!(f, "Paraboloid"),
            Self::Blue => write!(f, "BLUE"),
            Self::Esinc => write!(f, "esinc"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MomentConfig {
    /// Neighbourhood radius `ds`; the window is `(2ds+1)²`.
    pub radius: usize,
}

impl Default for MomentConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_MOMENT_RADIUS,
        }
    }
}
