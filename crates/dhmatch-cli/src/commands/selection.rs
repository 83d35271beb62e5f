use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use dhmatch_core::config::{
    AmplitudeConfig, CorrelatorMethod, CosiCorrConfig, CosineConfig, GaussianPhaseConfig,
    MatchConfig, MomentConfig, RefinerMethod, RobustConfig, SubpixelMethod, UpsampledConfig,
};

#[derive(Clone, Copy, ValueEnum)]
pub enum CorrelatorArg {
    Cross,
    Phase,
    PhaseOnly,
    SymmetricPhase,
    AmplitudeCompensated,
    Orientation,
    Gradient,
    NormalizedGradient,
    Windrose,
    BinaryOrientation,
    Robust,
    GaussianPhase,
    CosiCorr,
    Cosine,
    SignCosine,
    Masked,
    Ncc,
    Projected,
}

impl CorrelatorArg {
    pub fn to_method(self) -> CorrelatorMethod {
        match self {
            Self::Cross => CorrelatorMethod::CrossCorrelation,
            Self::Phase => CorrelatorMethod::PhaseCorrelation,
            Self::PhaseOnly => CorrelatorMethod::PhaseOnly,
            Self::SymmetricPhase => CorrelatorMethod::SymmetricPhase,
            Self::AmplitudeCompensated => {
                CorrelatorMethod::AmplitudeCompensated(AmplitudeConfig::default())
            }
            Self::Orientation => CorrelatorMethod::OrientationCorrelation,
            Self::Gradient => CorrelatorMethod::GradientCorrelation,
            Self::NormalizedGradient => CorrelatorMethod::NormalizedGradientCorrelation,
            Self::Windrose => CorrelatorMethod::WindroseCorrelation,
            Self::BinaryOrientation => CorrelatorMethod::BinaryOrientation,
            Self::Robust => CorrelatorMethod::RobustCorrelation(RobustConfig::default()),
            Self::GaussianPhase => {
                CorrelatorMethod::GaussianTransformedPhase(GaussianPhaseConfig::default())
            }
            Self::CosiCorr => CorrelatorMethod::CosiCorr(CosiCorrConfig::default()),
            Self::Cosine => CorrelatorMethod::CosineCorrelation(CosineConfig { sign_only: false }),
            Self::SignCosine => {
                CorrelatorMethod::CosineCorrelation(CosineConfig { sign_only: true })
            }
            Self::Masked => CorrelatorMethod::MaskedCorrelation,
            Self::Ncc => CorrelatorMethod::NormalizedCrossCorrelation,
            Self::Projected => CorrelatorMethod::ProjectedPhaseCorrelation,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RefinerArg {
    None,
    Upsampled,
    Parabolic,
    Gaussian,
    Centroid,
    Mass,
    Equiangular,
    Triangular,
    Birchfield,
    Ren,
    Blais,
    Moment,
    Gaussian2d,
    Paraboloid,
    Blue,
    Esinc,
}

impl RefinerArg {
    pub fn to_method(self, upsampling: usize, moment_radius: usize) -> SubpixelMethod {
        let surface = SubpixelMethod::Surface;
        match self {
            Self::None => SubpixelMethod::None,
            Self::Upsampled => SubpixelMethod::UpsampledDft(UpsampledConfig { upsampling }),
            Self::Parabolic => surface(RefinerMethod::Parabolic),
            Self::Gaussian => surface(RefinerMethod::Gaussian),
            Self::Centroid => surface(RefinerMethod::Centroid),
            Self::Mass => surface(RefinerMethod::Mass),
            Self::Equiangular => surface(RefinerMethod::Equiangular),
            Self::Triangular => surface(RefinerMethod::Triangular),
            Self::Birchfield => surface(RefinerMethod::Birchfield),
            Self::Ren => surface(RefinerMethod::Ren),
            Self::Blais => surface(RefinerMethod::Blais),
            Self::Moment => surface(RefinerMethod::Moment(MomentConfig {
                radius: moment_radius,
            })),
            Self::Gaussian2d => surface(RefinerMethod::Gaussian2d),
            Self::Paraboloid => surface(RefinerMethod::Paraboloid),
            Self::Blue => surface(RefinerMethod::Blue),
            Self::Esinc => surface(RefinerMethod::Esinc),
        }
    }
}

/// Method selection flags shared by `synth` and `match`.
#[derive(Args)]
pub struct MethodArgs {
    /// TOML matching config; CLI flags override its entries
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Correlator
    #[arg(long, value_enum)]
    pub correlator: Option<CorrelatorArg>,

    /// Sub-pixel refinement
    #[arg(long, value_enum)]
    pub refiner: Option<RefinerArg>,

    /// Upsampling factor for the upsampled refiner
    #[arg(long, default_value = "20")]
    pub upsampling: usize,

    /// Neighbourhood radius of the moment refiner
    #[arg(long, default_value = "1")]
    pub moment_radius: usize,
}

impl MethodArgs {
    /// Builds the matching config from the optional file plus overrides.
    pub fn to_config(&self) -> Result<MatchConfig> {
        if self.upsampling == 0 {
            bail!("--upsampling must be at least 1");
        }
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => MatchConfig::default(),
        };
        if let Some(correlator) = self.correlator {
            config.correlator = correlator.to_method();
        }
        if let Some(refiner) = self.refiner {
            config.subpixel = refiner.to_method(self.upsampling, self.moment_radius);
        }
        Ok(config)
    }
}
