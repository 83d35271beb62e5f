use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use dhmatch_core::matcher::{
    estimate_displacement, estimate_displacements_with_progress, PatchPair,
};
use dhmatch_core::patch::Patch;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{s, Array2};

use super::selection::MethodArgs;
use crate::summary::{print_config_summary, print_displacement};

#[derive(Args)]
pub struct MatchArgs {
    /// Reference image
    pub reference: PathBuf,

    /// Image displaced relative to the reference
    pub target: PathBuf,

    /// Match square tiles of this size instead of the whole image
    #[arg(long)]
    pub tile: Option<usize>,

    /// Worker threads for tiled matching (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    #[command(flatten)]
    pub methods: MethodArgs,
}

pub fn run(args: &MatchArgs) -> Result<()> {
    let config = args.methods.to_config()?;
    let reference = load_luma(&args.reference)?;
    let target = load_luma(&args.target)?;

    println!(
        "Loaded {}x{} and {}x{} images",
        reference.ncols(),
        reference.nrows(),
        target.ncols(),
        target.nrows()
    );
    print_config_summary(&config);

    let Some(tile) = args.tile else {
        let d = estimate_displacement(&Patch::new(reference), &Patch::new(target), &config)?;
        print_displacement(&d);
        return Ok(());
    };

    if reference.dim() != target.dim() {
        bail!("Tiled matching needs images of equal size");
    }
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let (h, w) = reference.dim();
    if tile == 0 || tile > h || tile > w {
        bail!("Tile size {} does not fit a {}x{} image", tile, w, h);
    }

    let mut origins = Vec::new();
    let mut pairs = Vec::new();
    for row in (0..=h - tile).step_by(tile) {
        for col in (0..=w - tile).step_by(tile) {
            let window = s![row..row + tile, col..col + tile];
            origins.push((row, col));
            pairs.push(PatchPair::new(
                Patch::new(reference.slice(window).to_owned()),
                Patch::new(target.slice(window).to_owned()),
            ));
        }
    }

    tracing::debug!(tiles = pairs.len(), tile, "Tiled matching");
    let pb = ProgressBar::new(pairs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Matching tiles");
    let results = estimate_displacements_with_progress(&pairs, &config, |done| {
        pb.set_position(done as u64);
    })?;
    pb.finish_with_message("Matched");

    println!(
        "\n{:>6} {:>6} {:>9} {:>9} {:>8} {:>7}",
        "Row", "Col", "di", "dj", "Score", "SNR"
    );
    println!("{}", "-".repeat(50));
    for ((row, col), d) in origins.iter().zip(&results) {
        println!(
            "{:>6} {:>6} {:>9.4} {:>9.4} {:>8.4} {:>7.2}",
            row + tile / 2,
            col + tile / 2,
            d.di,
            d.dj,
            d.score,
            d.snr
        );
    }
    Ok(())
}

/// Loads an image as a grayscale `f64` array, shape `(rows, cols)`.
fn load_luma(path: &Path) -> Result<Array2<f64>> {
    let image = image::open(path)
        .with_context(|| format!("Failed to load {}", path.display()))?
        .to_luma32f();
    let (w, h) = image.dimensions();
    Ok(Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        image.get_pixel(col as u32, row as u32)[0] as f64
    }))
}
