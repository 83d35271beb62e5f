use anyhow::Result;
use clap::Args;
use console::Style;
use dhmatch_core::config::{
    CorrelatorMethod, MatchConfig, RefinerMethod, SubpixelMethod, UpsampledConfig,
};
use dhmatch_core::matcher::{
    estimate_displacement, estimate_displacements_with_progress, PatchPair,
};
use dhmatch_core::patch::Patch;
use dhmatch_core::synthetic::{shifted_pair, shifted_pair_bands};
use indicatif::{ProgressBar, ProgressStyle};

use super::selection::MethodArgs;
use crate::summary::{print_config_summary, print_displacement, styled_error};

/// Displacement error below which a benchmark row is shown as a success.
const ERROR_TOLERANCE: f64 = 0.1;

#[derive(Args)]
pub struct SynthArgs {
    /// Patch size in pixels (square)
    #[arg(long, default_value = "64")]
    pub size: usize,

    /// Row displacement of the second patch
    #[arg(long, default_value = "2.3", allow_hyphen_values = true)]
    pub di: f64,

    /// Column displacement of the second patch
    #[arg(long, default_value = "-1.7", allow_hyphen_values = true)]
    pub dj: f64,

    /// Number of bands per patch
    #[arg(long, default_value = "1")]
    pub bands: usize,

    /// Random seed of the texture
    #[arg(long, default_value = "1")]
    pub seed: u64,

    /// Match this many independently textured pairs as one batch
    #[arg(long, default_value = "1")]
    pub pairs: usize,

    /// Benchmark every correlator/refiner combination
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub methods: MethodArgs,
}

pub fn run(args: &SynthArgs) -> Result<()> {
    if args.all {
        return run_benchmark(args);
    }

    let config = args.methods.to_config()?;
    print_config_summary(&config);

    if args.pairs > 1 {
        return run_batch(args, &config);
    }

    let (a, b) = make_pair(args, args.seed)?;
    let d = estimate_displacement(&a, &b, &config)?;
    print_displacement(&d);
    let error = ((d.di - args.di).powi(2) + (d.dj - args.dj).powi(2)).sqrt();
    println!(
        "  {:<14}{}",
        Style::new().dim().apply_to("Error"),
        styled_error(error, ERROR_TOLERANCE)
    );
    Ok(())
}

fn make_pair(args: &SynthArgs, seed: u64) -> Result<(Patch, Patch)> {
    if args.bands > 1 {
        Ok(shifted_pair_bands(
            args.size, args.size, args.bands, args.di, args.dj, seed,
        )?)
    } else {
        Ok(shifted_pair(args.size, args.size, args.di, args.dj, seed))
    }
}

fn run_batch(args: &SynthArgs, config: &MatchConfig) -> Result<()> {
    let pairs = (0..args.pairs as u64)
        .map(|k| {
            let (a, b) = make_pair(args, args.seed.wrapping_add(k))?;
            Ok(PatchPair::new(a, b))
        })
        .collect::<Result<Vec<_>>>()?;

    let pb = ProgressBar::new(pairs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Matching pairs");

    let results = estimate_displacements_with_progress(&pairs, config, |done| {
        pb.set_position(done as u64);
    })?;
    pb.finish_with_message("Matched");

    let errors: Vec<f64> = results
        .iter()
        .map(|d| ((d.di - args.di).powi(2) + (d.dj - args.dj).powi(2)).sqrt())
        .collect();
    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    let worst = errors.iter().copied().fold(0.0_f64, f64::max);

    println!("\nPairs:       {}", results.len());
    println!("Mean error:  {}", styled_error(mean, ERROR_TOLERANCE));
    println!("Worst error: {}", styled_error(worst, ERROR_TOLERANCE));
    Ok(())
}

fn run_benchmark(args: &SynthArgs) -> Result<()> {
    let (a, b) = make_pair(args, args.seed)?;

    let mut subpixel = vec![
        SubpixelMethod::None,
        SubpixelMethod::UpsampledDft(UpsampledConfig {
            upsampling: args.methods.upsampling,
        }),
    ];
    subpixel.extend(RefinerMethod::all().into_iter().map(SubpixelMethod::Surface));

    let combos: Vec<MatchConfig> = CorrelatorMethod::all()
        .into_iter()
        .flat_map(|correlator| {
            subpixel.iter().map(move |sub| MatchConfig {
                correlator: correlator.clone(),
                subpixel: sub.clone(),
                ..Default::default()
            })
        })
        .collect();

    let pb = ProgressBar::new(combos.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Benchmarking");

    let mut rows = Vec::with_capacity(combos.len());
    for config in &combos {
        let outcome = estimate_displacement(&a, &b, config);
        rows.push((config, outcome));
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "\nTrue displacement: ({:+.3}, {:+.3}) on {}x{}x{}",
        args.di, args.dj, args.size, args.size, args.bands
    );
    println!(
        "{:<40} {:<24} {:>9} {:>9} {:>8}",
        "Correlator", "Sub-pixel", "di", "dj", "Error"
    );
    println!("{}", "-".repeat(94));
    for (config, outcome) in rows {
        match outcome {
            Ok(d) => {
                let error = ((d.di - args.di).powi(2) + (d.dj - args.dj).powi(2)).sqrt();
                println!(
                    "{:<40} {:<24} {:>9.4} {:>9.4} {:>8}",
                    config.correlator.to_string(),
                    config.subpixel.to_string(),
                    d.di,
                    d.dj,
                    styled_error(error, ERROR_TOLERANCE)
                );
            }
            Err(e) => println!(
                "{:<40} {:<24} {}",
                config.correlator.to_string(),
                config.subpixel.to_string(),
                Style::new().yellow().apply_to(format!("failed: {}", e))
            ),
        }
    }
    Ok(())
}
