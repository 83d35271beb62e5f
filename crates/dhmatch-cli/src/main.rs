mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dhmatch", about = "Frequency-domain patch matching and sub-pixel displacement")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match synthetic pairs with a known displacement
    Synth(commands::synth::SynthArgs),
    /// Estimate the displacement between two images
    Match(commands::match_images::MatchArgs),
    /// Print or save the default matching config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Synth(args) => commands::synth::run(args),
        Commands::Match(args) => commands::match_images::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
