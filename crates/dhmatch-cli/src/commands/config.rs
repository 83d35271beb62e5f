use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::Style;
use dhmatch_core::config::{CorrelatorMethod, MatchConfig, RefinerMethod};

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List the available correlators and refiners instead
    #[arg(long)]
    pub list: bool,
}

pub fn run(args: &ConfigArgs) -> Result<()> {
    if args.list {
        list_methods();
        return Ok(());
    }

    let toml_str = toml::to_string_pretty(&MatchConfig::default())
        .context("Failed to serialize the default config")?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &toml_str)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            println!("Default config saved to {}", path.display());
        }
        None => print!("{}", toml_str),
    }
    Ok(())
}

fn list_methods() {
    let heading = Style::new().cyan().bold();
    let name = Style::new().green();

    println!("{}", heading.apply_to("Correlators"));
    for method in CorrelatorMethod::all() {
        let kind = if method.produces_surface() { "surface" } else { "spectrum" };
        println!("  {:<40} {}", name.apply_to(method.to_string()), kind);
    }
    println!("\n{}", heading.apply_to("Refiners"));
    for refiner in RefinerMethod::all() {
        println!(
            "  {:<40} radius {}",
            name.apply_to(refiner.to_string()),
            refiner.radius()
        );
    }
}
