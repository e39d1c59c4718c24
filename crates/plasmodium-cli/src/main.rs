use anyhow::{Context, Result};
use clap::Parser;
use plasmodium_core::config::SimConfig;
use plasmodium_core::world::World;
use std::fs;
use std::path::PathBuf;

/// Run a plasmodium foraging experiment and emit sampled metrics as JSON.
#[derive(Parser, Debug)]
#[command(name = "plasmodium", version)]
struct Args {
    /// Path to a JSON simulation config; defaults apply for missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 1000)]
    steps: usize,

    /// Sample metrics every N ticks.
    #[arg(long, default_value_t = 10)]
    sample_every: usize,

    /// Override the config seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the run summary here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<SimConfig>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut world = World::from_config(config).context("initializing world")?;
    let summary = world
        .try_run_experiment(args.steps, args.sample_every)
        .context("running experiment")?;

    let json = serde_json::to_string_pretty(&summary)?;
    match &args.out {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("writing summary {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
