use anyhow::Result;
use clap::Parser;
use evolvarium_lib::runner;
use evolvarium_lib::{init_logging, World};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,

    /// Override the configured RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory for the JSONL event history; omit to disable logging
    #[arg(long)]
    history_dir: Option<String>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = runner::load_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }
    tracing::info!(fingerprint = %config.fingerprint(), "configuration loaded");

    let mut world = World::new(config)?;
    if let Some(dir) = &args.history_dir {
        world.attach_history(dir)?;
    }
    runner::seed_default_populations(&mut world)?;

    let summary = runner::run(&mut world, args.ticks)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
