//! Pipe Probe - headless endless-corridor runner.
//!
//! Drops a probe down a procedurally generated pipe, extending the corridor
//! ahead of it and scoring near-misses, for a fixed number of simulation ticks.
//!
//! # Usage
//!
//! ```bash
//! pipe-probe --ticks 36000 --seed 7
//! pipe-probe --assets ./Data --config my-config.ron
//! ```

mod config;
mod probe;
mod scoring;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use config::GameConfig;
use procgen::{AssetCatalog, CatalogLayout};
use session::Session;

#[derive(Parser)]
#[command(name = "pipe-probe")]
#[command(version, about = "Pipe Probe - endless corridor simulation")]
struct Args {
    /// Simulation ticks to run
    #[arg(long, default_value = "3600")]
    ticks: u64,

    /// Seed for corridor generation (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Resource root to scan for pipe and obstacle assets (repeatable)
    #[arg(long = "assets")]
    assets: Vec<PathBuf>,

    /// Config file (defaults to ./config.ron)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config back to the config path and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = GameConfig::load(args.config.as_deref());
    if args.write_config {
        config.save(args.config.as_deref());
        log::info!("Config written");
        return Ok(());
    }

    let catalog = load_catalog(&args.assets)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("Starting Pipe Probe (seed {}, {} ticks)", seed, args.ticks);

    let mut session = Session::new(config, Arc::new(catalog), StdRng::seed_from_u64(seed))
        .context("failed to start the corridor")?;
    let ticks_per_second = session.clock().ticks_for(std::time::Duration::from_secs(1));

    let mut near_misses = 0u64;
    let mut extensions = 0u64;
    for _ in 0..args.ticks {
        let events = session.tick()?;
        near_misses += events.near_misses as u64;
        if events.extended {
            extensions += 1;
        }

        if session.clock().tick_count() % ticks_per_second == 0 {
            let depth = session.probe_position().map(|p| -p.y).unwrap_or(0.0);
            log::info!(
                "t={:.0}s depth={:.0} speed={:.1} score={} popups={} segments={} entities={}",
                session.clock().elapsed_seconds(),
                depth,
                session.probe_speed(),
                session.score(),
                session.scoreboard().popups().len(),
                session.corridor().active_segments().len(),
                session.entity_count()
            );
        }
    }

    println!("Pipe Probe finished after {} ticks ({:.1}s simulated)", args.ticks, session.clock().elapsed_seconds());
    println!("  extensions:  {}", extensions);
    println!("  crashes:     {}", session.crashes().len());
    for crash in session.crashes() {
        println!("    tick {:>7}  depth {:>7.0}  score {}", crash.tick, crash.depth, crash.score);
    }
    println!("  near-misses: {}", near_misses);
    println!("  best score:  {}", session.best_score());
    println!("  final score: {}", session.score());
    Ok(())
}

/// Scan the given resource roots, falling back to generated shapes when they hold no usable corridor.
fn load_catalog(roots: &[PathBuf]) -> Result<AssetCatalog> {
    if roots.is_empty() {
        log::info!("No asset roots given, using procedural catalog");
        return Ok(AssetCatalog::procedural());
    }
    let catalog = AssetCatalog::load(roots, &CatalogLayout::default())
        .context("failed to load asset catalog")?;
    if catalog.segment_meshes.is_empty() {
        log::warn!("No pipe models under {:?}, using procedural catalog", roots);
        return Ok(AssetCatalog::procedural());
    }
    Ok(catalog)
}
