#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line adapter that streams Lava Runner terrain for a scripted player.

mod factory;

use std::{cell::Cell, fs, path::PathBuf, rc::Rc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use lava_runner_core::{Event, GeneratorConfig, SpawnCategory};
use lava_runner_session::{Session, SessionBuilder};
use lava_runner_world::query;
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

use factory::CountingFactory;

/// Runs the terrain generator against a player moving at constant speed.
#[derive(Debug, Parser)]
#[command(name = "lava-runner", version, about)]
struct Cli {
    /// TOML file with generator configuration; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed overriding the configured one.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Player speed in world units per second.
    #[arg(long, default_value_t = 6.0)]
    player_speed: f32,
    /// Touch the tile under the player every tick.
    #[arg(long)]
    touch: bool,
    /// Print every event as one JSON object per line.
    #[arg(long)]
    events: bool,
    /// Print a SHA-256 digest of the event stream.
    #[arg(long)]
    fingerprint: bool,
}

/// Entry point for the Lava Runner command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }

    let player = Rc::new(Cell::new(config.lanes.origin_x));
    let probe = {
        let player = Rc::clone(&player);
        move || player.get()
    };
    let factory = CountingFactory::default();
    let tally = factory.tally();
    let mut session = SessionBuilder::new(config)
        .player_probe(probe)
        .entity_factory(factory)
        .try_build()
        .context("failed to start the generation session")?;

    let dt = Duration::from_millis(cli.tick_ms);
    let mut summary = Summary::default();
    let mut hasher = Sha256::new();
    let mut events = Vec::new();

    for _ in 0..cli.ticks {
        player.set(player.get() + cli.player_speed * dt.as_secs_f32());
        session.tick(dt, &mut events);
        if cli.touch {
            touch_under_player(&mut session, player.get());
        }

        for event in events.drain(..) {
            summary.record(&event);
            if cli.events || cli.fingerprint {
                let line = serde_json::to_string(&event).context("failed to encode event")?;
                if cli.events {
                    println!("{line}");
                }
                hasher.update(line.as_bytes());
                hasher.update(b"\n");
            }
        }
    }

    let tally = tally.borrow();
    println!("seed: {}", session.seed().unwrap_or_default());
    println!("ticks: {}", cli.ticks);
    println!("player x: {:.2}", player.get());
    println!(
        "segments: {} created, {} removed, {} live",
        summary.segments_created,
        summary.segments_removed,
        summary.segments_created - summary.segments_removed
    );
    println!(
        "tiles: {} created ({} hazard), {} disappeared",
        tally.tiles_created, tally.hazard_tiles_created, tally.hidden_updates
    );
    for category in SpawnCategory::PRIORITY {
        let created = tally.objects_created.get(&category).copied().unwrap_or(0);
        println!("{category:?} objects: {created}");
    }
    println!(
        "entities: {} live, {} destroyed",
        tally.live(),
        tally.destroyed
    );
    if summary.rejected > 0 {
        println!("rejected appends: {}", summary.rejected);
    }
    if cli.fingerprint {
        println!("fingerprint: {:x}", hasher.finalize());
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<GeneratorConfig> {
    let Some(path) = path else {
        return Ok(GeneratorConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    GeneratorConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

/// Touches the first solid tile of any lane whose cell contains the player.
fn touch_under_player(session: &mut Session, player_x: f32) {
    let Some(world) = session.world() else {
        return;
    };
    let tile = query::segment_view(world).iter().find_map(|segment| {
        let width = segment.tile_width;
        segment
            .tiles
            .iter()
            .find(|tile| {
                tile.solid && player_x >= tile.position.x && player_x < tile.position.x + width
            })
            .map(|tile| tile.id)
    });
    if let Some(tile) = tile {
        let _ = session.report_tile_touch(tile);
    }
}

#[derive(Debug, Default)]
struct Summary {
    segments_created: u64,
    segments_removed: u64,
    rejected: u64,
}

impl Summary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::SegmentCreated { .. } => self.segments_created += 1,
            Event::SegmentRemoved { .. } => self.segments_removed += 1,
            Event::SegmentRejected { .. } => self.rejected += 1,
            _ => {}
        }
    }
}
