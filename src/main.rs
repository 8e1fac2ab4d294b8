//! # Cryptgen Main Entry Point
//!
//! Generates one dungeon level and prints it as a text minimap or as JSON.

use clap::Parser;
use cryptgen::{
    AsciiRenderer, CryptError, CryptResult, DungeonLevel, GenerationConfig, WorldGenerator,
};
use log::{info, LevelFilter};
use std::path::PathBuf;

/// Command line arguments for the dungeon generator.
#[derive(Parser, Debug)]
#[command(name = "cryptgen")]
#[command(about = "Procedural room-and-corridor dungeon generator")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation (0 derives one from the clock)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of rooms
    #[arg(short, long)]
    rooms: Option<u32>,

    /// Minimum room floor size
    #[arg(long)]
    min_room_size: Option<u32>,

    /// Maximum room floor size
    #[arg(long)]
    max_room_size: Option<u32>,

    /// Number of enemy spawns
    #[arg(long)]
    enemies: Option<u32>,

    /// JSON generation config; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pick a locked room (`--lock-room false` disables it)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    lock_room: Option<bool>,

    /// Print the whole level as JSON instead of the minimap
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> CryptResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;

    info!("Starting cryptgen v{}", cryptgen::VERSION);

    let config = build_config(&args)?;
    let level = WorldGenerator::new().generate(&config)?;

    if args.json {
        println!("{}", level.to_json_string()?);
    } else {
        print!("{}", AsciiRenderer::new().render(&level));
        println!();
        print_summary(&level);
    }

    Ok(())
}

/// Initializes env_logger at the requested level; `RUST_LOG` takes precedence.
fn initialize_logging(log_level: &str) -> CryptResult<()> {
    let level: LevelFilter = log_level.parse().map_err(|_| {
        CryptError::InvalidConfiguration(format!("unknown log level '{}'", log_level))
    })?;

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .try_init()
        .map_err(|err| CryptError::InvalidConfiguration(err.to_string()))
}

/// Loads the config file, if any, and applies command line overrides.
fn build_config(args: &Args) -> CryptResult<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading generation config from {}", path.display());
            GenerationConfig::from_json_file(path)?
        }
        None => GenerationConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(rooms) = args.rooms {
        config.room_count = rooms;
    }
    if let Some(size) = args.min_room_size {
        config.min_room_size = size;
    }
    if let Some(size) = args.max_room_size {
        config.max_room_size = size;
    }
    if let Some(enemies) = args.enemies {
        config.enemy_count = enemies;
    }
    if let Some(lock_room) = args.lock_room {
        config.lock_room = lock_room;
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(level: &DungeonLevel) {
    let map = &level.tile_map;
    let plan = &level.plan;

    println!("seed:      {}", level.seed);
    println!(
        "map:       {}x{} tiles, {} rooms, {} corridors",
        map.width(),
        map.height(),
        map.rooms().len(),
        map.corridors().len()
    );
    if let Some(pos) = level.entrance_position() {
        println!(
            "entrance:  room {} at ({}, {}), facing {:?}",
            plan.start_room, pos.x, pos.y, plan.spawn_facing
        );
    }
    if let Some(pos) = level.exit_position() {
        println!("exit:      room {} at ({}, {})", plan.end_room, pos.x, pos.y);
    }
    match plan.locked_room {
        Some(room) => println!("locked:    room {}", room),
        None => println!("locked:    none"),
    }
    println!(
        "journey:   {} tiles{}",
        plan.critical_path_tiles,
        if plan.journey_bounded {
            " (start room moved closer)"
        } else {
            ""
        }
    );
    println!(
        "placed:    {} torches, {} enemies",
        level.decor.torches.len(),
        level.encounters.enemies.len()
    );
}
