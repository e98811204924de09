//! Microcosm - CLI entry point.
//!
//! Artificial-life sandbox simulator.

use clap::{Parser, Subcommand};
use microcosm::runner::GameLoop;
use microcosm::terrain::{TerrainMap, TileKind};
use microcosm::{benchmark, Config, World};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "microcosm")]
#[command(version)]
#[command(about = "Artificial-life sandbox: creatures, genes, fruit and eggs on a tiled board")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "10000")]
        ticks: u64,

        /// Where to write the population history JSON
        #[arg(short, long, default_value = "history.json")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Pace the run in real time instead of flat out
        #[arg(long)]
        realtime: bool,

        /// Speed multiplier for realtime runs
        #[arg(long, default_value = "1.0")]
        timewarp: f64,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of ticks
        #[arg(short, long, default_value = "5000")]
        ticks: u64,

        /// Initial creature count
        #[arg(short, long, default_value = "50")]
        population: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            output,
            seed,
            realtime,
            timewarp,
            quiet,
        } => run_simulation(config, ticks, output, seed, realtime, timewarp, quiet),

        Commands::Benchmark { ticks, population } => run_benchmark(ticks, population),

        Commands::Init { output } => generate_config(output),
    }
}

/// Weighted random biome map. Generation stays out of the simulation
/// core; the CLI is a front end like any other.
fn generate_terrain(width: usize, height: usize, seed: u64) -> TerrainMap {
    const WEIGHTED: &[(TileKind, u32)] = &[
        (TileKind::Grass, 50),
        (TileKind::Tundra, 10),
        (TileKind::Mountain, 8),
        (TileKind::Desert, 8),
        (TileKind::Bog, 8),
        (TileKind::Magma, 4),
        (TileKind::Water, 8),
        (TileKind::DeepWater, 2),
        (TileKind::Lava, 2),
    ];

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let total: u32 = WEIGHTED.iter().map(|(_, w)| w).sum();
    let tiles = (0..width * height)
        .map(|_| {
            let mut pick = rng.gen_range(0..total);
            for &(kind, weight) in WEIGHTED {
                if pick < weight {
                    return kind;
                }
                pick -= weight;
            }
            TileKind::Grass
        })
        .collect();

    TerrainMap::new(width, height, tiles)
}

#[allow(clippy::too_many_arguments)]
fn run_simulation(
    config_path: PathBuf,
    ticks: u64,
    output: PathBuf,
    seed: Option<u64>,
    realtime: bool,
    timewarp: f64,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Config::from_file(&config_path)?
    } else {
        println!("Using default configuration");
        Config::default()
    };

    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    println!("Using seed: {}", seed);

    let terrain = generate_terrain(config.world.width, config.world.height, seed);
    let mut world = World::new_with_seed(config.clone(), terrain, seed);

    println!("Starting simulation");
    println!("  Creatures: {}", world.census().creatures);
    println!("  Board: {}x{} cells", config.world.width, config.world.height);
    println!("  Ticks: {}", ticks);
    println!();

    let sample_ticks = config
        .world
        .secs_to_ticks(config.logging.sample_interval_secs)
        .max(1);

    let start = Instant::now();

    if realtime {
        let mut game_loop = GameLoop::new(config.world.tps);
        game_loop.set_timewarp(timewarp);
        if !quiet {
            game_loop.add_listener(
                "summary",
                Box::new(move |world: &World| {
                    if world.time % sample_ticks == 0 {
                        if let Some(sample) = world.history.latest() {
                            println!("{}", sample.summary());
                        }
                    }
                }),
            );
        }
        game_loop.run_until_extinct(&mut world, ticks);
    } else {
        for _ in 0..ticks {
            world.step();

            if !quiet && world.time % sample_ticks == 0 {
                if let Some(sample) = world.history.latest() {
                    println!("{}", sample.summary());
                }
            }

            if world.is_extinct() {
                println!("\nPopulation extinct at tick {}", world.time);
                break;
            }
        }
    }

    let elapsed = start.elapsed();
    let census = world.census();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Ticks: {}", world.time);
    println!("Speed: {:.1} ticks/s", world.time as f64 / elapsed.as_secs_f64());
    println!("Creatures: {}  Fruit: {}  Eggs: {}", census.creatures, census.fruit, census.eggs);
    println!("Max generation: {}", world.generation_max);

    world.history.save_json(output.to_str().ok_or("invalid output path")?)?;
    println!("Population history: {:?}", output);

    Ok(())
}

fn run_benchmark(ticks: u64, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Microcosm Benchmark ===");
    println!("Ticks: {}", ticks);
    println!("Creatures: {}", population);
    println!();

    let result = benchmark(ticks, population);
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
