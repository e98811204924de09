//! # Microcosm
//!
//! A small artificial-life sandbox: creatures with heritable genes roam a
//! tiled board, forage for fruit, pick mates and lay eggs, while the
//! environment feeds back on the food supply to keep the population near a
//! configured equilibrium.
//!
//! ## Features
//!
//! - **Deterministic**: seeded random number generation, same seed same run
//! - **Evolvable**: sexual recombination with unclamped mutation drift
//! - **Configurable**: YAML configuration files
//! - **Headless**: the core never draws; front ends attach through the
//!   [`presenter::Presenter`] seam
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use microcosm::terrain::{TerrainMap, TileKind};
//! use microcosm::{Config, World};
//!
//! let config = Config::default();
//! let terrain = TerrainMap::uniform(config.world.width, config.world.height, TileKind::Grass);
//! let mut world = World::new(config, terrain);
//!
//! world.run(1000);
//!
//! let census = world.census();
//! println!("Creatures: {}", census.creatures);
//! println!("Max generation: {}", world.generation_max);
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use microcosm::Config;
//!
//! let mut config = Config::default();
//! config.population.initial_creatures = 25;
//! config.genetics.mutation_multiplier = 2.0;
//! ```

pub mod board;
pub mod config;
pub mod creature;
pub mod entity;
pub mod error;
pub mod genetics;
pub mod presenter;
pub mod runner;
pub mod stats;
pub mod terrain;
pub mod vector;
pub mod world;

// Re-export main types
pub use config::Config;
pub use error::SimError;
pub use world::World;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark on a uniform grass board
pub fn benchmark(ticks: u64, population: usize) -> BenchmarkResult {
    use crate::terrain::{TerrainMap, TileKind};
    use std::time::Instant;

    let mut config = Config::default();
    config.population.initial_creatures = population;

    let terrain = TerrainMap::uniform(config.world.width, config.world.height, TileKind::Grass);
    let mut world = World::new(config, terrain);

    let start = Instant::now();
    world.run(ticks);
    let elapsed = start.elapsed();

    BenchmarkResult {
        ticks,
        initial_population: population,
        final_population: world.census().creatures,
        elapsed_secs: elapsed.as_secs_f64(),
        ticks_per_second: ticks as f64 / elapsed.as_secs_f64(),
        max_generation: world.generation_max,
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub ticks: u64,
    pub initial_population: usize,
    pub final_population: usize,
    pub elapsed_secs: f64,
    pub ticks_per_second: f64,
    pub max_generation: u32,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Ticks: {}", self.ticks)?;
        writeln!(
            f,
            "Creatures: {} -> {}",
            self.initial_population, self.final_population
        )?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} ticks/s", self.ticks_per_second)?;
        writeln!(f, "Max generation: {}", self.max_generation)?;
        Ok(())
    }
}
