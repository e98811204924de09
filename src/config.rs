//! Configuration system for the microcosm simulation.
//!
//! Supports YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    pub population: PopulationConfig,
    pub fruit: FruitConfig,
    pub genetics: GeneticsConfig,
    pub reproduction: ReproductionConfig,
    #[serde(default)]
    pub terrain: TerrainConfig,
    #[serde(default)]
    pub equilibrium: EquilibriumConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Board geometry and simulation rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Board width in cells
    pub width: usize,
    /// Board height in cells
    pub height: usize,
    /// Cell edge length in px
    pub cell_size: f64,
    /// Simulation ticks per second
    pub tps: u32,
}

/// Starting population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of creatures at start
    pub initial_creatures: usize,
    /// Number of fruit at start
    pub initial_fruit: usize,
}

/// Fruit resource parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FruitConfig {
    /// Base chance per land cell per second of spawning a fruit
    pub spawn_chance: f64,
    /// Fruit diameter in px
    pub size: f64,
    /// Seconds before an uneaten fruit rots away
    pub lifespan_secs: f64,
}

/// Inheritance parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticsConfig {
    /// Scales mutation magnitude; 0 disables mutation entirely
    pub mutation_multiplier: f64,
}

/// Mating sequence timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproductionConfig {
    /// Scales how fast reproductive urge accrues
    pub rate_multiplier: f64,
    /// Seconds a mating pair stays locked together
    pub mating_secs: f64,
    /// Seconds an egg incubates before hatching
    pub incubation_secs: f64,
    /// Extra seconds after incubation before urge accrues again
    pub cooldown_secs: f64,
}

/// Terrain preference behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Probability that a creature rejects food or wander targets on a
    /// tile other than its birth tile (0.0 - 1.0)
    pub tile_preference: f64,
}

/// Population feedback on fruit spawning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquilibriumConfig {
    /// Creature count the fruit supply steers the population towards
    pub target: usize,
    /// Lower clamp on the feedback multiplier
    pub min_multiplier: f64,
    /// Upper clamp on the feedback multiplier
    pub max_multiplier: f64,
}

/// Logging and sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Seconds between population samples
    pub sample_interval_secs: f64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            population: PopulationConfig::default(),
            fruit: FruitConfig::default(),
            genetics: GeneticsConfig::default(),
            reproduction: ReproductionConfig::default(),
            terrain: TerrainConfig::default(),
            equilibrium: EquilibriumConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            cell_size: 60.0,
            tps: 20,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_creatures: 10,
            initial_fruit: 50,
        }
    }
}

impl Default for FruitConfig {
    fn default() -> Self {
        Self {
            spawn_chance: 0.07,
            size: 8.0,
            lifespan_secs: 10.0,
        }
    }
}

impl Default for GeneticsConfig {
    fn default() -> Self {
        Self {
            mutation_multiplier: 1.0,
        }
    }
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            rate_multiplier: 1.0,
            mating_secs: 2.0,
            incubation_secs: 5.0,
            cooldown_secs: 2.0,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            tile_preference: 0.9,
        }
    }
}

impl Default for EquilibriumConfig {
    fn default() -> Self {
        Self {
            target: 20,
            min_multiplier: 0.25,
            max_multiplier: 4.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 1.0,
            log_level: "info".to_string(),
        }
    }
}

impl WorldConfig {
    /// Convert a duration in seconds to whole ticks
    pub fn secs_to_ticks(&self, secs: f64) -> u64 {
        (secs * f64::from(self.tps)).round() as u64
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Ticks a mating pair stays locked
    pub fn mating_ticks(&self) -> u64 {
        self.world.secs_to_ticks(self.reproduction.mating_secs)
    }

    /// Ticks an egg incubates before hatching
    pub fn incubation_ticks(&self) -> u64 {
        self.world.secs_to_ticks(self.reproduction.incubation_secs)
    }

    /// Ticks after a mating begins before urge accrues again
    pub fn reproduction_window_ticks(&self) -> u64 {
        self.mating_ticks()
            + self.incubation_ticks()
            + self.world.secs_to_ticks(self.reproduction.cooldown_secs)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.world.width == 0 || self.world.height == 0 {
            return Err("board must be at least 1x1 cells".to_string());
        }
        if self.world.width > 255 || self.world.height > 255 {
            return Err("board dimensions must be at most 255 cells".to_string());
        }
        if self.world.cell_size <= 0.0 {
            return Err("cell_size must be > 0".to_string());
        }
        if self.world.tps == 0 {
            return Err("tps must be > 0".to_string());
        }
        if self.fruit.size <= 0.0 || self.fruit.lifespan_secs <= 0.0 {
            return Err("fruit size and lifespan must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.fruit.spawn_chance) {
            return Err("fruit spawn_chance must be between 0 and 1".to_string());
        }
        if self.genetics.mutation_multiplier < 0.0 {
            return Err("mutation_multiplier must be >= 0".to_string());
        }
        if self.reproduction.rate_multiplier <= 0.0 {
            return Err("reproduction rate_multiplier must be > 0".to_string());
        }
        if self.reproduction.mating_secs < 0.0
            || self.reproduction.incubation_secs < 0.0
            || self.reproduction.cooldown_secs < 0.0
        {
            return Err("reproduction timings must be >= 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.terrain.tile_preference) {
            return Err("tile_preference must be between 0 and 1".to_string());
        }
        if self.equilibrium.target == 0 {
            return Err("equilibrium target must be > 0".to_string());
        }
        if self.equilibrium.min_multiplier <= 0.0
            || self.equilibrium.min_multiplier > self.equilibrium.max_multiplier
        {
            return Err("equilibrium multiplier clamps must satisfy 0 < min <= max".to_string());
        }
        if self.logging.sample_interval_secs <= 0.0 {
            return Err("sample_interval_secs must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.world.width, loaded.world.width);
        assert_eq!(config.world.tps, loaded.world.tps);
    }

    #[test]
    fn test_optional_sections_default() {
        let yaml = r#"
world: { width: 5, height: 5, cell_size: 60.0, tps: 20 }
population: { initial_creatures: 4, initial_fruit: 10 }
fruit: { spawn_chance: 0.07, size: 8.0, lifespan_secs: 10.0 }
genetics: { mutation_multiplier: 1.0 }
reproduction: { rate_multiplier: 1.0, mating_secs: 2.0, incubation_secs: 5.0, cooldown_secs: 2.0 }
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.equilibrium.target, 20);
        assert_eq!(config.terrain.tile_preference, 0.9);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = Config::default();
        config.world.tps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.terrain.tile_preference = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.equilibrium.min_multiplier = 8.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_conversions() {
        let config = Config::default();
        assert_eq!(config.mating_ticks(), 40);
        assert_eq!(config.incubation_ticks(), 100);
        assert_eq!(config.reproduction_window_ticks(), 180);
    }
}
