//! Per-tile terrain classification and tile effects.
//!
//! Terrain generation itself lives outside the core (the map is handed in
//! fully built); this module only models what a tile *does* to the
//! simulation: movement and spawn modifiers, hazards applied to creatures
//! walking on it, and ambient effects fired on random tiles each board tick.

use serde::{Deserialize, Serialize};

/// Tile types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Grass,
    Tundra,
    Mountain,
    Desert,
    Magma,
    Bog,
    Water,
    DeepWater,
    Lava,
}

/// Modifiers a tile applies to entities on it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileEffects {
    /// Multiplier on creature movement speed
    pub speed_multiplier: f64,
    /// Multiplier on the per-cell fruit spawn chance
    pub fruit_spawn_multiplier: f64,
    /// Fraction of remaining life removed per second while standing here
    pub survival_penalty: f64,
}

impl Default for TileEffects {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            fruit_spawn_multiplier: 1.0,
            survival_penalty: 0.0,
        }
    }
}

/// Ambient effect fired when a tile is picked for a board tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TileTickEffect {
    /// Lava vents smoke
    Smoke,
}

impl TileKind {
    pub fn name(&self) -> &'static str {
        match self {
            TileKind::Grass => "Grass",
            TileKind::Tundra => "Tundra",
            TileKind::Mountain => "Mountain",
            TileKind::Desert => "Desert",
            TileKind::Magma => "Magma",
            TileKind::Bog => "Bog",
            TileKind::Water => "Water",
            TileKind::DeepWater => "Deep water",
            TileKind::Lava => "Lava",
        }
    }

    /// Liquid tiles hold no land life: no fruit spawns and no creature
    /// spawn positions are drawn from them.
    pub fn is_liquid(&self) -> bool {
        matches!(self, TileKind::Water | TileKind::DeepWater | TileKind::Lava)
    }

    pub fn effects(&self) -> TileEffects {
        match self {
            TileKind::Bog => TileEffects {
                speed_multiplier: 0.6,
                fruit_spawn_multiplier: 1.4,
                ..TileEffects::default()
            },
            TileKind::Mountain => TileEffects {
                speed_multiplier: 0.8,
                fruit_spawn_multiplier: 0.5,
                ..TileEffects::default()
            },
            TileKind::Desert => TileEffects {
                fruit_spawn_multiplier: 0.4,
                ..TileEffects::default()
            },
            TileKind::Magma => TileEffects {
                fruit_spawn_multiplier: 0.3,
                survival_penalty: 0.02,
                ..TileEffects::default()
            },
            TileKind::Lava => TileEffects {
                speed_multiplier: 0.5,
                fruit_spawn_multiplier: 0.0,
                survival_penalty: 0.1,
                ..TileEffects::default()
            },
            _ => TileEffects::default(),
        }
    }

    /// Whether walking on this tile harms creatures once per second
    pub fn is_hazard(&self) -> bool {
        self.effects().survival_penalty > 0.0
    }

    /// Ambient effect to fire when this tile is ticked, if any
    pub fn tick_effect(&self) -> Option<TileTickEffect> {
        match self {
            TileKind::Lava => Some(TileTickEffect::Smoke),
            _ => None,
        }
    }
}

/// A fully generated tile map, consumed read-only by the core
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerrainMap {
    width: usize,
    height: usize,
    tiles: Vec<TileKind>,
}

impl TerrainMap {
    /// Wrap an externally generated tile map.
    ///
    /// Panics when the tile count does not match the dimensions; a
    /// mismatched map is a misconfiguration.
    pub fn new(width: usize, height: usize, tiles: Vec<TileKind>) -> Self {
        assert_eq!(
            tiles.len(),
            width * height,
            "terrain map of {} tiles does not cover a {}x{} board",
            tiles.len(),
            width,
            height
        );
        Self {
            width,
            height,
            tiles,
        }
    }

    /// A single-biome map, handy for tests and default worlds
    pub fn uniform(width: usize, height: usize, kind: TileKind) -> Self {
        Self::new(width, height, vec![kind; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile at a cell index (`y * width + x`)
    pub fn tile(&self, cell: usize) -> TileKind {
        self.tiles[cell]
    }

    pub fn tile_xy(&self, x: usize, y: usize) -> TileKind {
        self.tiles[y * self.width + x]
    }

    /// Indexes of all land (non-liquid) cells
    pub fn land_cells(&self) -> Vec<usize> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_liquid())
            .map(|(i, _)| i)
            .collect()
    }
}
