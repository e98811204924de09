//! Entity base abstraction: the common lifecycle shared by creatures,
//! fruit and eggs.
//!
//! The entity universe is a slotmap; every other structure (board cells,
//! partner references, the inspector) holds plain `EntityId` handles.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::creature::CreatureState;
use crate::genetics::Genes;
use crate::terrain::TileKind;
use crate::vector::Vec2;

new_key_type! {
    /// Handle into the world's entity table
    pub struct EntityId;
}

/// The closed set of entity variants
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EntityKind {
    Creature(CreatureState),
    Fruit(FruitState),
    Egg(EggState),
}

/// A passive food resource. Dies when eaten or when its lifespan runs out.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FruitState {
    /// Colour tag: the tile the fruit grew on
    pub tile: TileKind,
}

/// A timed incubator. Hatches into exactly one creature carrying the
/// stored genes when its lifespan expires.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EggState {
    pub child_genes: Genes,
    pub generation: u32,
}

/// An entity in the simulation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Age in ticks; feeding can wind it back, never below zero
    pub age: u64,
    pub lifespan: u64,
    /// Diameter in px
    pub size: f64,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(position: Vec2, size: f64, lifespan: u64, kind: EntityKind) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            age: 0,
            lifespan,
            size,
            kind,
        }
    }

    /// Has this entity outlived its lifespan?
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age >= self.lifespan
    }

    /// Remaining life as a percentage, 100 at birth down to 0 at death
    pub fn life_percent(&self) -> f64 {
        if self.lifespan == 0 {
            return 0.0;
        }
        (self.lifespan.saturating_sub(self.age)) as f64 / self.lifespan as f64 * 100.0
    }

    /// Integrate velocity into position for one tick
    #[inline]
    pub fn integrate(&mut self) {
        self.position = self.position.add(self.velocity);
    }

    /// Circle overlap test: centre distance minus both half-sizes
    pub fn collides_with(&self, other: &Entity) -> bool {
        let distance = self.position.distance(other.position);
        distance - self.size / 2.0 - other.size / 2.0 <= 0.0
    }

    pub fn as_creature(&self) -> Option<&CreatureState> {
        match &self.kind {
            EntityKind::Creature(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_creature_mut(&mut self) -> Option<&mut CreatureState> {
        match &mut self.kind {
            EntityKind::Creature(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_creature(&self) -> bool {
        matches!(self.kind, EntityKind::Creature(_))
    }

    pub fn is_fruit(&self) -> bool {
        matches!(self.kind, EntityKind::Fruit(_))
    }

    pub fn is_egg(&self) -> bool {
        matches!(self.kind, EntityKind::Egg(_))
    }
}
