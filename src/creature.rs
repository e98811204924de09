//! Creature state and the per-tick decision engine.
//!
//! A creature's tick runs in a fixed priority order: reproduction timers,
//! urge accrual, steering towards the current target, perception, then
//! target selection (mate > fruit > random wander). The reproduction
//! sequence is a timer-driven state machine — an explicit stage plus a
//! deadline tick re-checked every frame, never a blocking wait — so the
//! whole simulation stays single-threaded and cooperative.

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::entity::{Entity, EntityId, EntityKind};
use crate::genetics::{move_speed, Genes};
use crate::terrain::TileKind;
use crate::vector::{PolarVec2, Vec2};

/// Reproductive urge gained per second at a reproductive rate of 1
pub const BASE_REPRODUCTIVE_RATE: f64 = 50.0;

/// Chance per second that an idle creature wanders to a random spot
pub const MOVE_CHANCE: f64 = 0.95;

/// Seconds of life restored by eating one fruit
pub const FEED_AMOUNT_SECS: f64 = 10.0;

/// Average heart particles emitted per second while mating
pub const HEART_PARTICLES_PER_SEC: f64 = 2.0;

/// Egg diameter in px
pub const EGG_SIZE: f64 = 12.0;

/// Maximum distance from the parent at which an egg is laid
pub const EGG_LAY_OFFSET: f64 = 30.0;

/// Position in the mating state machine.
///
/// Aging is suspended for any stage at or past `Reproducing`; the pair is
/// metabolically frozen until incubation completes.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ReproductionStage {
    #[default]
    Idle,
    SeekingPartner,
    Reproducing,
    /// Post-mating wait while the laid egg incubates
    Incubating,
}

/// Creature-specific state carried inside [`EntityKind::Creature`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatureState {
    pub genes: Genes,
    /// Derived from speed and size at creation, cached
    pub move_speed: f64,
    /// 0..100
    pub reproductive_urge: f64,
    /// Non-owning back-reference to the locked mate
    pub partner: Option<EntityId>,
    pub stage: ReproductionStage,
    /// Tick at which the current Reproducing/Incubating phase ends
    pub stage_deadline: u64,
    /// Tick the last mating began; gates urge accrual until the
    /// reproduction + incubation + abstinence window has passed
    pub last_reproduction: Option<u64>,
    pub target: Option<Vec2>,
    pub is_moving: bool,
    /// Biome the creature hatched on; foraging and wandering are
    /// statistically biased back towards it
    pub birth_tile: TileKind,
    /// Staggers once-per-second tile hazard damage across the population
    pub phase_seed: u32,
    pub fruit_eaten: u32,
    pub generation: u32,
}

impl CreatureState {
    pub fn new(genes: Genes, generation: u32, birth_tile: TileKind, phase_seed: u32) -> Self {
        Self {
            genes,
            move_speed: move_speed(&genes),
            reproductive_urge: 0.0,
            partner: None,
            stage: ReproductionStage::Idle,
            stage_deadline: 0,
            last_reproduction: None,
            target: None,
            is_moving: false,
            birth_tile,
            phase_seed,
            fruit_eaten: 0,
            generation,
        }
    }

    /// A creature wants to reproduce once its urge overtakes its
    /// remaining life, unless it is already mid-sequence.
    pub fn wants_to_reproduce(&self, life_percent: f64) -> bool {
        self.reproductive_urge > life_percent && self.stage < ReproductionStage::Reproducing
    }

    /// Accrue urge for one tick. Only runs while idle and past the full
    /// reproduction window since the last mating.
    pub fn accrue_urge(&mut self, time: u64, window_ticks: u64, rate_multiplier: f64, tps: u32) {
        if self.stage != ReproductionStage::Idle {
            return;
        }
        if let Some(last) = self.last_reproduction {
            if time.saturating_sub(last) <= window_ticks {
                return;
            }
        }

        self.reproductive_urge += BASE_REPRODUCTIVE_RATE
            * self.genes.reproductive_rate
            * rate_multiplier
            / f64::from(tps);
        self.reproductive_urge = self.reproductive_urge.min(100.0);
    }

    /// Steer towards the current target, if any. Returns the velocity for
    /// this tick.
    ///
    /// Arrival is a distance threshold of one tick's travel rather than
    /// the dot-product sign trick: overshooting at high speed no longer
    /// reports a false arrival. The final step carries the creature
    /// exactly onto the target; stopping short would leave a fast
    /// creature stalled outside contact range of the fruit or mate it is
    /// chasing.
    pub fn steer(&mut self, position: Vec2, tile_speed_multiplier: f64) -> Vec2 {
        let Some(target) = self.target else {
            return Vec2::ZERO;
        };

        let step = self.move_speed * tile_speed_multiplier;
        if position.distance(target) <= step.max(f64::EPSILON) {
            self.arrive();
            return Vec2::new(target.x - position.x, target.y - position.y);
        }

        PolarVec2::new(step, position.angle_to(target)).to_cartesian()
    }

    /// Stop at the current position and drop the target
    pub fn arrive(&mut self) {
        self.is_moving = false;
        self.target = None;
    }

    /// Lock onto a mate and head for it
    pub fn begin_seeking(&mut self, partner: EntityId, partner_position: Vec2) {
        self.stage = ReproductionStage::SeekingPartner;
        self.partner = Some(partner);
        self.target = Some(partner_position);
        self.is_moving = true;
    }

    /// Enter the mating phase: frozen in place, urge spent
    pub fn begin_mating(&mut self, time: u64, reproduction_ticks: u64) {
        self.stage = ReproductionStage::Reproducing;
        self.stage_deadline = time + reproduction_ticks;
        self.last_reproduction = Some(time);
        self.reproductive_urge = 0.0;
        self.target = None;
        self.is_moving = false;
    }

    /// Move into the incubation wait after the egg is laid
    pub fn begin_incubating(&mut self, time: u64, incubation_ticks: u64) {
        self.stage = ReproductionStage::Incubating;
        self.stage_deadline = time + incubation_ticks;
        self.partner = None;
    }

    /// Abort the mating sequence and return to ordinary life
    pub fn reset_to_idle(&mut self) {
        self.stage = ReproductionStage::Idle;
        self.partner = None;
        self.target = None;
        self.is_moving = false;
    }
}

/// What a creature noticed this tick
#[derive(Clone, Debug, Default)]
pub struct Perception {
    /// Nearest fruit that passed the terrain-preference filter
    pub closest_fruit: Option<(EntityId, Vec2)>,
    /// Nearest creature both sides would mate with
    pub closest_mate: Option<(EntityId, Vec2)>,
    /// Physically overlapping the locked partner while still willing
    pub partner_contact: bool,
    /// Fruit physically overlapped this tick
    pub fruit_contacts: Vec<EntityId>,
}

/// Single pass over the visible entities, tracking the nearest fruit and
/// the nearest eligible mate simultaneously.
///
/// A candidate is an eligible mate iff both parties want to reproduce and
/// the candidate's partner is either unset or already us — a contested
/// creature is invisible to everyone else. Fruit on a foreign biome is
/// skipped with probability `tile_preference`, which keeps creatures
/// foraging near their birth tile.
pub fn perceive<R: Rng>(
    me_id: EntityId,
    me: &Entity,
    nearby: &[EntityId],
    entities: &SlotMap<EntityId, Entity>,
    tile_preference: f64,
    rng: &mut R,
) -> Perception {
    let Some(my) = me.as_creature() else {
        return Perception::default();
    };
    let me_wants = my.wants_to_reproduce(me.life_percent());

    let mut perception = Perception::default();
    let mut fruit_distance = f64::INFINITY;
    let mut mate_distance = f64::INFINITY;

    for &id in nearby {
        if id == me_id {
            continue;
        }
        let Some(other) = entities.get(id) else {
            continue;
        };

        match &other.kind {
            EntityKind::Creature(candidate) => {
                if me_wants
                    && candidate.wants_to_reproduce(other.life_percent())
                    && (candidate.partner.is_none() || candidate.partner == Some(me_id))
                {
                    let distance = me.position.distance(other.position);
                    if distance < mate_distance {
                        perception.closest_mate = Some((id, other.position));
                        mate_distance = distance;
                    }
                }

                if my.partner == Some(id) && me_wants && me.collides_with(other) {
                    perception.partner_contact = true;
                }
            }
            EntityKind::Fruit(fruit) => {
                let preferred = fruit.tile == my.birth_tile;
                if preferred || rng.gen::<f64>() >= tile_preference {
                    let distance = me.position.distance(other.position);
                    if distance < fruit_distance {
                        perception.closest_fruit = Some((id, other.position));
                        fruit_distance = distance;
                    }
                }

                if me.collides_with(other) {
                    perception.fruit_contacts.push(id);
                }
            }
            EntityKind::Egg(_) => {}
        }
    }

    perception
}
