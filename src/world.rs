//! World simulation engine - main simulation loop.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use slotmap::SlotMap;

use crate::board::Board;
use crate::config::Config;
use crate::creature::{
    self, perceive, CreatureState, ReproductionStage, EGG_LAY_OFFSET, EGG_SIZE, FEED_AMOUNT_SECS,
    HEART_PARTICLES_PER_SEC, MOVE_CHANCE,
};
use crate::entity::{EggState, Entity, EntityId, EntityKind, FruitState};
use crate::error::SimError;
use crate::genetics::{crossover, lifespan_ticks, GenePool, Genes};
use crate::presenter::{NullPresenter, ParticleKind, Presenter};
use crate::stats::{PopulationSample, SampleHistory};
use crate::terrain::TerrainMap;
use crate::vector::Vec2;

/// Live population counts, decoupled from ticking
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Census {
    pub creatures: usize,
    pub fruit: usize,
    pub eggs: usize,
}

/// The simulation world
pub struct World {
    // Population
    pub entities: SlotMap<EntityId, Entity>,

    // Environment
    pub board: Board,

    // State
    pub time: u64,
    pub generation_max: u32,
    /// Equilibrium feedback on fruit spawning, refreshed once per second
    pub fruit_multiplier: f64,

    // Configuration
    pub config: Config,

    // Statistics
    pub history: SampleHistory,

    // Display seam
    presenter: Box<dyn Presenter>,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,

    births_this_tick: usize,
    deaths_this_tick: usize,
}

impl World {
    /// Create a new world with the given configuration and terrain
    pub fn new(config: Config, terrain: TerrainMap) -> Self {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, terrain, seed)
    }

    /// Create a new world with a specific seed for reproducibility
    pub fn new_with_seed(config: Config, terrain: TerrainMap, seed: u64) -> Self {
        assert_eq!(
            (terrain.width(), terrain.height()),
            (config.world.width, config.world.height),
            "terrain map does not match the configured board dimensions"
        );

        let rng = ChaCha8Rng::seed_from_u64(seed);
        let board = Board::new(config.world.cell_size, terrain);

        let mut world = Self {
            entities: SlotMap::with_key(),
            board,
            time: 0,
            generation_max: 0,
            fruit_multiplier: 1.0,
            config,
            history: SampleHistory::new(),
            presenter: Box::new(NullPresenter),
            rng,
            seed,
            births_this_tick: 0,
            deaths_this_tick: 0,
        };

        for _ in 0..world.config.population.initial_creatures {
            let position = world.board.random_position(&mut world.rng);
            let genes = Genes::generate(&mut world.rng);
            world.spawn_creature(position, genes, 0);
        }
        for _ in 0..world.config.population.initial_fruit {
            world.spawn_fruit(None);
        }

        world
    }

    /// Replace the display seam. Defaults to [`NullPresenter`].
    pub fn set_presenter(&mut self, presenter: Box<dyn Presenter>) {
        self.presenter = presenter;
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Main simulation step
    pub fn step(&mut self) {
        self.births_this_tick = 0;
        self.deaths_this_tick = 0;

        // Phase 1: tick every entity alive at the start of the step.
        // A failing tick is logged and skipped, never aborts the step.
        let ids: Vec<EntityId> = self.entities.keys().collect();
        for id in ids {
            if !self.entities.contains_key(id) {
                continue;
            }
            if let Err(e) = self.tick_entity(id) {
                log::warn!("tick {}: entity tick failed: {}", self.time, e);
            }
        }

        // Phase 2: deaths and hatching
        self.resolve_lifecycle();

        // Phase 3: fruit spawning
        self.spawn_ambient_fruit();

        // Phase 4: ambient tile ticks
        self.tick_tiles();

        // Phase 5: equilibrium feedback, once per second
        if self.time % u64::from(self.config.world.tps) == 0 {
            self.update_fruit_multiplier();
        }

        // Phase 6: periodic sampling
        self.update_stats();

        if self.births_this_tick > 0 || self.deaths_this_tick > 0 {
            log::trace!(
                "tick {}: {} born, {} died",
                self.time,
                self.births_this_tick,
                self.deaths_this_tick
            );
        }

        self.time += 1;
    }

    /// Run simulation for specified number of ticks
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Run simulation with callback for progress updates
    pub fn run_with_callback<F>(&mut self, ticks: u64, mut callback: F)
    where
        F: FnMut(&World, u64),
    {
        for i in 0..ticks {
            self.step();
            callback(self, i);
        }
    }

    /// Count the live population by kind
    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for entity in self.entities.values() {
            match entity.kind {
                EntityKind::Creature(_) => census.creatures += 1,
                EntityKind::Fruit(_) => census.fruit += 1,
                EntityKind::Egg(_) => census.eggs += 1,
            }
        }
        census
    }

    /// Check if the creature population is extinct (eggs count as alive)
    pub fn is_extinct(&self) -> bool {
        let census = self.census();
        census.creatures == 0 && census.eggs == 0
    }

    /// Spawn a creature and register it everywhere
    pub fn spawn_creature(&mut self, position: Vec2, genes: Genes, generation: u32) -> EntityId {
        let tps = self.config.world.tps;
        let position = self.board.clamp(position);
        let birth_tile = self.board.tile_at(position);
        let state = CreatureState::new(genes, generation, birth_tile, self.rng.gen());
        let entity = Entity::new(
            position,
            genes.size,
            lifespan_ticks(&genes, tps),
            EntityKind::Creature(state),
        );

        let id = self.entities.insert(entity);
        self.board.insert(id, position, genes.size);
        self.presenter.entity_created(id, position);

        self.generation_max = self.generation_max.max(generation);
        self.births_this_tick += 1;
        id
    }

    /// Spawn a fruit, either in a specific cell or anywhere on land.
    /// Returns `None` when the chosen spot turns out to be liquid.
    pub fn spawn_fruit(&mut self, cell: Option<usize>) -> Option<EntityId> {
        let position = match cell {
            Some(cell) => self.board.random_position_in_cell(cell, &mut self.rng),
            None => self.board.random_position(&mut self.rng),
        };
        let tile = self.board.tile_at(position);
        if tile.is_liquid() {
            return None;
        }

        let lifespan = self.config.world.secs_to_ticks(self.config.fruit.lifespan_secs);
        let size = self.config.fruit.size;
        let entity = Entity::new(position, size, lifespan, EntityKind::Fruit(FruitState { tile }));

        let id = self.entities.insert(entity);
        self.board.insert(id, position, size);
        self.presenter.entity_created(id, position);
        Some(id)
    }

    /// Lay an egg carrying a finished gene set
    pub fn spawn_egg(&mut self, position: Vec2, child_genes: Genes, generation: u32) -> EntityId {
        let position = self.board.clamp(position);
        let entity = Entity::new(
            position,
            EGG_SIZE,
            self.config.incubation_ticks().max(1),
            EntityKind::Egg(EggState {
                child_genes,
                generation,
            }),
        );

        let id = self.entities.insert(entity);
        self.board.insert(id, position, EGG_SIZE);
        self.presenter.entity_created(id, position);
        id
    }

    /// Advance one entity by one tick
    fn tick_entity(&mut self, id: EntityId) -> Result<(), SimError> {
        let entity = self.entities.get_mut(id).ok_or(SimError::MissingEntity(id))?;

        match &entity.kind {
            EntityKind::Fruit(_) | EntityKind::Egg(_) => {
                entity.age += 1;
                Ok(())
            }
            EntityKind::Creature(c) => {
                // Aging is suspended while the creature is locked in the
                // reproduction sequence
                if c.stage < ReproductionStage::Reproducing {
                    entity.age += 1;
                }
                self.tick_creature(id)
            }
        }
    }

    /// Full per-tick behaviour pass for one creature
    fn tick_creature(&mut self, id: EntityId) -> Result<(), SimError> {
        let tps = self.config.world.tps;

        let (stage, deadline, position, size) = {
            let entity = self.entities.get(id).ok_or(SimError::MissingEntity(id))?;
            let c = entity.as_creature().ok_or(SimError::MissingEntity(id))?;
            (c.stage, c.stage_deadline, entity.position, entity.size)
        };

        // Reproduction timers come first; a locked creature does nothing else
        if stage >= ReproductionStage::Reproducing {
            if stage == ReproductionStage::Reproducing {
                if self.rng.gen::<f64>() < HEART_PARTICLES_PER_SEC / f64::from(tps) {
                    let at = position.random_offset(size, &mut self.rng);
                    self.presenter.particle(ParticleKind::Heart, at);
                }
                if self.time >= deadline {
                    self.finish_mating(id)?;
                }
            } else if self.time >= deadline {
                if let Some(c) = self
                    .entities
                    .get_mut(id)
                    .and_then(Entity::as_creature_mut)
                {
                    c.reset_to_idle();
                }
            }
            return Ok(());
        }

        self.apply_walk_hazard(id, position)?;

        // Urge accrual
        let window = self.config.reproduction_window_ticks();
        let rate_multiplier = self.config.reproduction.rate_multiplier;
        let time = self.time;
        {
            let entity = self.entities.get_mut(id).ok_or(SimError::MissingEntity(id))?;
            let c = entity.as_creature_mut().ok_or(SimError::MissingEntity(id))?;
            c.accrue_urge(time, window, rate_multiplier, tps);
        }

        // Movement towards last tick's target
        let speed_multiplier = self.board.tile_at(position).effects().speed_multiplier;
        let (position, size, vision) = {
            let entity = self.entities.get_mut(id).ok_or(SimError::MissingEntity(id))?;
            let pos = entity.position;
            let (velocity, vision) = {
                let c = entity.as_creature_mut().ok_or(SimError::MissingEntity(id))?;
                (c.steer(pos, speed_multiplier), c.genes.vision)
            };
            entity.velocity = velocity;
            entity.integrate();
            entity.position = self.board.clamp(entity.position);
            (entity.position, entity.size, vision)
        };
        self.board.update(id, position, size);
        self.presenter.entity_moved(id, position);

        // Perception: single pass over everything within vision range
        let me = self.entities.get(id).ok_or(SimError::MissingEntity(id))?.clone();
        let nearby = self.board.nearby(position, vision, &self.entities);
        let perception = perceive(
            id,
            &me,
            &nearby,
            &self.entities,
            self.config.terrain.tile_preference,
            &mut self.rng,
        );

        if self.presenter.inspected() == Some(id) {
            let c = me.as_creature().ok_or(SimError::MissingEntity(id))?;
            log::debug!(
                "tick {}: inspect {:?}: stage {:?} urge {:.1} life {:.1}% target {:?}",
                self.time,
                id,
                c.stage,
                c.reproductive_urge,
                me.life_percent(),
                c.target
            );
        }

        // Contacts: eat overlapping fruit
        for fruit_id in &perception.fruit_contacts {
            self.eat_fruit(id, *fruit_id)?;
        }

        // Contact with the locked partner starts the mating phase for both
        if perception.partner_contact {
            let partner_id = me
                .as_creature()
                .and_then(|c| c.partner)
                .ok_or(SimError::MissingEntity(id))?;
            let mating = self.config.mating_ticks();
            for pair_id in [id, partner_id] {
                let c = self
                    .entities
                    .get_mut(pair_id)
                    .and_then(Entity::as_creature_mut)
                    .ok_or(SimError::MissingEntity(pair_id))?;
                c.begin_mating(time, mating);
            }
            return Ok(());
        }

        self.resolve_priorities(id, position, vision, &perception)
    }

    /// Target selection: mate > fruit > random wander
    fn resolve_priorities(
        &mut self,
        id: EntityId,
        position: Vec2,
        vision: f64,
        perception: &creature::Perception,
    ) -> Result<(), SimError> {
        let (stage, partner_id) = {
            let c = self
                .entities
                .get(id)
                .and_then(Entity::as_creature)
                .ok_or(SimError::MissingEntity(id))?;
            (c.stage, c.partner)
        };

        // Drop a stale reverse lock left by a suitor that moved on or died
        if let Some(pid) = partner_id {
            let suitor_still_locked = self
                .entities
                .get(pid)
                .and_then(Entity::as_creature)
                .is_some_and(|p| p.partner == Some(id));
            if !suitor_still_locked {
                if let Some(c) = self.entities.get_mut(id).and_then(Entity::as_creature_mut) {
                    c.partner = None;
                }
            }
        }

        if let Some((mate_id, mate_position)) = perception.closest_mate {
            let previous = {
                let c = self
                    .entities
                    .get_mut(id)
                    .and_then(Entity::as_creature_mut)
                    .ok_or(SimError::MissingEntity(id))?;
                let previous = c.partner;
                c.begin_seeking(mate_id, mate_position);
                previous
            };
            // Switching candidates releases the old one's reverse lock
            if let Some(previous) = previous.filter(|p| *p != mate_id) {
                if let Some(old) = self
                    .entities
                    .get_mut(previous)
                    .and_then(Entity::as_creature_mut)
                {
                    if old.partner == Some(id) {
                        old.partner = None;
                    }
                }
            }
            // Reciprocal lock so later suitors see the mate as taken
            if let Some(mate) = self.entities.get_mut(mate_id).and_then(Entity::as_creature_mut) {
                if mate.partner.is_none() {
                    mate.partner = Some(id);
                }
            }
            return Ok(());
        }

        if stage == ReproductionStage::SeekingPartner {
            // Lost sight of the candidate; release the lock on both sides
            let partner_id = self
                .entities
                .get(id)
                .and_then(Entity::as_creature)
                .and_then(|c| c.partner);
            if let Some(partner_id) = partner_id {
                if let Some(partner) = self
                    .entities
                    .get_mut(partner_id)
                    .and_then(Entity::as_creature_mut)
                {
                    if partner.partner == Some(id) {
                        partner.partner = None;
                    }
                }
            }
            if let Some(c) = self.entities.get_mut(id).and_then(Entity::as_creature_mut) {
                c.reset_to_idle();
            }
            return Ok(());
        }

        let c = self
            .entities
            .get_mut(id)
            .and_then(Entity::as_creature_mut)
            .ok_or(SimError::MissingEntity(id))?;

        if let Some((_, fruit_position)) = perception.closest_fruit {
            c.target = Some(fruit_position);
            c.is_moving = true;
            return Ok(());
        }

        // Random wander
        let tps = self.config.world.tps;
        if !c.is_moving && self.rng.gen::<f64>() < MOVE_CHANCE / f64::from(tps) {
            let home_tile = c.birth_tile;
            let target = self.board.random_nearby_position(
                position,
                vision,
                home_tile,
                self.config.terrain.tile_preference,
                &mut self.rng,
            );
            let c = self
                .entities
                .get_mut(id)
                .and_then(Entity::as_creature_mut)
                .ok_or(SimError::MissingEntity(id))?;
            c.target = Some(target);
            c.is_moving = true;
        }
        Ok(())
    }

    /// Hazardous tiles remove a fraction of total lifespan once per
    /// second, staggered across the population by each creature's phase
    /// seed so the damage does not land on the same tick for everyone
    fn apply_walk_hazard(&mut self, id: EntityId, position: Vec2) -> Result<(), SimError> {
        let penalty = self.board.tile_at(position).effects().survival_penalty;
        if penalty <= 0.0 {
            return Ok(());
        }

        let tps = u64::from(self.config.world.tps);
        let entity = self.entities.get_mut(id).ok_or(SimError::MissingEntity(id))?;
        let phase = entity
            .as_creature()
            .map(|c| u64::from(c.phase_seed))
            .unwrap_or(0);
        if (self.time + phase) % tps == 0 {
            let damage = (entity.lifespan as f64 * penalty).round() as u64;
            entity.age = entity.age.saturating_add(damage);
        }
        Ok(())
    }

    /// Consume one fruit: the eater's clock winds back, the fruit dies
    fn eat_fruit(&mut self, eater: EntityId, fruit: EntityId) -> Result<(), SimError> {
        if self.entities.get(fruit).is_none() {
            // Another creature got there first this tick
            return Ok(());
        }
        self.remove_entity(fruit);

        let feed = self.config.world.secs_to_ticks(FEED_AMOUNT_SECS);
        let entity = self.entities.get_mut(eater).ok_or(SimError::MissingEntity(eater))?;
        entity.age = entity.age.saturating_sub(feed);
        let c = entity.as_creature_mut().ok_or(SimError::MissingEntity(eater))?;
        c.fruit_eaten += 1;
        Ok(())
    }

    /// The mating deadline fired: lay exactly one egg per pair.
    ///
    /// The first partner whose deadline fires lays the egg and moves both
    /// partners to Incubating, so the second deadline never fires in the
    /// Reproducing stage. A partner that died mid-sequence aborts the
    /// mating instead.
    fn finish_mating(&mut self, id: EntityId) -> Result<(), SimError> {
        let (my_genes, my_position, my_generation, partner_id) = {
            let entity = self.entities.get(id).ok_or(SimError::MissingEntity(id))?;
            let c = entity.as_creature().ok_or(SimError::MissingEntity(id))?;
            (c.genes, entity.position, c.generation, c.partner)
        };

        let partner = partner_id.and_then(|pid| {
            self.entities.get(pid).and_then(Entity::as_creature).map(|c| (pid, c.genes, c.generation, c.stage, c.partner))
        });

        let valid = matches!(
            partner,
            Some((_, _, _, ReproductionStage::Reproducing, back)) if back == Some(id)
        );

        if !valid {
            if let Some(c) = self.entities.get_mut(id).and_then(Entity::as_creature_mut) {
                c.reset_to_idle();
            }
            return Ok(());
        }
        let (partner_id, partner_genes, partner_generation, _, _) =
            partner.ok_or(SimError::MissingEntity(id))?;

        let child_genes = crossover(
            &my_genes,
            &partner_genes,
            self.config.genetics.mutation_multiplier,
            &mut self.rng,
        );
        let generation = my_generation.max(partner_generation) + 1;
        let egg_position = my_position.random_offset(EGG_LAY_OFFSET, &mut self.rng);
        self.spawn_egg(egg_position, child_genes, generation);

        let time = self.time;
        let incubation = self.config.incubation_ticks();
        for pair_id in [id, partner_id] {
            let c = self
                .entities
                .get_mut(pair_id)
                .and_then(Entity::as_creature_mut)
                .ok_or(SimError::MissingEntity(pair_id))?;
            c.begin_incubating(time, incubation);
        }
        Ok(())
    }

    /// Deaths and hatching. Eggs hatch into exactly one creature; a dead
    /// creature releases any surviving partner from the sequence.
    fn resolve_lifecycle(&mut self) {
        let expired: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, e)| e.is_expired())
            .map(|(id, _)| id)
            .collect();

        for id in expired {
            let Some(entity) = self.entities.get(id) else {
                continue;
            };

            match &entity.kind {
                EntityKind::Egg(egg) => {
                    let position = entity.position;
                    let genes = egg.child_genes;
                    let generation = egg.generation;
                    self.remove_entity(id);
                    self.spawn_creature(position, genes, generation);
                }
                EntityKind::Creature(c) => {
                    let partner_id = c.partner;
                    self.remove_entity(id);
                    self.deaths_this_tick += 1;

                    // Release a surviving partner stuck waiting on us
                    if let Some(partner_id) = partner_id {
                        if let Some(partner) = self
                            .entities
                            .get_mut(partner_id)
                            .and_then(Entity::as_creature_mut)
                        {
                            if partner.partner == Some(id) {
                                partner.reset_to_idle();
                            }
                        }
                    }
                }
                EntityKind::Fruit(_) => {
                    self.remove_entity(id);
                }
            }
        }
    }

    /// Drop an entity from the world, the index and the display
    fn remove_entity(&mut self, id: EntityId) {
        self.board.remove(id);
        self.entities.remove(id);
        self.presenter.entity_removed(id);
    }

    /// Per-cell fruit spawning, modulated by tile and equilibrium feedback
    fn spawn_ambient_fruit(&mut self) {
        let base = self.config.fruit.spawn_chance / f64::from(self.config.world.tps);

        for cell in 0..self.board.cell_count() {
            let tile = self.board.terrain().tile(cell);
            let chance = base * tile.effects().fruit_spawn_multiplier * self.fruit_multiplier;
            if chance > 0.0 && self.rng.gen::<f64>() < chance {
                self.spawn_fruit(Some(cell));
            }
        }
    }

    /// Fire ambient effects on a handful of random tiles each tick
    fn tick_tiles(&mut self) {
        let picks = (self.board.cell_count() / 100).max(1);
        for _ in 0..picks {
            let cell = self.rng.gen_range(0..self.board.cell_count());
            if let Some(effect) = self.board.terrain().tile(cell).tick_effect() {
                let at = self.board.random_position_in_cell(cell, &mut self.rng);
                match effect {
                    crate::terrain::TileTickEffect::Smoke => {
                        self.presenter.particle(ParticleKind::Smoke, at);
                    }
                }
            }
        }
    }

    /// Steer the fruit supply towards the configured population target
    fn update_fruit_multiplier(&mut self) {
        let creatures = self.census().creatures.max(1);
        let target = self.config.equilibrium.target as f64;
        self.fruit_multiplier = (target / creatures as f64).clamp(
            self.config.equilibrium.min_multiplier,
            self.config.equilibrium.max_multiplier,
        );
    }

    /// Record a population sample at the configured interval
    fn update_stats(&mut self) {
        let interval = self
            .config
            .world
            .secs_to_ticks(self.config.logging.sample_interval_secs)
            .max(1);
        if self.time % interval != 0 {
            return;
        }

        let census = self.census();
        let gene_pool = GenePool::sample(
            self.entities
                .values()
                .filter_map(|e| e.as_creature())
                .map(|c| &c.genes),
        );
        let sample = PopulationSample {
            time: self.time,
            creatures: census.creatures,
            fruit: census.fruit,
            eggs: census.eggs,
            generation_max: self.generation_max,
            fruit_multiplier: self.fruit_multiplier,
            gene_pool,
        };
        log::debug!("{}", sample.summary());
        self.history.record(sample);
    }
}
