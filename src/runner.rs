//! Fixed-rate game loop driving a [`World`] in real time.
//!
//! The loop targets a fixed number of ticks per second. Timewarp divides
//! the inter-tick delay, never the per-tick work, so a warped run computes
//! the exact same simulation faster. When a tick overruns its slot the
//! loop drops the accumulated debt instead of bursting to catch up.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::SimError;
use crate::world::World;

/// Callback invoked after every tick with the freshly stepped world
pub type RenderListener = Box<dyn FnMut(&World)>;

pub struct GameLoop {
    tps: u32,
    timewarp: f64,
    listeners: Vec<(String, RenderListener)>,
}

impl GameLoop {
    pub fn new(tps: u32) -> Self {
        assert!(tps > 0, "tps must be positive");
        Self {
            tps,
            timewarp: 1.0,
            listeners: Vec::new(),
        }
    }

    pub fn tps(&self) -> u32 {
        self.tps
    }

    pub fn timewarp(&self) -> f64 {
        self.timewarp
    }

    /// Speed the loop up or down. Clamped to a sane range.
    pub fn set_timewarp(&mut self, timewarp: f64) {
        self.timewarp = timewarp.clamp(0.1, 64.0);
    }

    /// Register a named render listener, replacing any existing listener
    /// with the same name
    pub fn add_listener<S: Into<String>>(&mut self, name: S, listener: RenderListener) {
        let name = name.into();
        self.listeners.retain(|(n, _)| *n != name);
        self.listeners.push((name, listener));
    }

    /// Remove a named render listener
    pub fn remove_listener(&mut self, name: &str) -> Result<(), SimError> {
        let before = self.listeners.len();
        self.listeners.retain(|(n, _)| n != name);
        if self.listeners.len() == before {
            return Err(SimError::ListenerNotFound(name.to_string()));
        }
        Ok(())
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / (f64::from(self.tps) * self.timewarp))
    }

    /// Step the world once and notify every listener
    pub fn tick(&mut self, world: &mut World) {
        world.step();
        for (_, listener) in &mut self.listeners {
            listener(world);
        }
    }

    /// Run at the configured rate for a fixed number of ticks
    pub fn run_for(&mut self, world: &mut World, ticks: u64) {
        let mut next = Instant::now();
        for _ in 0..ticks {
            self.tick(world);

            next += self.tick_interval();
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            } else {
                // Overran the slot; restart the schedule from here
                next = now;
            }
        }
    }

    /// Run until the creature population dies out or `max_ticks` elapse
    pub fn run_until_extinct(&mut self, world: &mut World, max_ticks: u64) {
        let mut next = Instant::now();
        for _ in 0..max_ticks {
            if world.is_extinct() {
                log::info!("population extinct at tick {}", world.time);
                return;
            }
            self.tick(world);

            next += self.tick_interval();
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            } else {
                next = now;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::terrain::{TerrainMap, TileKind};
    use std::cell::Cell;
    use std::rc::Rc;

    fn test_world() -> World {
        let config = Config::default();
        let terrain = TerrainMap::uniform(config.world.width, config.world.height, TileKind::Grass);
        World::new_with_seed(config, terrain, 1)
    }

    #[test]
    fn test_listener_called_each_tick() {
        let mut world = test_world();
        let mut game_loop = GameLoop::new(20);
        game_loop.set_timewarp(64.0);

        let calls = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&calls);
        game_loop.add_listener(
            "counter",
            Box::new(move |_| counter.set(counter.get() + 1)),
        );

        game_loop.run_for(&mut world, 10);
        assert_eq!(calls.get(), 10);
        assert_eq!(world.time, 10);
    }

    #[test]
    fn test_add_listener_replaces_same_name() {
        let mut game_loop = GameLoop::new(20);
        game_loop.add_listener("hud", Box::new(|_| {}));
        game_loop.add_listener("hud", Box::new(|_| {}));

        assert!(game_loop.remove_listener("hud").is_ok());
        assert!(matches!(
            game_loop.remove_listener("hud"),
            Err(SimError::ListenerNotFound(_))
        ));
    }

    #[test]
    fn test_remove_unknown_listener_errors() {
        let mut game_loop = GameLoop::new(20);
        let err = game_loop.remove_listener("ghost").unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_timewarp_clamped() {
        let mut game_loop = GameLoop::new(20);
        game_loop.set_timewarp(1000.0);
        assert_eq!(game_loop.timewarp(), 64.0);
        game_loop.set_timewarp(0.0);
        assert_eq!(game_loop.timewarp(), 0.1);
    }
}
