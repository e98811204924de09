//! Presentation seam between the simulation core and any front end.
//!
//! The core never draws. It reports entity lifecycle events and cosmetic
//! particles through this trait and asks it which entity, if any, the user
//! is inspecting. A headless run plugs in [`NullPresenter`].

use crate::entity::EntityId;
use crate::vector::Vec2;

/// Cosmetic particle kinds emitted by the simulation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleKind {
    /// Emitted over mating pairs
    Heart,
    /// Vented by lava tiles
    Smoke,
}

/// Receiver for simulation display events.
///
/// Every method has a no-op default so a presenter only implements what it
/// cares about.
pub trait Presenter {
    fn entity_created(&mut self, _id: EntityId, _position: Vec2) {}

    fn entity_moved(&mut self, _id: EntityId, _position: Vec2) {}

    fn entity_removed(&mut self, _id: EntityId) {}

    /// A cosmetic particle to spawn at a position
    fn particle(&mut self, _kind: ParticleKind, _position: Vec2) {}

    /// The entity the user is currently inspecting, if any. Inspected
    /// creatures surface extra per-tick detail in the logs.
    fn inspected(&self) -> Option<EntityId> {
        None
    }
}

/// Presenter that ignores everything; used by headless runs and tests
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
