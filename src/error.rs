//! Simulation error taxonomy.

use thiserror::Error;

use crate::entity::EntityId;

/// Errors surfaced by the simulation core.
///
/// Misconfiguration (empty random ranges, mismatched terrain maps) fails
/// fast with a panic instead; these variants cover runtime lookups where
/// the caller can meaningfully react.
#[derive(Debug, Error)]
pub enum SimError {
    /// An operation referenced an entity that no longer exists
    #[error("no entity with id {0:?} exists")]
    MissingEntity(EntityId),

    /// Tried to remove a render listener that was never registered.
    /// Surfaced as an error rather than a silent no-op to catch
    /// integration bugs early.
    #[error("no render listener named '{0}' is registered")]
    ListenerNotFound(String),
}
