//! Ashfall Registry -- entity storage for the Ashfall simulation core.
//!
//! Every simulated actor is a single [`Entity`](components::Entity) whose
//! capabilities (physics body, AI, stamina, boss phases, projectile payload)
//! are optional components. The [`Registry`](registry::Registry) owns entity
//! lifetime, hands out generational [`EntityId`](entity::EntityId)s, and
//! removes entities only when asked to, either through
//! [`Registry::prune_dead`](registry::Registry::prune_dead) or a deferred
//! [`CommandBuffer`](command::CommandBuffer).
//!
//! # Quick Start
//!
//! ```
//! use ashfall_registry::prelude::*;
//!
//! let mut registry = Registry::new();
//! let player = registry.spawn(Entity::player(0.0, 0.0).with_health(100));
//! let enemy = registry.spawn(Entity::enemy(40.0, 0.0).with_health(20));
//!
//! registry.get_mut(enemy).unwrap().health.as_mut().unwrap().take_damage(25);
//! assert!(registry.get(enemy).unwrap().is_dead());
//!
//! assert_eq!(registry.prune_dead(), vec![enemy]);
//! assert!(registry.contains(player));
//! assert!(registry.get(enemy).is_none());
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod components;
pub mod entity;
pub mod registry;
pub mod snapshot;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The id is stale (its slot was recycled) or was never allocated.
    #[error("entity {id:?} does not exist (stale or never allocated)")]
    StaleEntity { id: entity::EntityId },

    /// Two entities claimed the same slot while building a registry.
    #[error("duplicate entity id {id:?}")]
    DuplicateId { id: entity::EntityId },
}

/// Errors produced while encoding or decoding snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to deserialize snapshot: {0}")]
    Deserialize(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::command::{CausalReason, Command, CommandBuffer, SystemId};
    pub use crate::components::{
        Aabb, AiIntent, Body, BossPhaseState, EnemyBehavior, Entity, EntityKind, Facing, Health,
        PhysicsBody, Progression, Projectile, ResourcePool,
    };
    pub use crate::entity::{EntityId, IdAllocator};
    pub use crate::registry::Registry;
    pub use crate::snapshot::{RestoreReport, SaveSnapshot, SavedEntity};
    pub use crate::{RegistryError, SnapshotError};
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn spawn_mark_and_prune_in_one_batch() {
        let mut registry = Registry::new();
        let a = registry.spawn(Entity::enemy(0.0, 0.0).with_health(10));
        let b = registry.spawn(Entity::enemy(0.0, 0.0).with_health(10));

        // Mark both, remove one via the command buffer.
        for id in [a, b] {
            registry.get_mut(id).unwrap().health.as_mut().unwrap().hp = 0;
        }
        let mut cmds = CommandBuffer::new();
        cmds.despawn(a, SystemId::COMBAT, CausalReason::GameRule("test".to_owned()));
        cmds.apply(&mut registry);

        // Still queryable until the prune.
        assert!(registry.contains(b));
        assert_eq!(registry.prune_dead(), vec![b]);
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_serde_round_trip_preserves_ids() {
        let mut registry = Registry::new();
        let a = registry.spawn(Entity::player(1.0, 1.0));
        let b = registry.spawn(Entity::enemy(2.0, 2.0));
        registry.despawn(a).unwrap();

        let json = serde_json::to_string(&registry).unwrap();
        let mut restored: Registry = serde_json::from_str(&json).unwrap();
        assert!(restored.get(a).is_none());
        assert_eq!(restored.get(b).unwrap().body.x, 2.0);

        // Allocation continues exactly as it would have on the original.
        let next_original = registry.spawn(Entity::enemy(0.0, 0.0));
        let next_restored = restored.spawn(Entity::enemy(0.0, 0.0));
        assert_eq!(next_original, next_restored);
    }

    #[test]
    fn stale_entity_error_formats_id() {
        let mut registry = Registry::new();
        let id = registry.spawn(Entity::enemy(0.0, 0.0));
        registry.despawn(id).unwrap();
        let err = registry.despawn(id).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
