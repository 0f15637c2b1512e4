//! The entity registry: sole owner of entity lifetime.
//!
//! Entities live in slots indexed by [`EntityId::index`]. Lookups check the
//! generation, so a stale id simply resolves to `None`. Iteration always runs
//! in slot order, which keeps every pass deterministic.
//!
//! Removal during a tick is deferred: passes mark work in a
//! [`CommandBuffer`](crate::command::CommandBuffer) or leave dead entities in
//! place, and [`Registry::prune_dead`] removes them once the tick is over.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::Entity;
use crate::entity::{EntityId, IdAllocator};
use crate::RegistryError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    allocator: IdAllocator,
    slots: Vec<Option<Entity>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from entities that already carry ids.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateId`] if two entities share a slot.
    pub fn from_entities(entities: Vec<Entity>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for entity in entities {
            let id = entity.id;
            if !registry.allocator.claim(id) {
                return Err(RegistryError::DuplicateId { id });
            }
            let idx = id.index() as usize;
            if registry.slots.len() <= idx {
                registry.slots.resize_with(idx + 1, || None);
            }
            registry.slots[idx] = Some(entity);
        }
        Ok(registry)
    }

    /// Insert `entity`, assigning it a fresh id.
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        let id = self.allocator.allocate();
        entity.id = id;
        let idx = id.index() as usize;
        if self.slots.len() <= idx {
            self.slots.resize_with(idx + 1, || None);
        }
        self.slots[idx] = Some(entity);
        id
    }

    /// Remove an entity immediately and return it.
    ///
    /// Systems should not call this mid-tick; queue a despawn instead.
    pub fn despawn(&mut self, id: EntityId) -> Result<Entity, RegistryError> {
        if !self.allocator.release(id) {
            return Err(RegistryError::StaleEntity { id });
        }
        self.slots[id.index() as usize]
            .take()
            .ok_or(RegistryError::StaleEntity { id })
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.index() as usize)?
            .as_ref()
            .filter(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index() as usize)?
            .as_mut()
            .filter(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.allocator.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Ids of live entities in slot order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|e| e.id).collect()
    }

    /// Remove every entity whose health is depleted. Returns the removed ids
    /// in slot order.
    pub fn prune_dead(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self.iter().filter(|e| e.is_dead()).map(|e| e.id).collect();
        for &id in &dead {
            if self.despawn(id).is_ok() {
                debug!(entity = %id, "pruned depleted entity");
            }
        }
        dead
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
