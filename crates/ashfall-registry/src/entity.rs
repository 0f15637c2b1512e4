//! Entity identifiers and allocation.
//!
//! An [`EntityId`] packs a *generation* in the high 32 bits and a slot *index*
//! in the low 32 bits. A slot's generation is bumped when its entity is
//! removed, so an id held across a removal never resolves to whatever later
//! occupies the same slot.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity identifier.
///
/// Layout: `[generation: u32 | index: u32]`. Ordering follows the raw value,
/// which the simulation relies on for deterministic iteration and pair sorting.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// Slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// Generation of the slot when this id was handed out (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// IdAllocator
// ---------------------------------------------------------------------------

/// Hands out [`EntityId`]s and recycles released slots.
///
/// Released slots wait in a FIFO queue, so a slot is reused only after every
/// older free slot has been taken.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    /// Current generation per slot.
    generations: Vec<u32>,
    /// Occupancy per slot.
    live: Vec<bool>,
    /// Released slots in release order.
    free: VecDeque<u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id, reusing the oldest released slot if one exists.
    pub fn allocate(&mut self) -> EntityId {
        match self.free.pop_front() {
            Some(index) => {
                self.live[index as usize] = true;
                EntityId::new(index, self.generations[index as usize])
            }
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                self.live.push(true);
                EntityId::new(index, 0)
            }
        }
    }

    /// Claim a specific id, used when rebuilding a registry from existing
    /// entities. Fails if the slot is already live.
    pub fn claim(&mut self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        if idx >= self.generations.len() {
            let old_len = self.generations.len();
            self.generations.resize(idx + 1, 0);
            self.live.resize(idx + 1, false);
            self.free.extend((old_len..idx).map(|i| i as u32));
        }
        if self.live[idx] {
            return false;
        }
        self.free.retain(|&i| i as usize != idx);
        self.generations[idx] = id.generation();
        self.live[idx] = true;
        true
    }

    /// Release an id. Returns `false` for ids that are stale or not live.
    pub fn release(&mut self, id: EntityId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.live[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free.push_back(id.index());
        true
    }

    /// Whether `id` names a live slot at its current generation.
    pub fn is_live(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len() && self.live[idx] && self.generations[idx] == id.generation()
    }

    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|&&l| l).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
