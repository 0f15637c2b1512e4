//! Deferred removals from the [`Registry`].
//!
//! Passes never remove entities while the registry is being iterated.
//! They queue a [`Command`] instead, tagged with the issuing [`SystemId`] and a
//! [`CausalReason`], and the tick applies the buffer once every pass has run.
//!
//! # Example
//!
//! ```
//! use ashfall_registry::prelude::*;
//!
//! let mut registry = Registry::new();
//! let arrow = registry.spawn(Entity::projectile(0.0, 0.0, None, 5, 10));
//!
//! let mut cmds = CommandBuffer::new();
//! cmds.despawn(arrow, SystemId::COMBAT, CausalReason::GameRule("projectile_spent".to_owned()));
//! assert!(registry.contains(arrow));
//!
//! let applied = cmds.apply(&mut registry);
//! assert!(applied[0].applied_successfully);
//! assert!(!registry.contains(arrow));
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::EntityId;
use crate::registry::Registry;

// ---------------------------------------------------------------------------
// SystemId
// ---------------------------------------------------------------------------

/// Numeric tag for whoever issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SystemId(pub u32);

impl SystemId {
    /// Requests coming from outside the tick (host scripts, tests).
    pub const HOST: SystemId = SystemId(1);
    /// The combat pass: spent and expired projectiles.
    pub const COMBAT: SystemId = SystemId(40);
}

// ---------------------------------------------------------------------------
// CausalReason
// ---------------------------------------------------------------------------

/// Why a command was issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CausalReason {
    /// Contact between two entities.
    CollisionResponse(EntityId, EntityId),
    /// A named rule, e.g. a host-scripted exit.
    GameRule(String),
    /// A countdown ran out.
    Timer(String),
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One deferred removal plus where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub target: EntityId,
    pub issued_by: SystemId,
    pub reason: CausalReason,
    /// Position in the buffer at insertion time.
    pub command_index: u32,
    /// `false` until applied; stays `false` for commands against stale ids.
    #[serde(default)]
    pub applied_successfully: bool,
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

/// FIFO queue of deferred despawns.
///
/// Duplicate despawns of one entity are tolerated: the first applies, the rest
/// are reported as failed. Use [`despawn_pending`](Self::despawn_pending) to
/// avoid queueing them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    next_index: u32,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue removal of `target`.
    pub fn despawn(&mut self, target: EntityId, issued_by: SystemId, reason: CausalReason) {
        let index = self.next_index;
        self.next_index += 1;
        self.commands.push(Command {
            target,
            issued_by,
            reason,
            command_index: index,
            applied_successfully: false,
        });
    }

    /// Commands queued so far, in insertion order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether a despawn for `id` is already queued.
    pub fn despawn_pending(&self, id: EntityId) -> bool {
        self.commands.iter().any(|c| c.target == id)
    }

    /// Apply every queued command in insertion order and clear the buffer.
    ///
    /// Commands against ids that are no longer live are skipped with a
    /// warning and returned with `applied_successfully == false`.
    pub fn apply(&mut self, registry: &mut Registry) -> Vec<Command> {
        let mut commands = std::mem::take(&mut self.commands);
        self.next_index = 0;

        for cmd in &mut commands {
            match registry.despawn(cmd.target) {
                Ok(_) => {
                    cmd.applied_successfully = true;
                    debug!(
                        target = %cmd.target,
                        system_id = cmd.issued_by.0,
                        reason = ?cmd.reason,
                        "despawned"
                    );
                }
                Err(e) => {
                    warn!(
                        command_index = cmd.command_index,
                        target = %cmd.target,
                        system_id = cmd.issued_by.0,
                        error = %e,
                        "despawn skipped"
                    );
                }
            }
        }

        commands
    }

    /// Drop every queued command without applying it.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.next_index = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Entity;

    fn rule(name: &str) -> CausalReason {
        CausalReason::GameRule(name.to_owned())
    }

    #[test]
    fn despawn_is_deferred_until_apply() {
        let mut reg = Registry::new();
        let e = reg.spawn(Entity::enemy(0.0, 0.0));
        let mut cmds = CommandBuffer::new();
        cmds.despawn(e, SystemId::COMBAT, rule("test"));
        assert!(cmds.despawn_pending(e));
        assert!(reg.contains(e));

        let applied = cmds.apply(&mut reg);
        assert_eq!(applied.len(), 1);
        assert!(applied[0].applied_successfully);
        assert!(!reg.contains(e));
        assert!(cmds.is_empty());
    }

    #[test]
    fn duplicate_despawn_only_applies_once() {
        let mut reg = Registry::new();
        let e = reg.spawn(Entity::enemy(0.0, 0.0));
        let mut cmds = CommandBuffer::new();
        cmds.despawn(e, SystemId::COMBAT, rule("hit"));
        cmds.despawn(e, SystemId::HOST, rule("expired"));

        let applied = cmds.apply(&mut reg);
        assert!(applied[0].applied_successfully);
        assert!(!applied[1].applied_successfully);
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn stale_target_is_reported_not_applied() {
        let mut reg = Registry::new();
        let e = reg.spawn(Entity::enemy(0.0, 0.0));
        reg.despawn(e).unwrap();
        let mut cmds = CommandBuffer::new();
        cmds.despawn(e, SystemId::HOST, rule("late"));

        let applied = cmds.apply(&mut reg);
        assert!(!applied[0].applied_successfully);
        assert_eq!(applied[0].reason, rule("late"));
    }

    #[test]
    fn command_indices_follow_insertion_order() {
        let mut reg = Registry::new();
        let a = reg.spawn(Entity::enemy(0.0, 0.0));
        let b = reg.spawn(Entity::enemy(0.0, 0.0));
        let mut cmds = CommandBuffer::new();
        cmds.despawn(b, SystemId::COMBAT, rule("first"));
        cmds.despawn(a, SystemId::COMBAT, rule("second"));
        let idx: Vec<u32> = cmds.commands().iter().map(|c| c.command_index).collect();
        assert_eq!(idx, vec![0, 1]);
        let applied = cmds.apply(&mut reg);
        assert_eq!(applied[0].target, b);
    }
}
