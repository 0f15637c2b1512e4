//! Save-game snapshots of persistent entity fields.
//!
//! A [`SaveSnapshot`] carries only what a save file needs (position, hp,
//! stamina, level and souls) keyed by entity id. The on-disk format is the
//! caller's business; the snapshot just derives serde traits.
//!
//! Restoring never breaks registry invariants: hp is clamped into
//! `[0, max_hp]`, stamina into `[0, max]`, and entries for ids that are no
//! longer live are skipped and counted.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::EntityId;
use crate::registry::Registry;
use crate::SnapshotError;

/// Persistent fields of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntity {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamina: Option<f64>,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub souls: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    pub entities: Vec<SavedEntity>,
}

/// Outcome of [`Registry::restore_save`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    /// Entries whose id no longer names a live entity.
    pub skipped: usize,
    /// Entries whose hp or stamina had to be clamped.
    pub clamped: usize,
}

impl SaveSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Serialize)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(SnapshotError::Deserialize)
    }
}

impl Registry {
    /// Capture the persistent fields of every live entity.
    pub fn capture_save(&self) -> SaveSnapshot {
        SaveSnapshot {
            entities: self
                .iter()
                .map(|e| SavedEntity {
                    id: e.id,
                    x: e.body.x,
                    y: e.body.y,
                    hp: e.hp(),
                    stamina: e.stamina.as_ref().map(|s| s.current),
                    level: e.progression.level,
                    souls: e.progression.souls,
                })
                .collect(),
        }
    }

    /// Write saved fields back onto live entities.
    ///
    /// Call between ticks. Fields the entity has no component for (hp on an
    /// entity without health, for instance) are ignored.
    pub fn restore_save(&mut self, snapshot: &SaveSnapshot) -> RestoreReport {
        let mut report = RestoreReport::default();

        for saved in &snapshot.entities {
            let Some(entity) = self.get_mut(saved.id) else {
                warn!(entity = %saved.id, "save entry for unknown entity skipped");
                report.skipped += 1;
                continue;
            };

            let mut clamped = false;
            entity.body.x = saved.x;
            entity.body.y = saved.y;
            entity.progression.level = saved.level;
            entity.progression.souls = saved.souls;

            if let (Some(hp), Some(health)) = (saved.hp, entity.health.as_mut()) {
                let value = hp.clamp(0, health.max_hp);
                clamped |= value != hp;
                health.hp = value;
            }
            if let (Some(stamina), Some(pool)) = (saved.stamina, entity.stamina.as_mut()) {
                let value = if stamina.is_finite() {
                    stamina.clamp(0.0, pool.max)
                } else {
                    0.0
                };
                clamped |= value != stamina;
                pool.current = value;
            }

            if clamped {
                report.clamped += 1;
            }
            report.restored += 1;
        }

        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
