//! Melee and projectile hit resolution.
//!
//! Damage never removes anything. A target brought to zero hp stays in the
//! registry, still queryable and still hittable, until the end-of-tick prune.

use ashfall_registry::command::{CausalReason, CommandBuffer, SystemId};
use ashfall_registry::components::{Aabb, Entity};
use ashfall_registry::entity::EntityId;
use ashfall_registry::registry::Registry;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::collision::CollisionPair;
use crate::config::SimConfig;
use crate::particles::ParticleEmitter;
use crate::physics;

/// System name used in tick diagnostics.
pub const COMBAT_SYSTEM_NAME: &str = "combat";

/// One landed hit. Lives for a single tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub attacker: EntityId,
    pub target: EntityId,
    pub damage: i32,
    /// Centre of the target at impact.
    pub hit_position: (f64, f64),
}

/// Result of a single melee swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// The attacker id no longer resolves.
    NoAttacker,
    /// Not enough stamina; nothing was changed.
    Exhausted,
    /// The swing happened. `hits` may be zero.
    Swung { hits: usize },
}

/// Hitbox of a melee swing: centred on the attacker, pushed `reach` units
/// along its facing.
pub fn melee_hitbox(attacker: &Entity, config: &SimConfig) -> Aabb {
    let (cx, cy) = attacker.body.center();
    let hx = cx + attacker.facing.sign() * config.combat.reach;
    Aabb {
        x: hx - config.combat.hitbox_w * 0.5,
        y: cy - config.combat.hitbox_h * 0.5,
        w: config.combat.hitbox_w,
        h: config.combat.hitbox_h,
    }
}

/// Resolve one melee swing by `attacker`.
///
/// Stamina is checked before anything is touched. Every other entity with
/// health inside the hitbox is hit exactly once.
pub fn attack(
    registry: &mut Registry,
    attacker: EntityId,
    config: &SimConfig,
    emitter: &mut ParticleEmitter,
    events: &mut Vec<CombatEvent>,
) -> AttackOutcome {
    let cost = config.combat.stamina_cost;

    let Some(source) = registry.get_mut(attacker) else {
        trace!(attacker = %attacker, "attack from missing entity skipped");
        return AttackOutcome::NoAttacker;
    };

    if cost > 0.0 {
        let paid = source.stamina.as_mut().is_some_and(|pool| pool.try_spend(cost));
        if !paid {
            trace!(attacker = %attacker, cost, "attack refused, not enough stamina");
            return AttackOutcome::Exhausted;
        }
    }

    let hitbox = melee_hitbox(source, config);
    let damage = source.attack_power.max(0);
    let facing = source.facing.sign();

    let targets: Vec<EntityId> = registry
        .iter()
        .filter(|e| e.id != attacker && e.health.is_some())
        .filter(|e| hitbox.overlaps(&e.body.aabb()))
        .map(|e| e.id)
        .collect();

    for &target_id in &targets {
        let Some(target) = registry.get_mut(target_id) else {
            continue;
        };
        if let Some(health) = target.health.as_mut() {
            health.take_damage(damage);
        }
        let hit_position = target.body.center();
        physics::apply_impulse(
            target,
            facing * config.combat.knockback_x,
            config.combat.knockback_y,
        );

        emitter.spawn(
            hit_position.0,
            hit_position.1,
            &config.combat.hit_visual,
            config.particles.hit_burst,
        );
        events.push(CombatEvent {
            attacker,
            target: target_id,
            damage,
            hit_position,
        });
        debug!(attacker = %attacker, target = %target_id, damage, hp = ?target.hp(), "melee hit");
    }

    AttackOutcome::Swung {
        hits: targets.len(),
    }
}

/// Apply projectile contacts from this tick's overlap pairs, then age every
/// projectile.
///
/// A projectile damages the first non-owner entity with health it overlaps
/// and is queued for despawn. One that runs out of ticks is queued too.
pub fn resolve_projectiles(
    registry: &mut Registry,
    pairs: &[CollisionPair],
    config: &SimConfig,
    emitter: &mut ParticleEmitter,
    commands: &mut CommandBuffer,
    events: &mut Vec<CombatEvent>,
) {
    let mut spent: Vec<EntityId> = Vec::new();

    for pair in pairs {
        for (proj_id, target_id) in [
            (pair.entity_a, pair.entity_b),
            (pair.entity_b, pair.entity_a),
        ] {
            if spent.contains(&proj_id) || commands.despawn_pending(proj_id) {
                continue;
            }
            let Some(payload) = registry.get(proj_id).and_then(|e| e.projectile.clone()) else {
                continue;
            };
            if payload.owner == Some(target_id) {
                continue;
            }
            let Some(target) = registry.get_mut(target_id) else {
                continue;
            };
            let Some(health) = target.health.as_mut() else {
                continue;
            };

            let damage = payload.damage.max(0);
            health.take_damage(damage);
            let hit_position = target.body.center();

            emitter.spawn(
                hit_position.0,
                hit_position.1,
                &config.combat.hit_visual,
                config.particles.hit_burst,
            );
            events.push(CombatEvent {
                attacker: payload.owner.unwrap_or(proj_id),
                target: target_id,
                damage,
                hit_position,
            });
            spent.push(proj_id);
            commands.despawn(proj_id, SystemId::COMBAT, pair.reason());
            debug!(projectile = %proj_id, target = %target_id, damage, "projectile hit");
        }
    }

    for entity in registry.iter_mut() {
        let Some(payload) = entity.projectile.as_mut() else {
            continue;
        };
        payload.ticks_left = payload.ticks_left.saturating_sub(1);
        if payload.ticks_left == 0 && !spent.contains(&entity.id) && !commands.despawn_pending(entity.id) {
            commands.despawn(
                entity.id,
                SystemId::COMBAT,
                CausalReason::Timer("projectile_expired".to_owned()),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::detect_overlaps;
    use crate::config::ParticleConfig;
    use ashfall_registry::prelude::*;

    fn emitter() -> ParticleEmitter {
        ParticleEmitter::new(1, &ParticleConfig::default())
    }

    /// Player at (0, 0) facing right, enemy just inside reach.
    fn duel(enemy_hp: i32) -> (Registry, EntityId, EntityId) {
        let mut reg = Registry::new();
        let player = reg.spawn(
            Entity::player(0.0, 0.0)
                .with_health(100)
                .with_attack(12)
                .with_stamina(30.0, 0.0),
        );
        let enemy = reg.spawn(Entity::enemy(30.0, 0.0).with_health(enemy_hp));
        (reg, player, enemy)
    }

    #[test]
    fn hit_deducts_stamina_and_damages() {
        let (mut reg, player, enemy) = duel(20);
        let mut em = emitter();
        let mut events = Vec::new();

        let outcome = attack(&mut reg, player, &SimConfig::default(), &mut em, &mut events);

        assert_eq!(outcome, AttackOutcome::Swung { hits: 1 });
        assert_eq!(reg.get(enemy).unwrap().hp(), Some(8));
        assert_eq!(reg.get(player).unwrap().stamina.as_ref().unwrap().current, 20.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target, enemy);
        assert_eq!(em.len(), 8);
    }

    #[test]
    fn exhausted_attacker_changes_nothing() {
        let (mut reg, player, enemy) = duel(20);
        reg.get_mut(player).unwrap().stamina.as_mut().unwrap().current = 5.0;
        let mut em = emitter();
        let mut events = Vec::new();

        let outcome = attack(&mut reg, player, &SimConfig::default(), &mut em, &mut events);

        assert_eq!(outcome, AttackOutcome::Exhausted);
        assert_eq!(reg.get(enemy).unwrap().hp(), Some(20));
        assert_eq!(reg.get(player).unwrap().stamina.as_ref().unwrap().current, 5.0);
        assert!(events.is_empty());
        assert!(em.is_empty());
    }

    #[test]
    fn attacker_without_pool_is_exhausted_when_cost_is_set() {
        let mut reg = Registry::new();
        let grunt = reg.spawn(Entity::enemy(0.0, 0.0).with_attack(5));
        let outcome = attack(&mut reg, grunt, &SimConfig::default(), &mut emitter(), &mut Vec::new());
        assert_eq!(outcome, AttackOutcome::Exhausted);

        let mut free = SimConfig::default();
        free.combat.stamina_cost = 0.0;
        let outcome = attack(&mut reg, grunt, &free, &mut emitter(), &mut Vec::new());
        assert_eq!(outcome, AttackOutcome::Swung { hits: 0 });
    }

    #[test]
    fn missing_attacker_is_skipped() {
        let (mut reg, player, _) = duel(20);
        reg.despawn(player).unwrap();
        let outcome = attack(&mut reg, player, &SimConfig::default(), &mut emitter(), &mut Vec::new());
        assert_eq!(outcome, AttackOutcome::NoAttacker);
    }

    #[test]
    fn facing_away_misses() {
        let (mut reg, player, enemy) = duel(20);
        reg.get_mut(player).unwrap().facing = Facing::Left;
        let outcome = attack(&mut reg, player, &SimConfig::default(), &mut emitter(), &mut Vec::new());
        assert_eq!(outcome, AttackOutcome::Swung { hits: 0 });
        assert_eq!(reg.get(enemy).unwrap().hp(), Some(20));
    }

    #[test]
    fn damage_saturates_and_dead_targets_stay_until_prune() {
        let (mut reg, player, enemy) = duel(5);
        let mut events = Vec::new();
        attack(&mut reg, player, &SimConfig::default(), &mut emitter(), &mut events);
        assert_eq!(reg.get(enemy).unwrap().hp(), Some(0));

        // Still present and still hittable.
        let outcome = attack(&mut reg, player, &SimConfig::default(), &mut emitter(), &mut events);
        assert_eq!(outcome, AttackOutcome::Swung { hits: 1 });
        assert_eq!(reg.get(enemy).unwrap().hp(), Some(0));
        assert_eq!(reg.prune_dead(), vec![enemy]);
    }

    #[test]
    fn each_target_in_hitbox_is_hit_once() {
        let (mut reg, player, a) = duel(50);
        let b = reg.spawn(Entity::enemy(32.0, 4.0).with_health(50));
        let mut events = Vec::new();
        attack(&mut reg, player, &SimConfig::default(), &mut emitter(), &mut events);

        assert_eq!(reg.get(a).unwrap().hp(), Some(38));
        assert_eq!(reg.get(b).unwrap().hp(), Some(38));
        let targets: Vec<_> = events.iter().map(|e| e.target).collect();
        assert_eq!(targets, vec![a, b]);
    }

    #[test]
    fn knockback_pushes_physics_targets_along_facing() {
        let mut reg = Registry::new();
        let player = reg.spawn(Entity::player(0.0, 0.0).with_attack(1).with_stamina(30.0, 0.0));
        let heavy = reg.spawn(Entity::enemy(30.0, 0.0).with_health(50).with_physics(2.0));
        attack(&mut reg, player, &SimConfig::default(), &mut emitter(), &mut Vec::new());

        let body = &reg.get(heavy).unwrap().body;
        assert_eq!((body.vx, body.vy), (2.0, -1.0));
    }

    #[test]
    fn projectile_hits_non_owner_once_and_is_spent() {
        let mut reg = Registry::new();
        let archer = reg.spawn(Entity::enemy(0.0, 0.0).with_health(10));
        let player = reg.spawn(Entity::player(100.0, 0.0).with_health(100));
        let arrow = reg.spawn(Entity::projectile(105.0, 5.0, Some(archer), 7, 60));
        let pairs = detect_overlaps(&reg);

        let mut cmds = CommandBuffer::new();
        let mut events = Vec::new();
        resolve_projectiles(&mut reg, &pairs, &SimConfig::default(), &mut emitter(), &mut cmds, &mut events);
        resolve_projectiles(&mut reg, &pairs, &SimConfig::default(), &mut emitter(), &mut cmds, &mut events);

        assert_eq!(reg.get(player).unwrap().hp(), Some(93));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].attacker, archer);
        assert_eq!(cmds.len(), 1);
        cmds.apply(&mut reg);
        assert!(!reg.contains(arrow));
    }

    #[test]
    fn projectile_ignores_its_owner() {
        let mut reg = Registry::new();
        let archer = reg.spawn(Entity::enemy(0.0, 0.0).with_health(10));
        reg.spawn(Entity::projectile(2.0, 2.0, Some(archer), 7, 60));
        let pairs = detect_overlaps(&reg);
        assert_eq!(pairs.len(), 1);

        let mut cmds = CommandBuffer::new();
        resolve_projectiles(&mut reg, &pairs, &SimConfig::default(), &mut emitter(), &mut cmds, &mut Vec::new());
        assert_eq!(reg.get(archer).unwrap().hp(), Some(10));
        assert!(cmds.is_empty());
    }

    #[test]
    fn projectile_expires_after_its_ticks() {
        let mut reg = Registry::new();
        let arrow = reg.spawn(Entity::projectile(0.0, 0.0, None, 7, 2));
        let mut cmds = CommandBuffer::new();

        resolve_projectiles(&mut reg, &[], &SimConfig::default(), &mut emitter(), &mut cmds, &mut Vec::new());
        assert!(cmds.is_empty());
        resolve_projectiles(&mut reg, &[], &SimConfig::default(), &mut emitter(), &mut cmds, &mut Vec::new());
        assert!(cmds.despawn_pending(arrow));
    }
}
