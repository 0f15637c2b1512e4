//! Property tests for registry operations.
//!
//! Random sequences of spawns, despawns, damage and prunes must keep the
//! registry consistent with a simple shadow model.

use ashfall_registry::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum RegOp {
    Spawn(i32),
    Despawn(usize),
    Damage(usize, i32),
    Prune,
}

fn reg_op_strategy() -> impl Strategy<Value = RegOp> {
    prop_oneof![
        (1..200i32).prop_map(RegOp::Spawn),
        (0..100usize).prop_map(RegOp::Despawn),
        (0..100usize, 0..300i32).prop_map(|(i, d)| RegOp::Damage(i, d)),
        Just(RegOp::Prune),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn random_ops_preserve_invariants(ops in prop::collection::vec(reg_op_strategy(), 1..60)) {
        let mut registry = Registry::new();
        let mut alive: Vec<EntityId> = Vec::new();
        let mut removed: Vec<EntityId> = Vec::new();

        for op in ops {
            match op {
                RegOp::Spawn(hp) => {
                    alive.push(registry.spawn(Entity::enemy(0.0, 0.0).with_health(hp)));
                }
                RegOp::Despawn(idx) => {
                    if !alive.is_empty() {
                        let id = alive.remove(idx % alive.len());
                        prop_assert!(registry.despawn(id).is_ok());
                        removed.push(id);
                    }
                }
                RegOp::Damage(idx, amount) => {
                    if !alive.is_empty() {
                        let id = alive[idx % alive.len()];
                        registry.get_mut(id).unwrap().health.as_mut().unwrap().take_damage(amount);
                    }
                }
                RegOp::Prune => {
                    let pruned = registry.prune_dead();
                    alive.retain(|id| !pruned.contains(id));
                    removed.extend(pruned);
                }
            }

            // hp never goes negative.
            for e in registry.iter() {
                prop_assert!(e.hp().unwrap() >= 0);
            }
            prop_assert_eq!(registry.len(), alive.len());
            for &id in &alive {
                prop_assert!(registry.contains(id));
            }
            // Removed ids never resolve again, even after their slot is reused.
            for &id in &removed {
                prop_assert!(registry.get(id).is_none());
            }
        }
    }

    #[test]
    fn overlap_is_symmetric(
        ax in -100i32..100, ay in -100i32..100, aw in 1i32..50, ah in 1i32..50,
        bx in -100i32..100, by in -100i32..100, bw in 1i32..50, bh in 1i32..50,
    ) {
        let a = Aabb { x: ax as f64, y: ay as f64, w: aw as f64, h: ah as f64 };
        let b = Aabb { x: bx as f64, y: by as f64, w: bw as f64, h: bh as f64 };
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        prop_assert!(a.overlaps(&a));
    }
}

#[test]
fn touching_edges_do_not_overlap() {
    let a = Aabb { x: 0.0, y: 0.0, w: 10.0, h: 10.0 };
    let right = Aabb { x: 10.0, y: 0.0, w: 10.0, h: 10.0 };
    let below = Aabb { x: 0.0, y: 10.0, w: 10.0, h: 10.0 };
    let corner = Aabb { x: 10.0, y: 10.0, w: 5.0, h: 5.0 };
    assert!(!a.overlaps(&right));
    assert!(!a.overlaps(&below));
    assert!(!a.overlaps(&corner));
    assert!(a.overlaps(&Aabb { x: 9.5, y: 9.5, w: 1.0, h: 1.0 }));
}
