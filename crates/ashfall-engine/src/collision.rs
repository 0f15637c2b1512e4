//! Entity-vs-world resolution and entity-vs-entity overlap detection.
//!
//! World collision is authoritative: it moves bodies out of solid tiles and
//! owns the `grounded` flag. Entity overlap is advisory: pairs are reported,
//! never separated, and whoever consumes them (combat, knockback) decides the
//! response. Overlapping entities may stay overlapped across ticks.

use ashfall_registry::command::CausalReason;
use ashfall_registry::components::Entity;
use ashfall_registry::entity::EntityId;
use ashfall_registry::registry::Registry;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Map collaborator
// ---------------------------------------------------------------------------

/// Read-only view of the static world.
///
/// Out-of-range cells, including negative coordinates, must answer `false`.
pub trait SolidQuery {
    fn solid_at(&self, cell_x: i64, cell_y: i64) -> bool;
    /// Edge length of a square cell in world units.
    fn tile_size(&self) -> f64;
}

/// Dense row-major grid of solid flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f64,
    cells: Vec<bool>,
}

impl TileGrid {
    /// An empty (all air) grid.
    pub fn new(width: usize, height: usize, tile_size: f64) -> Self {
        Self {
            width,
            height,
            tile_size,
            cells: vec![false; width * height],
        }
    }

    /// Build from rows where non-zero means solid. Short rows are padded with
    /// air to the longest row.
    pub fn from_rows(rows: &[Vec<u8>], tile_size: f64) -> Self {
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Self::new(width, height, tile_size);
        for (y, row) in rows.iter().enumerate() {
            for (x, &cell) in row.iter().enumerate() {
                grid.cells[y * width + x] = cell != 0;
            }
        }
        grid
    }

    /// Set one cell. Out-of-range writes are ignored.
    pub fn set_solid(&mut self, cell_x: usize, cell_y: usize, solid: bool) {
        if cell_x < self.width && cell_y < self.height {
            self.cells[cell_y * self.width + cell_x] = solid;
        }
    }

    /// Fill a full row, handy for floors.
    pub fn fill_row(&mut self, cell_y: usize) {
        for x in 0..self.width {
            self.set_solid(x, cell_y, true);
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

impl SolidQuery for TileGrid {
    fn solid_at(&self, cell_x: i64, cell_y: i64) -> bool {
        if cell_x < 0 || cell_y < 0 {
            return false;
        }
        let (x, y) = (cell_x as usize, cell_y as usize);
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y * self.width + x]
    }

    fn tile_size(&self) -> f64 {
        self.tile_size
    }
}

// ---------------------------------------------------------------------------
// World collision
// ---------------------------------------------------------------------------

/// Cell containing a world point. `None` for non-finite input or a degenerate
/// tile size.
pub fn cell_of(x: f64, y: f64, tile_size: f64) -> Option<(i64, i64)> {
    if !(tile_size.is_finite() && tile_size > 0.0 && x.is_finite() && y.is_finite()) {
        return None;
    }
    Some(((x / tile_size).floor() as i64, (y / tile_size).floor() as i64))
}

/// Rest physics bodies on solid tiles and refresh their `grounded` flag.
///
/// The probe point is the bottom-centre of the box. When it lies in a solid
/// cell the body is snapped so its bottom edge sits on the cell's top edge and
/// any downward velocity is cancelled. With no map every body is ungrounded
/// and nothing moves.
pub fn resolve_world(registry: &mut Registry, map: Option<&dyn SolidQuery>) {
    for entity in registry.iter_mut() {
        let Some(physics) = entity.physics.as_mut() else {
            continue;
        };
        let Some(map) = map else {
            physics.grounded = false;
            continue;
        };

        let body = &mut entity.body;
        let ts = map.tile_size();
        let probe = cell_of(body.x + body.w * 0.5, body.y + body.h, ts);

        match probe {
            Some((cx, cy)) if map.solid_at(cx, cy) => {
                if body.vy > 0.0 {
                    body.vy = 0.0;
                }
                body.y = cy as f64 * ts - body.h;
                physics.grounded = true;
            }
            _ => physics.grounded = false,
        }
    }
}

// ---------------------------------------------------------------------------
// Entity overlap
// ---------------------------------------------------------------------------

/// Strict AABB overlap of two entities' boxes.
pub fn overlaps(a: &Entity, b: &Entity) -> bool {
    a.body.aabb().overlaps(&b.body.aabb())
}

/// Two entities whose boxes overlap this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionPair {
    /// The smaller id of the two.
    pub entity_a: EntityId,
    pub entity_b: EntityId,
}

impl CollisionPair {
    pub fn involves(&self, id: EntityId) -> bool {
        self.entity_a == id || self.entity_b == id
    }

    /// The other member of the pair, if `id` is one of them.
    pub fn other(&self, id: EntityId) -> Option<EntityId> {
        if self.entity_a == id {
            Some(self.entity_b)
        } else if self.entity_b == id {
            Some(self.entity_a)
        } else {
            None
        }
    }

    /// Causal tag for commands issued because of this contact.
    pub fn reason(&self) -> CausalReason {
        CausalReason::CollisionResponse(self.entity_a, self.entity_b)
    }
}

/// Report every overlapping pair, sorted by `(min id, max id)`.
pub fn detect_overlaps(registry: &Registry) -> Vec<CollisionPair> {
    let entities: Vec<&Entity> = registry.iter().collect();
    let mut pairs = Vec::new();
    for (i, a) in entities.iter().enumerate() {
        for b in &entities[i + 1..] {
            if overlaps(a, b) {
                let (lo, hi) = if a.id <= b.id { (a.id, b.id) } else { (b.id, a.id) };
                pairs.push(CollisionPair {
                    entity_a: lo,
                    entity_b: hi,
                });
            }
        }
    }
    pairs.sort_by_key(|p| (p.entity_a, p.entity_b));
    pairs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
