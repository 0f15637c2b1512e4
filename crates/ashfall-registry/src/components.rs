//! The single [`Entity`] kind and its capability components.
//!
//! Capabilities are optional fields rather than subtypes: an entity is
//! physics-driven when [`Entity::physics`] is `Some`, AI-driven when
//! [`Entity::ai`] is `Some`, and a boss when its kind is
//! [`EnemyBehavior::Boss`] and it carries a [`BossPhaseState`].

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// Kinematics
// ---------------------------------------------------------------------------

/// Position, velocity, pending acceleration and bounding box.
///
/// `(x, y)` is the top-left corner of the box; `+y` points down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal velocity, per tick.
    pub vx: f64,
    /// Vertical velocity, per tick. Positive is downward.
    pub vy: f64,
    /// Acceleration accumulated this tick, cleared by the integrator.
    pub ax: f64,
    pub ay: f64,
    /// Box width.
    pub w: f64,
    /// Box height.
    pub h: f64,
}

impl Body {
    /// A resting body with its top-left corner at `(x, y)`.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            ax: 0.0,
            ay: 0.0,
            w,
            h,
        }
    }

    /// Centre of the box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// The box as a standalone [`Aabb`].
    pub fn aabb(&self) -> Aabb {
        Aabb {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

/// Axis-aligned box in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Aabb {
    /// Strict overlap: boxes that only share an edge do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

/// Marks an entity as driven by the physics integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    /// Always > 0; impulses are divided by it.
    mass: f64,
    /// Written only by the world collision pass.
    pub grounded: bool,
}

impl PhysicsBody {
    /// Non-positive or non-finite masses fall back to 1.
    pub fn with_mass(mass: f64) -> Self {
        let mass = if mass.is_finite() && mass > 0.0 { mass } else { 1.0 };
        Self {
            mass,
            grounded: false,
        }
    }

    /// Mass used to scale impulses. Never zero.
    pub fn mass(&self) -> f64 {
        self.mass
    }
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self::with_mass(1.0)
    }
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Hit points. An entity at `hp <= 0` is removed at the end of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub hp: i32,
    /// Upper bound for restores; also the base for boss thresholds.
    pub max_hp: i32,
}

impl Health {
    /// Full health. Negative maxima are clamped to zero.
    pub fn full(max_hp: i32) -> Self {
        let max_hp = max_hp.max(0);
        Self { hp: max_hp, max_hp }
    }

    /// Subtract `amount`, saturating at zero.
    pub fn take_damage(&mut self, amount: i32) {
        self.hp = self.hp.saturating_sub(amount).max(0);
    }

    /// `true` once hp has reached zero.
    pub fn is_depleted(&self) -> bool {
        self.hp <= 0
    }

    /// `hp / max_hp`, or 0 for a zero maximum.
    pub fn fraction(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        self.hp as f64 / self.max_hp as f64
    }
}

/// A bounded, regenerating budget that gates actions (stamina).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Always within `[0, max]` after [`regenerate`](Self::regenerate).
    pub current: f64,
    pub max: f64,
    /// Units restored per second of simulated time.
    pub regen_per_sec: f64,
}

impl ResourcePool {
    /// A pool that starts topped up.
    pub fn full(max: f64, regen_per_sec: f64) -> Self {
        Self {
            current: max,
            max,
            regen_per_sec,
        }
    }

    /// Spend `cost` if affordable. Leaves the pool untouched otherwise.
    pub fn try_spend(&mut self, cost: f64) -> bool {
        if self.current < cost {
            return false;
        }
        self.current -= cost;
        true
    }

    /// Restore `regen_per_sec * dt`, clamped to `[0, max]`.
    pub fn regenerate(&mut self, dt: f64) {
        self.current = (self.current + self.regen_per_sec * dt).clamp(0.0, self.max);
    }
}

/// Horizontal facing, `+1` right and `-1` left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    /// `1.0` for right, `-1.0` for left.
    pub fn sign(self) -> f64 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }

    /// Facing for a signed horizontal delta; `None` when the delta is zero.
    pub fn from_delta(dx: f64) -> Option<Self> {
        if dx > 0.0 {
            Some(Facing::Right)
        } else if dx < 0.0 {
            Some(Facing::Left)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

/// Enemy variants. Bosses also carry a [`BossPhaseState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyBehavior {
    Basic,
    Boss,
}

/// What an entity is. Capabilities live in the component fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy(EnemyBehavior),
    Projectile,
}

/// Reactive pursuit of the player at the entity's [`Entity::speed`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiIntent {
    /// Also chase along the vertical axis (flying enemies).
    pub pursue_vertical: bool,
}

/// Damage-on-contact payload. Projectiles are combat entities, not particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Never damaged by its own projectile.
    pub owner: Option<EntityId>,
    /// Damage dealt on the first contact.
    pub damage: i32,
    /// Ticks until expiry; the projectile is despawned at zero.
    pub ticks_left: u32,
}

/// Health-threshold-driven boss escalation.
///
/// `thresholds[i]` is the fraction of max hp below which phase `i + 2` is
/// entered. `visited[i]` records that the transition already fired, so it can
/// never fire again regardless of later hp changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossPhaseState {
    /// Starts at 1 and never decreases.
    pub current_phase: u8,
    /// Strictly descending fractions of max hp.
    pub thresholds: Vec<f64>,
    /// One multiplier per phase, `stat_multipliers[0]` for phase 1.
    pub stat_multipliers: Vec<f64>,
    /// Parallel to `thresholds`.
    pub visited: Vec<bool>,
    /// Attack power at phase 1, scaled by the phase multiplier.
    pub base_attack_power: i32,
    /// [`Entity::speed`] at phase 1, scaled by the phase multiplier.
    pub base_speed: f64,
}

impl BossPhaseState {
    /// Phase 1 with no threshold visited.
    pub fn new(
        thresholds: Vec<f64>,
        stat_multipliers: Vec<f64>,
        base_attack_power: i32,
        base_speed: f64,
    ) -> Self {
        let visited = vec![false; thresholds.len()];
        Self {
            current_phase: 1,
            thresholds,
            stat_multipliers,
            visited,
            base_attack_power,
            base_speed,
        }
    }

    /// Number of phases, including the starting one. Saturates at `u8::MAX`.
    pub fn phase_count(&self) -> u8 {
        u8::try_from(self.thresholds.len() + 1).unwrap_or(u8::MAX)
    }

    /// Multiplier for `phase`; phases without an entry reuse the last one.
    pub fn multiplier(&self, phase: u8) -> f64 {
        let idx = phase.saturating_sub(1) as usize;
        self.stat_multipliers
            .get(idx)
            .or_else(|| self.stat_multipliers.last())
            .copied()
            .unwrap_or(1.0)
    }
}

/// Counters the persistence layer cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    /// Character level.
    pub level: u32,
    /// Currency earned from kills.
    pub souls: u32,
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A simulated actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Assigned by the registry on spawn.
    pub id: EntityId,
    pub kind: EntityKind,
    pub body: Body,
    /// Present when gravity, friction and impulses apply.
    pub physics: Option<PhysicsBody>,
    /// Present when the entity can be damaged.
    pub health: Option<Health>,
    /// Damage dealt per melee hit.
    pub attack_power: i32,
    /// Gates melee swings and dodges.
    pub stamina: Option<ResourcePool>,
    /// Present when the entity pursues the player.
    pub ai: Option<AiIntent>,
    pub boss: Option<BossPhaseState>,
    pub projectile: Option<Projectile>,
    /// Side the melee hitbox is offset to.
    pub facing: Facing,
    /// Movement speed, per tick. Player intent and AI pursuit both move the
    /// entity at this speed; boss phases rescale it.
    pub speed: f64,
    /// Render tag (colour / sprite key). Opaque to the core.
    pub visual: String,
    pub progression: Progression,
}

impl Entity {
    /// A bare entity of `kind` with a box at `(x, y)` and no capabilities.
    pub fn new(kind: EntityKind, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            id: EntityId::new(0, 0),
            kind,
            body: Body::new(x, y, w, h),
            physics: None,
            health: None,
            attack_power: 0,
            stamina: None,
            ai: None,
            boss: None,
            projectile: None,
            facing: Facing::Right,
            speed: 0.0,
            visual: String::new(),
            progression: Progression::default(),
        }
    }

    /// A 20x20 player with no capabilities yet.
    pub fn player(x: f64, y: f64) -> Self {
        let mut e = Self::new(EntityKind::Player, x, y, 20.0, 20.0);
        e.visual = "#0f0".to_owned();
        e
    }

    /// An 18x18 basic enemy with no capabilities yet.
    pub fn enemy(x: f64, y: f64) -> Self {
        let mut e = Self::new(EntityKind::Enemy(EnemyBehavior::Basic), x, y, 18.0, 18.0);
        e.visual = "#c33".to_owned();
        e
    }

    /// A boss with default phase thresholds at 50% and 33% of max hp.
    pub fn boss(x: f64, y: f64, max_hp: i32, attack_power: i32, speed: f64) -> Self {
        let mut e = Self::new(EntityKind::Enemy(EnemyBehavior::Boss), x, y, 48.0, 48.0);
        e.visual = "#a0f".to_owned();
        e.health = Some(Health::full(max_hp));
        e.attack_power = attack_power;
        e.speed = speed;
        e.ai = Some(AiIntent::default());
        e.boss = Some(BossPhaseState::new(
            vec![0.5, 0.33],
            vec![1.0, 1.5, 2.0],
            attack_power,
            speed,
        ));
        e
    }

    /// A 6x6 projectile dealing `damage` on contact, expiring after `ticks`.
    pub fn projectile(x: f64, y: f64, owner: Option<EntityId>, damage: i32, ticks: u32) -> Self {
        let mut e = Self::new(EntityKind::Projectile, x, y, 6.0, 6.0);
        e.visual = "#fa0".to_owned();
        e.projectile = Some(Projectile {
            owner,
            damage,
            ticks_left: ticks,
        });
        e
    }

    // -- builder-style setters ----------------------------------------------

    pub fn with_health(mut self, max_hp: i32) -> Self {
        self.health = Some(Health::full(max_hp));
        self
    }

    pub fn with_attack(mut self, attack_power: i32) -> Self {
        self.attack_power = attack_power;
        self
    }

    pub fn with_stamina(mut self, max: f64, regen_per_sec: f64) -> Self {
        self.stamina = Some(ResourcePool::full(max, regen_per_sec));
        self
    }

    pub fn with_physics(mut self, mass: f64) -> Self {
        self.physics = Some(PhysicsBody::with_mass(mass));
        self
    }

    /// Hand the entity to AI pursuit at `speed`.
    pub fn with_ai(mut self, speed: f64) -> Self {
        self.speed = speed;
        self.ai = Some(AiIntent::default());
        self
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.body.vx = vx;
        self.body.vy = vy;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    // -- queries ------------------------------------------------------------

    /// Current hp, `None` without a [`Health`] component.
    pub fn hp(&self) -> Option<i32> {
        self.health.as_ref().map(|h| h.hp)
    }

    /// Whether the end-of-tick prune will remove this entity.
    pub fn is_dead(&self) -> bool {
        self.health.as_ref().is_some_and(Health::is_depleted)
    }

    /// Whether the kind is [`EnemyBehavior::Boss`].
    pub fn is_boss(&self) -> bool {
        matches!(self.kind, EntityKind::Enemy(EnemyBehavior::Boss))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
