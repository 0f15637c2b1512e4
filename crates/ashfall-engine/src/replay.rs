//! Fight recording and replay.
//!
//! A [`FightRecorder`] drives a [`Simulation`] one fixed step at a time and
//! keeps what the fight was made of: every change of the player's input, and
//! the gameplay outcome of each tick in which something happened (hits, boss
//! phase changes, removals). It can also take a state hash every N ticks.
//!
//! [`replay`] restores the starting snapshot onto another simulation,
//! re-applies the input changes and compares each tick's outcome with the
//! recording. A divergence is reported with the tick and both outcomes, so a
//! changed damage number or a boss that no longer dies shows up as exactly that
//! rather than as an opaque hash mismatch.
//!
//! ```
//! use ashfall_engine::prelude::*;
//! use ashfall_engine::replay::{replay, FightRecorder};
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! let player = sim.spawn(Entity::player(0.0, 0.0).with_attack(12).with_stamina(100.0, 0.0));
//! let grunt = sim.spawn(Entity::enemy(30.0, 0.0).with_health(20));
//! sim.set_player(player);
//!
//! let mut recorder = FightRecorder::new(&sim, 0);
//! recorder.step(&mut sim, InputFrame::new().with(Action::Attack));
//! recorder.step(&mut sim, InputFrame::new().with(Action::Attack));
//! let log = recorder.finish();
//! assert_eq!(log.damage_to(grunt), 24);
//! assert_eq!(log.removal_tick(grunt), Some(1));
//!
//! let mut fresh = Simulation::new(SimConfig::default()).unwrap();
//! let result = replay(&mut fresh, &log).unwrap();
//! assert!(result.completed);
//! assert_eq!(fresh.state_hash(), sim.state_hash());
//! ```

use std::collections::BTreeMap;
use std::ops::Range;

use anyhow::{anyhow, bail, Context};
use ashfall_registry::entity::EntityId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::boss::PhaseTransition;
use crate::combat::CombatEvent;
use crate::input::InputFrame;
use crate::snapshot::SimulationSnapshot;
use crate::tick::{Simulation, TickReport};

// ---------------------------------------------------------------------------
// Recorded data
// ---------------------------------------------------------------------------

/// What one tick did to the fight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub tick: u64,
    pub combat_events: Vec<CombatEvent>,
    pub phase_transitions: Vec<PhaseTransition>,
    /// Entities removed at the end of the tick, in removal order.
    pub removed: Vec<EntityId>,
}

impl TickOutcome {
    /// A tick in which nothing happened.
    pub fn quiet(tick: u64) -> Self {
        Self {
            tick,
            ..Default::default()
        }
    }

    pub fn from_report(report: &TickReport) -> Self {
        Self {
            tick: report.tick,
            combat_events: report.combat_events.clone(),
            phase_transitions: report.phase_transitions.clone(),
            removed: report.removed.clone(),
        }
    }

    /// No hits, no phase changes and no removals.
    pub fn is_quiet(&self) -> bool {
        self.combat_events.is_empty() && self.phase_transitions.is_empty() && self.removed.is_empty()
    }
}

/// The input the player switched to before `tick` ran. It stays in effect
/// until the next change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputChange {
    pub tick: u64,
    pub input: InputFrame,
}

/// State hash taken after the tick's input was set, before it ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub tick: u64,
    pub state_hash: String,
}

/// A recorded fight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLog {
    pub initial_snapshot: SimulationSnapshot,
    /// Fixed steps run from the snapshot.
    pub total_ticks: u64,
    pub input_changes: Vec<InputChange>,
    /// One entry per tick that was not [quiet](TickOutcome::is_quiet).
    pub outcomes: Vec<TickOutcome>,
    pub checkpoints: Vec<Checkpoint>,
}

impl ReplayLog {
    /// Total damage `target` took over the fight.
    pub fn damage_to(&self, target: EntityId) -> i64 {
        self.outcomes
            .iter()
            .flat_map(|o| &o.combat_events)
            .filter(|e| e.target == target)
            .map(|e| i64::from(e.damage))
            .sum()
    }

    /// Tick at the end of which `id` was removed.
    pub fn removal_tick(&self, id: EntityId) -> Option<u64> {
        self.outcomes
            .iter()
            .find(|o| o.removed.contains(&id))
            .map(|o| o.tick)
    }

    /// Every boss phase change, in order.
    pub fn phase_transitions(&self) -> impl Iterator<Item = &PhaseTransition> + '_ {
        self.outcomes.iter().flat_map(|o| &o.phase_transitions)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// How a replayed tick differed from the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Divergence {
    /// The state before the tick ran hashed differently.
    StateHash { expected: String, actual: String },
    /// The tick produced different hits, phase changes or removals.
    Outcome {
        expected: TickOutcome,
        actual: TickOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDivergence {
    pub tick: u64,
    pub kind: Divergence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    /// `true` when every tick ran and matched.
    pub completed: bool,
    /// Ticks actually stepped, including a tick whose outcome diverged.
    pub ticks_replayed: u64,
    pub first_divergence: Option<ReplayDivergence>,
}

// ---------------------------------------------------------------------------
// FightRecorder
// ---------------------------------------------------------------------------

/// Steps a simulation and records the fight as it goes.
pub struct FightRecorder {
    log: ReplayLog,
    /// 0 disables hash checkpoints; outcomes are always recorded.
    checkpoint_every: u64,
    last_input: InputFrame,
    next_tick: u64,
}

impl FightRecorder {
    /// Start recording from `sim`'s current state.
    pub fn new(sim: &Simulation, checkpoint_every: u64) -> Self {
        let initial_snapshot = sim.capture_snapshot();
        Self {
            last_input: initial_snapshot.current_input.clone(),
            next_tick: initial_snapshot.tick_counter,
            log: ReplayLog {
                initial_snapshot,
                total_ticks: 0,
                input_changes: Vec::new(),
                outcomes: Vec::new(),
                checkpoints: Vec::new(),
            },
            checkpoint_every,
        }
    }

    /// Set `input`, run one fixed step and record it.
    ///
    /// # Panics
    ///
    /// If `sim` is not at the tick the recorder expects, i.e. it was stepped
    /// or restored behind the recorder's back.
    pub fn step(&mut self, sim: &mut Simulation, input: InputFrame) -> TickReport {
        let tick = sim.tick_count();
        assert!(
            tick == self.next_tick,
            "FightRecorder::step: simulation is at tick {tick}, recorder expected tick {}",
            self.next_tick
        );

        if input != self.last_input {
            self.log.input_changes.push(InputChange {
                tick,
                input: input.clone(),
            });
            self.last_input = input.clone();
        }
        sim.set_input(input);

        if self.checkpoint_every > 0 && tick % self.checkpoint_every == 0 {
            self.log.checkpoints.push(Checkpoint {
                tick,
                state_hash: sim.state_hash(),
            });
        }

        let report = sim.step();
        let outcome = TickOutcome::from_report(&report);
        if !outcome.is_quiet() {
            self.log.outcomes.push(outcome);
        }
        self.next_tick += 1;
        self.log.total_ticks += 1;
        report
    }

    /// The fight so far.
    pub fn log(&self) -> &ReplayLog {
        &self.log
    }

    pub fn finish(self) -> ReplayLog {
        self.log
    }
}

// ---------------------------------------------------------------------------
// replay()
// ---------------------------------------------------------------------------

/// Replay `log` on `sim` and report the first tick that differs.
///
/// Replay stops at the first divergence. The map is not part of the log; the
/// host attaches the same map before replaying.
///
/// # Errors
///
/// A malformed log (entries outside the recorded range, two entries of one
/// kind for the same tick, tick overflow) or a snapshot that fails to
/// restore. The log is validated before `sim` is touched.
pub fn replay(sim: &mut Simulation, log: &ReplayLog) -> Result<ReplayResult, anyhow::Error> {
    let start = log.initial_snapshot.tick_counter;
    let end = start.checked_add(log.total_ticks).ok_or_else(|| {
        anyhow!(
            "a fight of {} ticks starting at tick {start} overflows the tick counter",
            log.total_ticks
        )
    })?;
    let range = start..end;

    let inputs = index_by_tick("input change", log.input_changes.iter().map(|c| (c.tick, c)), &range)?;
    let outcomes = index_by_tick("outcome", log.outcomes.iter().map(|o| (o.tick, o)), &range)?;
    let checkpoints = index_by_tick("checkpoint", log.checkpoints.iter().map(|c| (c.tick, c)), &range)?;

    sim.restore_snapshot(&log.initial_snapshot)
        .context("failed to restore the fight's starting snapshot")?;

    let mut ticks_replayed = 0;
    for tick in range {
        if let Some(change) = inputs.get(&tick) {
            sim.set_input(change.input.clone());
        }

        if let Some(checkpoint) = checkpoints.get(&tick) {
            let actual = sim.state_hash();
            if actual != checkpoint.state_hash {
                warn!(tick, "replay state hash diverged");
                return Ok(diverged(
                    tick,
                    ticks_replayed,
                    Divergence::StateHash {
                        expected: checkpoint.state_hash.clone(),
                        actual,
                    },
                ));
            }
        }

        let actual = TickOutcome::from_report(&sim.step());
        ticks_replayed += 1;
        let matches = match outcomes.get(&tick) {
            Some(expected) => **expected == actual,
            None => actual.is_quiet(),
        };
        if !matches {
            let expected = outcomes
                .get(&tick)
                .map_or_else(|| TickOutcome::quiet(tick), |o| (*o).clone());
            warn!(
                tick,
                expected_hits = expected.combat_events.len(),
                actual_hits = actual.combat_events.len(),
                "replay outcome diverged"
            );
            return Ok(diverged(tick, ticks_replayed, Divergence::Outcome { expected, actual }));
        }
    }

    debug!(ticks_replayed, "replay matched the recording");
    Ok(ReplayResult {
        completed: true,
        ticks_replayed,
        first_divergence: None,
    })
}

fn diverged(tick: u64, ticks_replayed: u64, kind: Divergence) -> ReplayResult {
    ReplayResult {
        completed: false,
        ticks_replayed,
        first_divergence: Some(ReplayDivergence { tick, kind }),
    }
}

/// Index entries by tick, rejecting duplicates and ticks outside `range`.
fn index_by_tick<'a, T>(
    what: &str,
    entries: impl Iterator<Item = (u64, &'a T)>,
    range: &Range<u64>,
) -> Result<BTreeMap<u64, &'a T>, anyhow::Error> {
    let mut by_tick = BTreeMap::new();
    for (tick, entry) in entries {
        if !range.contains(&tick) {
            bail!(
                "{what} at tick {tick} is outside the recorded range {}..{}",
                range.start,
                range.end
            );
        }
        if by_tick.insert(tick, entry).is_some() {
            bail!("replay log has two {what} entries for tick {tick}");
        }
    }
    Ok(by_tick)
}
