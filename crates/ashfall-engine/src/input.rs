//! Abstract player input.
//!
//! The host samples its devices into an [`InputFrame`] before each tick. The
//! core never polls hardware, so the same frames can be recorded and replayed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A player intention, independent of the device that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Walk left at the player's speed.
    MoveLeft,
    /// Walk right at the player's speed.
    MoveRight,
    /// Queue a melee swing for this tick's combat pass.
    Attack,
    /// Burst of speed in the facing direction, paid with stamina.
    Dodge,
}

impl Action {
    /// Every action, in sampling order.
    pub const ALL: [Action; 4] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::Attack,
        Action::Dodge,
    ];
}

/// Anything that can answer "is this action held right now".
pub trait InputSource {
    /// Whether `action` is held.
    fn is_active(&self, action: Action) -> bool;
}

/// The set of actions held during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    actions: BTreeSet<Action>,
}

impl InputFrame {
    /// A frame with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample every action from `source`.
    pub fn poll(source: &dyn InputSource) -> Self {
        Action::ALL
            .into_iter()
            .filter(|a| source.is_active(*a))
            .collect()
    }

    /// Hold `action`.
    pub fn press(&mut self, action: Action) {
        self.actions.insert(action);
    }

    /// Let go of `action`. Releasing an action not held is a no-op.
    pub fn release(&mut self, action: Action) {
        self.actions.remove(&action);
    }

    /// Builder form of [`press`](Self::press).
    pub fn with(mut self, action: Action) -> Self {
        self.press(action);
        self
    }

    /// Whether `action` is held.
    pub fn contains(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    /// `true` when nothing is held.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Held actions in [`Action`] order.
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.actions.iter().copied()
    }

    /// Horizontal intent: `-1`, `0` or `+1`. Left wins when both are held.
    pub fn horizontal(&self) -> i8 {
        if self.contains(Action::MoveLeft) {
            -1
        } else if self.contains(Action::MoveRight) {
            1
        } else {
            0
        }
    }
}

impl FromIterator<Action> for InputFrame {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

impl InputSource for InputFrame {
    fn is_active(&self, action: Action) -> bool {
        self.contains(action)
    }
}
