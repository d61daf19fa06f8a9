use serde::{Deserialize, Serialize};

use super::stats::StatId;

/// A boolean gate on option visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// Passes when the stat is at least `min_amount`.
    StatThreshold { stat: StatId, min_amount: u32 },
    /// Passes when an item with this id sits in the inventory.
    HasItem(String),
    /// Passes when the hero's current title matches exactly.
    HasTitle(String),
    /// Passes when the current location is of this kind.
    AtNodeKind(String),
}

/// A consequence applied after an option's costs are paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Gain (non-negative) or loss (negative) of a stat.
    StatChange { stat: StatId, amount: i32 },
    /// Put the item with this id into the first free inventory slot.
    GrantItem(String),
    /// Replace the hero's title.
    ChangeTitle(String),
    /// Ask the game loop to fire this event next.
    TriggerEvent(String),
}

impl Effect {
    /// Whether the effect reads as good news, for colouring resolution lines.
    pub fn is_positive(&self) -> bool {
        match self {
            Self::StatChange { amount, .. } => *amount >= 0,
            Self::GrantItem(_) | Self::ChangeTitle(_) | Self::TriggerEvent(_) => true,
        }
    }
}
