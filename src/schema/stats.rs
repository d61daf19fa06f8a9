/// Numeric game stats: identifiers, clamping policy, and the only
/// sanctioned mutation paths (`add` / `spend`).
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every mutable numeric stat the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatId {
    Population,
    Food,
    Gold,
    Strength,
    Honor,
    Feats,
    MaxStrength,
    MaxHonor,
    MaxFeats,
}

/// How a stat is clamped after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatBound {
    /// Never below zero, no authored ceiling.
    Floor,
    /// Between zero and the current value of the paired maximum.
    CappedBy(StatId),
}

impl StatId {
    pub const ALL: [StatId; 9] = [
        Self::Population,
        Self::Food,
        Self::Gold,
        Self::Strength,
        Self::Honor,
        Self::Feats,
        Self::MaxStrength,
        Self::MaxHonor,
        Self::MaxFeats,
    ];

    /// Authoring key used in content files ("food", "max_strength", ...).
    pub fn key(&self) -> &'static str {
        match self {
            Self::Population => "population",
            Self::Food => "food",
            Self::Gold => "gold",
            Self::Strength => "strength",
            Self::Honor => "honor",
            Self::Feats => "feats",
            Self::MaxStrength => "max_strength",
            Self::MaxHonor => "max_honor",
            Self::MaxFeats => "max_feats",
        }
    }

    /// Display name shown to players ("Food", "MaxStrength", ...).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Population => "Population",
            Self::Food => "Food",
            Self::Gold => "Gold",
            Self::Strength => "Strength",
            Self::Honor => "Honor",
            Self::Feats => "Feats",
            Self::MaxStrength => "MaxStrength",
            Self::MaxHonor => "MaxHonor",
            Self::MaxFeats => "MaxFeats",
        }
    }

    /// Case-insensitive lookup by authoring key. Surrounding whitespace is ignored.
    pub fn from_key(key: &str) -> Option<StatId> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|stat| stat.key().eq_ignore_ascii_case(key))
    }

    /// The clamping policy for this stat.
    pub fn bound(&self) -> StatBound {
        match self {
            Self::Strength => StatBound::CappedBy(Self::MaxStrength),
            Self::Honor => StatBound::CappedBy(Self::MaxHonor),
            Self::Feats => StatBound::CappedBy(Self::MaxFeats),
            Self::Population
            | Self::Food
            | Self::Gold
            | Self::MaxStrength
            | Self::MaxHonor
            | Self::MaxFeats => StatBound::Floor,
        }
    }

    /// The capped stat whose ceiling this maximum controls, if any.
    fn capped_stat(&self) -> Option<StatId> {
        match self {
            Self::MaxStrength => Some(Self::Strength),
            Self::MaxHonor => Some(Self::Honor),
            Self::MaxFeats => Some(Self::Feats),
            _ => None,
        }
    }
}

impl fmt::Display for StatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A non-negative quantity of a stat. Used for costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatAmount {
    pub stat: StatId,
    pub amount: u32,
}

impl StatAmount {
    pub fn new(stat: StatId, amount: u32) -> Self {
        Self { stat, amount }
    }

    /// "3 Food"
    pub fn display_text(&self) -> String {
        format!("{} {}", self.amount, self.stat)
    }
}

/// Current values of all stats for one playthrough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    values: [u32; 9],
}

impl Stats {
    /// Build a stat block from raw starting values, clamping capped stats
    /// to their maxima.
    pub fn new(values: &[(StatId, u32)]) -> Self {
        let mut stats = Stats::default();
        for (stat, value) in values {
            stats.values[*stat as usize] = *value;
        }
        for stat in StatId::ALL {
            stats.clamp(stat);
        }
        stats
    }

    pub fn get(&self, stat: StatId) -> u32 {
        self.values[stat as usize]
    }

    /// Increase a stat, saturating at its ceiling.
    pub fn add(&mut self, stat: StatId, amount: u32) {
        let slot = &mut self.values[stat as usize];
        *slot = slot.saturating_add(amount);
        self.clamp(stat);
    }

    /// Decrease a stat, saturating at zero.
    pub fn spend(&mut self, stat: StatId, amount: u32) {
        let slot = &mut self.values[stat as usize];
        *slot = slot.saturating_sub(amount);
        self.clamp(stat);
    }

    /// True when every amount can be paid from current values.
    pub fn can_pay_all(&self, costs: &[StatAmount]) -> bool {
        costs.iter().all(|cost| self.get(cost.stat) >= cost.amount)
    }

    /// Losing condition: the settlement is empty or the hero is spent.
    pub fn is_game_over(&self) -> bool {
        self.get(StatId::Population) == 0 || self.get(StatId::Strength) == 0
    }

    fn clamp(&mut self, stat: StatId) {
        if let StatBound::CappedBy(max) = stat.bound() {
            let ceiling = self.get(max);
            let slot = &mut self.values[stat as usize];
            *slot = (*slot).min(ceiling);
        }
        if let Some(capped) = stat.capped_stat() {
            self.clamp(capped);
        }
    }
}
