use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::item::Inventory;
use super::stats::{StatId, Stats};
use crate::core::template::{BirthChoice, TemplateContext};

/// Feats a hero can hold before any content raises the limit.
pub const STARTING_MAX_FEATS: u32 = 3;

/// A title the hero can be born into, with the settlement it comes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartingTitle {
    pub name: &'static str,
    pub population: u32,
    pub food: u32,
    pub gold: u32,
    pub strength: u32,
    pub honor: u32,
    pub feats: u32,
}

const fn title(
    name: &'static str,
    population: u32,
    food: u32,
    gold: u32,
    strength: u32,
    honor: u32,
) -> StartingTitle {
    StartingTitle {
        name,
        population,
        food,
        gold,
        strength,
        honor,
        feats: 0,
    }
}

pub static STARTING_TITLES: [StartingTitle; 10] = [
    title("the Ironborn", 24, 18, 8, 9, 6),
    title("the Oathkeeper", 28, 16, 7, 6, 9),
    title("the Sea Wolf", 21, 22, 9, 7, 6),
    title("the Stormforged", 26, 17, 8, 10, 5),
    title("the Hearth-Blessed", 35, 20, 5, 5, 8),
    title("the Boneless", 18, 10, 4, 2, 3),
    title("the Oathbreaker", 20, 12, 12, 5, 2),
    title("the Starved", 17, 6, 9, 4, 4),
    title("the Coward", 19, 14, 6, 3, 3),
    title("the Ragged", 16, 9, 3, 4, 5),
];

impl StartingTitle {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> &'static StartingTitle {
        STARTING_TITLES.choose(rng).unwrap_or(&STARTING_TITLES[0])
    }

    /// Opening stats. Strength and honor start at their maximum.
    pub fn stats(&self) -> Stats {
        Stats::new(&[
            (StatId::Population, self.population),
            (StatId::Food, self.food),
            (StatId::Gold, self.gold),
            (StatId::Strength, self.strength),
            (StatId::MaxStrength, self.strength),
            (StatId::Honor, self.honor),
            (StatId::MaxHonor, self.honor),
            (StatId::Feats, self.feats),
            (StatId::MaxFeats, STARTING_MAX_FEATS),
        ])
    }
}

/// Everything the engine reads or writes about the hero and the settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub birth_choice: BirthChoice,
    pub title: String,
    pub stats: Stats,
    pub inventory: Inventory,
}

impl Player {
    pub fn new(
        name: impl Into<String>,
        birth_choice: BirthChoice,
        title: impl Into<String>,
        stats: Stats,
    ) -> Self {
        Self {
            name: name.into(),
            birth_choice,
            title: title.into(),
            stats,
            inventory: Inventory::new(),
        }
    }

    /// A fresh hero as the prologue creates one. Blank names become "Nameless".
    pub fn from_prologue(name: &str, birth_choice: BirthChoice, title: &StartingTitle) -> Self {
        let name = match name.trim() {
            "" => "Nameless",
            trimmed => trimmed,
        };
        Self::new(name, birth_choice, title.name, title.stats())
    }

    /// Template context for rendering content about this player.
    pub fn template_context(&self) -> TemplateContext {
        TemplateContext::new(self.birth_choice, self.name.clone(), self.title.clone())
    }
}
