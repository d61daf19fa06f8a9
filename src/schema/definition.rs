/// Raw authored definitions, exactly as they appear in RON content files.
///
/// Nothing here is validated beyond what serde enforces; the compiler turns
/// these into runtime objects.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One event file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Event", rename_all = "PascalCase", deny_unknown_fields)]
pub struct GameEventDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<GameEventOptionDefinition>,
}

/// One selectable option inside an event file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct GameEventOptionDefinition {
    pub display_text: String,
    pub resolution_text: String,
    pub order: i32,
    /// `"food:3"`, `"item:mead_flask"`, `"title:Jarl"`, `"node_kind:village"`
    #[serde(default)]
    pub conditions: Vec<String>,
    /// `"food:3"`, deducted when the option resolves.
    #[serde(default)]
    pub costs: Vec<String>,
    #[serde(default)]
    pub display_cost: bool,
    /// `"food:+5"`, `"honor:-1"`, `"item:x"`, `"title:x"`, `"event:x"`
    #[serde(default)]
    pub effects: Vec<String>,
    /// Blank means the option does not chain.
    #[serde(default)]
    pub next_event_id: String,
}

/// One item file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Item", rename_all = "PascalCase", deny_unknown_fields)]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub art: String,
    #[serde(default)]
    pub is_cursed: bool,
    /// Negative means the item is not consumable.
    #[serde(default = "not_consumable")]
    pub consumable_charges: i32,
    #[serde(default)]
    pub effects_on_use: Vec<String>,
    #[serde(default)]
    pub effects_on_equip: Vec<String>,
    #[serde(default)]
    pub effects_on_unequip: Vec<String>,
}

fn not_consumable() -> i32 {
    -1
}

impl Default for ItemDefinition {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            art: String::new(),
            is_cursed: false,
            consumable_charges: not_consumable(),
            effects_on_use: Vec::new(),
            effects_on_equip: Vec::new(),
            effects_on_unequip: Vec::new(),
        }
    }
}

/// One map-node file: a kind of location and the events that can fire there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Node", rename_all = "PascalCase", deny_unknown_fields)]
pub struct MapNodeDefinition {
    pub kind: String,
    pub name: String,
    pub description: String,
    /// Neighbour kind → relative weight.
    #[serde(default)]
    pub possible_neighbours: BTreeMap<String, f32>,
    #[serde(default)]
    pub forced_first_event: String,
    #[serde(default)]
    pub events_pool: Vec<String>,
    #[serde(default)]
    pub art: String,
}
