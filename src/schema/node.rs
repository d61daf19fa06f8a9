use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A compiled kind of map location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapNode {
    pub kind: String,
    pub name: String,
    pub description: String,
    pub art: String,
    /// Neighbour kind → relative weight. Weights are finite and non-negative.
    pub possible_neighbours: BTreeMap<String, f32>,
    /// When set, always fires in place of a pool pick.
    pub forced_first_event: Option<String>,
    pub events_pool: Vec<String>,
}

impl MapNode {
    /// Every event id this node can fire.
    pub fn event_ids(&self) -> impl Iterator<Item = &str> {
        self.forced_first_event
            .as_deref()
            .into_iter()
            .chain(self.events_pool.iter().map(String::as_str))
    }
}
