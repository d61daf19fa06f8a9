use serde::{Deserialize, Serialize};

use super::stats::StatAmount;
use super::vocabulary::{Condition, Effect};

/// A compiled decision point. Text fields are already rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Sorted ascending by `order`, which is unique within the event.
    pub options: Vec<GameEventOption>,
}

impl GameEvent {
    pub fn option_by_order(&self, order: i32) -> Option<&GameEventOption> {
        self.options.iter().find(|option| option.order == order)
    }
}

/// One compiled, immutable choice inside an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEventOption {
    pub display_text: String,
    pub resolution_text: String,
    pub order: i32,
    pub display_cost: bool,
    /// All must pass for the option to be shown.
    pub conditions: Vec<Condition>,
    /// All must be payable for the option to be chosen; deducted before effects.
    pub costs: Vec<StatAmount>,
    /// Applied in order after costs.
    pub effects: Vec<Effect>,
    pub next_event_id: Option<String>,
}

impl GameEventOption {
    /// "3 Food, 2 Gold"; empty when the option is free.
    pub fn cost_text(&self) -> String {
        self.costs
            .iter()
            .map(StatAmount::display_text)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::stats::StatId;

    fn option(order: i32, costs: Vec<StatAmount>) -> GameEventOption {
        GameEventOption {
            display_text: format!("Option {order}"),
            resolution_text: String::new(),
            order,
            display_cost: true,
            conditions: Vec::new(),
            costs,
            effects: Vec::new(),
            next_event_id: None,
        }
    }

    #[test]
    fn cost_text_lists_every_cost() {
        let opt = option(
            1,
            vec![
                StatAmount::new(StatId::Food, 3),
                StatAmount::new(StatId::Gold, 2),
            ],
        );
        assert_eq!(opt.cost_text(), "3 Food, 2 Gold");
        assert_eq!(option(2, Vec::new()).cost_text(), "");
    }

    #[test]
    fn option_lookup_by_order() {
        let event = GameEvent {
            id: "e".to_string(),
            name: "E".to_string(),
            description: String::new(),
            options: vec![option(1, Vec::new()), option(5, Vec::new())],
        };
        assert_eq!(event.option_by_order(5).map(|o| o.order), Some(5));
        assert!(event.option_by_order(2).is_none());
    }
}
