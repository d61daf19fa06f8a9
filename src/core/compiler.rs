/// Definition → runtime compilation for events, items and map nodes.
use thiserror::Error;

use crate::core::parser::{parse_conditions, parse_costs, parse_effects, ParseError};
use crate::core::template::TemplateContext;
use crate::schema::definition::{
    GameEventDefinition, GameEventOptionDefinition, ItemDefinition, MapNodeDefinition,
};
use crate::schema::event::{GameEvent, GameEventOption};
use crate::schema::item::Item;
use crate::schema::node::MapNode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Event Id is required.")]
    MissingEventId,
    #[error("Item Id is required.")]
    MissingItemId,
    #[error("Node Kind is required.")]
    MissingNodeKind,
    #[error("Event '{event_id}' has duplicate option Order={order}.")]
    DuplicateOrder { event_id: String, order: i32 },
    /// Every bad entry across the definition, already prefixed with where it
    /// was found.
    #[error("{}", .messages.join("\n"))]
    InvalidEntries { owner_id: String, messages: Vec<String> },
}

/// Compile one event definition, rendering its text with `context`.
pub fn compile_event(
    definition: &GameEventDefinition,
    context: &TemplateContext,
) -> Result<GameEvent, CompileError> {
    let id = definition.id.trim();
    if id.is_empty() {
        return Err(CompileError::MissingEventId);
    }

    let mut messages = Vec::new();
    let mut options = Vec::with_capacity(definition.options.len());
    for option_definition in &definition.options {
        match compile_option(option_definition, context) {
            Ok(option) => options.push(option),
            Err(errors) => messages.extend(errors.messages.into_iter().map(|message| {
                format!("Event '{id}' option {}: {message}", option_definition.order)
            })),
        }
    }
    if !messages.is_empty() {
        return Err(CompileError::InvalidEntries {
            owner_id: id.to_string(),
            messages,
        });
    }

    options.sort_by_key(|option| option.order);
    if let Some(pair) = options.windows(2).find(|pair| pair[0].order == pair[1].order) {
        return Err(CompileError::DuplicateOrder {
            event_id: id.to_string(),
            order: pair[0].order,
        });
    }

    Ok(GameEvent {
        id: id.to_string(),
        name: context.render(&definition.name),
        description: context.render(&definition.description),
        options,
    })
}

fn compile_option(
    definition: &GameEventOptionDefinition,
    context: &TemplateContext,
) -> Result<GameEventOption, ParseError> {
    let conditions = parse_conditions("Conditions", &definition.conditions);
    let costs = parse_costs("Costs", &definition.costs);
    let effects = parse_effects("Effects", &definition.effects);

    let (conditions, costs, effects) = match (conditions, costs, effects) {
        (Ok(conditions), Ok(costs), Ok(effects)) => (conditions, costs, effects),
        (conditions, costs, effects) => {
            let messages = merge_errors([conditions.err(), costs.err(), effects.err()]);
            return Err(ParseError { messages });
        }
    };

    let next_event_id = definition.next_event_id.trim();
    Ok(GameEventOption {
        display_text: context.render(&definition.display_text),
        resolution_text: context.render(&definition.resolution_text),
        order: definition.order,
        display_cost: definition.display_cost,
        conditions,
        costs,
        effects,
        next_event_id: (!next_event_id.is_empty()).then(|| next_event_id.to_string()),
    })
}

fn merge_errors<const N: usize>(errors: [Option<ParseError>; N]) -> Vec<String> {
    errors.into_iter().flatten().flat_map(|err| err.messages).collect()
}

/// Compile one item definition. Item text is not templated.
pub fn compile_item(definition: &ItemDefinition) -> Result<Item, CompileError> {
    let id = definition.id.trim();
    if id.is_empty() {
        return Err(CompileError::MissingItemId);
    }

    let on_use = parse_effects("EffectsOnUse", &definition.effects_on_use);
    let on_equip = parse_effects("EffectsOnEquip", &definition.effects_on_equip);
    let on_unequip = parse_effects("EffectsOnUnequip", &definition.effects_on_unequip);

    let (effects_on_use, effects_on_equip, effects_on_unequip) =
        match (on_use, on_equip, on_unequip) {
            (Ok(on_use), Ok(on_equip), Ok(on_unequip)) => (on_use, on_equip, on_unequip),
            (on_use, on_equip, on_unequip) => {
                let messages = merge_errors([on_use.err(), on_equip.err(), on_unequip.err()])
                    .into_iter()
                    .map(|message| format!("Item '{id}': {message}"))
                    .collect();
                return Err(CompileError::InvalidEntries {
                    owner_id: id.to_string(),
                    messages,
                });
            }
        };

    Ok(Item {
        id: id.to_string(),
        name: definition.name.clone(),
        description: definition.description.clone(),
        art: definition.art.clone(),
        is_cursed: definition.is_cursed,
        remaining_charges: u32::try_from(definition.consumable_charges).ok(),
        effects_on_use,
        effects_on_equip,
        effects_on_unequip,
    })
}

/// Compile one map-node definition. Node text is not templated.
pub fn compile_node(definition: &MapNodeDefinition) -> Result<MapNode, CompileError> {
    let kind = definition.kind.trim();
    if kind.is_empty() {
        return Err(CompileError::MissingNodeKind);
    }

    let messages: Vec<String> = definition
        .possible_neighbours
        .iter()
        .filter(|(_, weight)| !weight.is_finite() || **weight < 0.0)
        .map(|(neighbour, weight)| {
            format!(
                "Node '{kind}': bad weight {weight} for neighbour '{neighbour}' in PossibleNeighbours. Weights must be zero or more."
            )
        })
        .collect();
    if !messages.is_empty() {
        return Err(CompileError::InvalidEntries {
            owner_id: kind.to_string(),
            messages,
        });
    }

    let forced = definition.forced_first_event.trim();
    Ok(MapNode {
        kind: kind.to_string(),
        name: definition.name.clone(),
        description: definition.description.clone(),
        art: definition.art.clone(),
        possible_neighbours: definition
            .possible_neighbours
            .iter()
            .map(|(neighbour, weight)| (neighbour.trim().to_string(), *weight))
            .collect(),
        forced_first_event: (!forced.is_empty()).then(|| forced.to_string()),
        events_pool: definition
            .events_pool
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
