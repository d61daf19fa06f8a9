/// Option evaluation: visibility, affordability, and resolution against a
/// live snapshot of the player's state.
///
/// The context is built fresh by the caller for every evaluation and only
/// borrows the state it mutates; nothing here outlives the call.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::repository::ItemRepository;
use crate::schema::event::{GameEvent, GameEventOption};
use crate::schema::item::{Inventory, Item, INVENTORY_SLOTS};
use crate::schema::player::Player;
use crate::schema::stats::{StatId, Stats};
use crate::schema::vocabulary::{Condition, Effect};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("Option {order} was applied without being affordable: needs {needed} {stat}, has {available}.")]
    NotAffordable {
        order: i32,
        stat: StatId,
        needed: u32,
        available: u32,
    },
    #[error("No item found with id '{0}'.")]
    UnknownItem(String),
    #[error("Inventory slot {0} is out of range.")]
    SlotOutOfRange(usize),
    #[error("Item '{0}' is cursed and cannot be removed.")]
    CursedItem(String),
}

/// The state one evaluation reads and writes.
pub struct EvaluationContext<'a> {
    pub stats: &'a mut Stats,
    pub inventory: &'a mut Inventory,
    pub title: &'a mut String,
    pub items: &'a ItemRepository,
    /// Kind of the location the player is standing on, if any.
    pub node_kind: Option<&'a str>,
    /// Set by `Effect::TriggerEvent`.
    pub triggered_event_id: Option<String>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        player: &'a mut Player,
        items: &'a ItemRepository,
        node_kind: Option<&'a str>,
    ) -> Self {
        Self::from_parts(
            &mut player.stats,
            &mut player.inventory,
            &mut player.title,
            items,
            node_kind,
        )
    }

    /// Build a context from state the caller keeps in separate places.
    pub fn from_parts(
        stats: &'a mut Stats,
        inventory: &'a mut Inventory,
        title: &'a mut String,
        items: &'a ItemRepository,
        node_kind: Option<&'a str>,
    ) -> Self {
        Self {
            stats,
            inventory,
            title,
            items,
            node_kind,
            triggered_event_id: None,
        }
    }
}

/// One line of the resolution screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectLine {
    pub text: String,
    pub is_positive: bool,
}

/// What happened when an option was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub resolution_text: String,
    pub effect_lines: Vec<EffectLine>,
    /// Event the game loop should show next. The option's own chain wins
    /// over an id set by a `TriggerEvent` effect.
    pub next_event_id: Option<String>,
}

impl Condition {
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> bool {
        match self {
            Self::StatThreshold { stat, min_amount } => ctx.stats.get(*stat) >= *min_amount,
            Self::HasItem(item_id) => ctx.inventory.has_item(item_id),
            Self::HasTitle(title) => ctx.title.as_str() == title,
            Self::AtNodeKind(kind) => ctx.node_kind == Some(kind.as_str()),
        }
    }
}

impl Effect {
    /// Apply to the live state. Unknown item ids are the only failure.
    pub fn apply(&self, ctx: &mut EvaluationContext<'_>) -> Result<(), EvaluationError> {
        match self {
            Self::StatChange { stat, amount } => {
                if *amount >= 0 {
                    ctx.stats.add(*stat, amount.unsigned_abs());
                } else {
                    ctx.stats.spend(*stat, amount.unsigned_abs());
                }
            }
            Self::GrantItem(item_id) => {
                let item = ctx
                    .items
                    .try_get_by_id(item_id)
                    .ok_or_else(|| EvaluationError::UnknownItem(item_id.clone()))?;
                grant_item(ctx, item)?;
            }
            Self::ChangeTitle(title) => {
                *ctx.title = title.clone();
            }
            Self::TriggerEvent(event_id) => {
                ctx.triggered_event_id = Some(event_id.clone());
            }
        }
        Ok(())
    }

    /// Text for the resolution screen; `None` for effects the player does not see.
    pub fn display_text(&self, items: &ItemRepository) -> Option<String> {
        match self {
            Self::StatChange { stat, amount } => {
                let sign = if *amount >= 0 { "+" } else { "" };
                Some(format!("{sign}{amount} {stat}"))
            }
            Self::GrantItem(item_id) => {
                let name = items
                    .try_get_by_id(item_id)
                    .map_or(item_id.as_str(), |item| item.name.as_str());
                Some(format!("You got {name}"))
            }
            Self::ChangeTitle(title) => Some(format!("You are known as {title}")),
            Self::TriggerEvent(_) => None,
        }
    }
}

fn grant_item(ctx: &mut EvaluationContext<'_>, item: &Item) -> Result<(), EvaluationError> {
    if ctx.inventory.add(item.clone()).is_none() {
        tracing::warn!(item = %item.id, "inventory full, item not granted");
        return Ok(());
    }
    for effect in &item.effects_on_equip {
        effect.apply(ctx)?;
    }
    Ok(())
}

/// True when every visibility condition passes.
pub fn is_visible(option: &GameEventOption, ctx: &EvaluationContext<'_>) -> bool {
    option.conditions.iter().all(|condition| condition.evaluate(ctx))
}

/// True when every cost can be paid.
pub fn is_affordable(option: &GameEventOption, ctx: &EvaluationContext<'_>) -> bool {
    ctx.stats.can_pay_all(&option.costs)
}

/// Options of `event` that pass their visibility conditions, in order.
pub fn visible_options<'e>(
    event: &'e GameEvent,
    ctx: &EvaluationContext<'_>,
) -> Vec<&'e GameEventOption> {
    event
        .options
        .iter()
        .filter(|option| is_visible(option, ctx))
        .collect()
}

/// Every item granted by `effects` must exist in `items`.
fn check_grants(effects: &[Effect], items: &ItemRepository) -> Result<(), EvaluationError> {
    for effect in effects {
        if let Effect::GrantItem(item_id) = effect {
            if items.try_get_by_id(item_id).is_none() {
                return Err(EvaluationError::UnknownItem(item_id.clone()));
            }
        }
    }
    Ok(())
}

/// Pay the option's costs, then apply its effects in order.
///
/// Callers must check `is_affordable` first; applying an unaffordable option
/// is an error and leaves the state untouched. Item grants are checked
/// before anything is mutated.
pub fn apply(
    option: &GameEventOption,
    ctx: &mut EvaluationContext<'_>,
) -> Result<Resolution, EvaluationError> {
    if let Some(cost) = option
        .costs
        .iter()
        .find(|cost| ctx.stats.get(cost.stat) < cost.amount)
    {
        return Err(EvaluationError::NotAffordable {
            order: option.order,
            stat: cost.stat,
            needed: cost.amount,
            available: ctx.stats.get(cost.stat),
        });
    }
    check_grants(&option.effects, ctx.items)?;

    for cost in &option.costs {
        ctx.stats.spend(cost.stat, cost.amount);
    }
    for effect in &option.effects {
        effect.apply(ctx)?;
    }

    let effect_lines = option
        .effects
        .iter()
        .filter_map(|effect| {
            effect.display_text(ctx.items).map(|text| EffectLine {
                text,
                is_positive: effect.is_positive(),
            })
        })
        .collect();

    Ok(Resolution {
        resolution_text: option.resolution_text.clone(),
        effect_lines,
        next_event_id: option
            .next_event_id
            .clone()
            .or_else(|| ctx.triggered_event_id.clone()),
    })
}

/// Use the item in `slot`: apply its use effects and spend a charge.
/// An empty slot does nothing. An unknown item grant is an error and
/// leaves the state untouched.
pub fn use_item(ctx: &mut EvaluationContext<'_>, slot: usize) -> Result<(), EvaluationError> {
    if slot >= INVENTORY_SLOTS {
        return Err(EvaluationError::SlotOutOfRange(slot));
    }
    let Some(effects) = ctx.inventory.get(slot).map(|item| item.effects_on_use.clone()) else {
        return Ok(());
    };
    check_grants(&effects, ctx.items)?;
    for effect in &effects {
        effect.apply(ctx)?;
    }
    ctx.inventory.consume_charge(slot);
    Ok(())
}

/// Take the item out of `slot` and apply its unequip effects.
pub fn unequip_item(
    ctx: &mut EvaluationContext<'_>,
    slot: usize,
) -> Result<Option<Item>, EvaluationError> {
    if slot >= INVENTORY_SLOTS {
        return Err(EvaluationError::SlotOutOfRange(slot));
    }
    match ctx.inventory.get(slot) {
        None => return Ok(None),
        Some(item) if item.is_cursed => return Err(EvaluationError::CursedItem(item.id.clone())),
        Some(item) => check_grants(&item.effects_on_unequip, ctx.items)?,
    }
    let Some(item) = ctx.inventory.remove(slot) else {
        return Ok(None);
    };
    for effect in &item.effects_on_unequip {
        effect.apply(ctx)?;
    }
    Ok(Some(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::BirthChoice;
    use crate::schema::stats::StatAmount;

    fn player() -> Player {
        Player::new(
            "Astrid",
            BirthChoice::Girl,
            "Thrall",
            Stats::new(&[
                (StatId::Population, 10),
                (StatId::Food, 2),
                (StatId::Gold, 5),
                (StatId::Strength, 3),
                (StatId::MaxStrength, 5),
                (StatId::Honor, 10),
                (StatId::MaxHonor, 10),
                (StatId::MaxFeats, 3),
            ]),
        )
    }

    fn item(id: &str, equip: Vec<Effect>) -> Item {
        Item {
            id: id.to_string(),
            name: format!("The {id}"),
            description: String::new(),
            art: String::new(),
            is_cursed: false,
            remaining_charges: None,
            effects_on_use: Vec::new(),
            effects_on_equip: equip,
            effects_on_unequip: Vec::new(),
        }
    }

    fn items() -> ItemRepository {
        ItemRepository::from_items(vec![
            item("mead_flask", Vec::new()),
            item(
                "war_banner",
                vec![Effect::StatChange {
                    stat: StatId::Honor,
                    amount: -2,
                }],
            ),
        ])
        .unwrap()
    }

    fn option(
        conditions: Vec<Condition>,
        costs: Vec<StatAmount>,
        effects: Vec<Effect>,
    ) -> GameEventOption {
        GameEventOption {
            display_text: "Do it".to_string(),
            resolution_text: "Done.".to_string(),
            order: 1,
            display_cost: false,
            conditions,
            costs,
            effects,
            next_event_id: None,
        }
    }

    #[test]
    fn stat_threshold_visibility() {
        let items = items();
        let opt = option(
            vec![Condition::StatThreshold {
                stat: StatId::Food,
                min_amount: 3,
            }],
            Vec::new(),
            Vec::new(),
        );
        for (food, visible) in [(0, false), (2, false), (3, true), (4, true)] {
            let mut player = player();
            player.stats = Stats::new(&[(StatId::Food, food)]);
            let ctx = EvaluationContext::new(&mut player, &items, None);
            assert_eq!(is_visible(&opt, &ctx), visible, "food = {food}");
        }
    }

    #[test]
    fn item_title_and_node_conditions() {
        let items = items();
        let mut player = player();
        player.inventory.add(item("mead_flask", Vec::new()));
        let ctx = EvaluationContext::new(&mut player, &items, Some("village"));

        assert!(Condition::HasItem("mead_flask".to_string()).evaluate(&ctx));
        assert!(!Condition::HasItem("war_banner".to_string()).evaluate(&ctx));
        assert!(Condition::HasTitle("Thrall".to_string()).evaluate(&ctx));
        assert!(!Condition::HasTitle("thrall".to_string()).evaluate(&ctx));
        assert!(Condition::AtNodeKind("village".to_string()).evaluate(&ctx));
        assert!(!Condition::AtNodeKind("forest".to_string()).evaluate(&ctx));
    }

    #[test]
    fn node_condition_fails_without_location() {
        let items = items();
        let mut player = player();
        let ctx = EvaluationContext::new(&mut player, &items, None);
        assert!(!Condition::AtNodeKind("village".to_string()).evaluate(&ctx));
    }

    #[test]
    fn visible_options_keep_order() {
        let items = items();
        let mut player = player();
        let ctx = EvaluationContext::new(&mut player, &items, None);
        let jarl_only = vec![Condition::HasTitle("Jarl".to_string())];
        let mut hidden = option(jarl_only, Vec::new(), Vec::new());
        hidden.order = 2;
        let mut shown = option(Vec::new(), Vec::new(), Vec::new());
        shown.order = 3;
        let event = GameEvent {
            id: "e".to_string(),
            name: String::new(),
            description: String::new(),
            options: vec![option(Vec::new(), Vec::new(), Vec::new()), hidden, shown],
        };
        let orders: Vec<i32> = visible_options(&event, &ctx).iter().map(|o| o.order).collect();
        assert_eq!(orders, vec![1, 3]);
    }

    #[test]
    fn applies_signed_stat_changes() {
        let items = items();
        let mut player = player();
        let opt = option(
            Vec::new(),
            Vec::new(),
            vec![
                Effect::StatChange {
                    stat: StatId::Food,
                    amount: 5,
                },
                Effect::StatChange {
                    stat: StatId::Honor,
                    amount: -1,
                },
            ],
        );
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        let resolution = apply(&opt, &mut ctx).unwrap();
        assert_eq!(player.stats.get(StatId::Food), 7);
        assert_eq!(player.stats.get(StatId::Honor), 9);
        let lines: Vec<&str> = resolution.effect_lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(lines, vec!["+5 Food", "-1 Honor"]);
        assert!(resolution.effect_lines[0].is_positive);
        assert!(!resolution.effect_lines[1].is_positive);
    }

    #[test]
    fn costs_are_paid_before_effects() {
        let items = items();
        let mut player = player();
        let opt = option(
            Vec::new(),
            vec![StatAmount::new(StatId::Strength, 3)],
            vec![Effect::StatChange {
                stat: StatId::Strength,
                amount: 4,
            }],
        );
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        assert!(is_affordable(&opt, &ctx));
        apply(&opt, &mut ctx).unwrap();
        // 3 - 3 + 4, capped at max strength 5
        assert_eq!(player.stats.get(StatId::Strength), 4);
    }

    #[test]
    fn unaffordable_apply_is_an_error_and_changes_nothing() {
        let items = items();
        let mut player = player();
        let before = player.clone();
        let opt = option(
            Vec::new(),
            vec![
                StatAmount::new(StatId::Gold, 1),
                StatAmount::new(StatId::Food, 3),
            ],
            vec![Effect::ChangeTitle("Jarl".to_string())],
        );
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        assert!(!is_affordable(&opt, &ctx));
        let err = apply(&opt, &mut ctx).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::NotAffordable {
                order: 1,
                stat: StatId::Food,
                needed: 3,
                available: 2
            }
        );
        assert!(err.to_string().contains("without being affordable"));
        assert_eq!(player, before);
    }

    #[test]
    fn grant_item_applies_equip_effects() {
        let items = items();
        let mut player = player();
        let opt = option(Vec::new(), Vec::new(), vec![Effect::GrantItem("war_banner".to_string())]);
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        let resolution = apply(&opt, &mut ctx).unwrap();
        assert_eq!(resolution.effect_lines[0].text, "You got The war_banner");
        assert!(player.inventory.has_item("war_banner"));
        assert_eq!(player.stats.get(StatId::Honor), 8);
    }

    #[test]
    fn grant_item_on_full_inventory_is_a_no_op() {
        let items = items();
        let mut player = player();
        for id in ["a", "b", "c"] {
            player.inventory.add(item(id, Vec::new()));
        }
        let before = player.clone();
        let opt = option(Vec::new(), Vec::new(), vec![Effect::GrantItem("war_banner".to_string())]);
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        assert!(apply(&opt, &mut ctx).is_ok());
        assert_eq!(player, before);
    }

    #[test]
    fn unknown_item_is_rejected_before_paying() {
        let items = items();
        let mut player = player();
        let before = player.clone();
        let opt = option(
            Vec::new(),
            vec![StatAmount::new(StatId::Gold, 1)],
            vec![Effect::GrantItem("ghost".to_string())],
        );
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        assert_eq!(
            apply(&opt, &mut ctx).unwrap_err(),
            EvaluationError::UnknownItem("ghost".to_string())
        );
        assert_eq!(player, before);
    }

    #[test]
    fn title_and_trigger_effects() {
        let items = items();
        let mut player = player();
        let opt = option(
            Vec::new(),
            Vec::new(),
            vec![
                Effect::ChangeTitle("Jarl".to_string()),
                Effect::TriggerEvent("feast".to_string()),
            ],
        );
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        let resolution = apply(&opt, &mut ctx).unwrap();
        assert_eq!(ctx.triggered_event_id.as_deref(), Some("feast"));
        assert_eq!(resolution.next_event_id.as_deref(), Some("feast"));
        assert_eq!(resolution.effect_lines.len(), 1);
        assert_eq!(resolution.effect_lines[0].text, "You are known as Jarl");
        assert_eq!(player.title, "Jarl");
    }

    #[test]
    fn option_chain_wins_over_trigger_effect() {
        let items = items();
        let mut player = player();
        let trigger = vec![Effect::TriggerEvent("feast".to_string())];
        let mut opt = option(Vec::new(), Vec::new(), trigger);
        opt.next_event_id = Some("voyage".to_string());
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        let resolution = apply(&opt, &mut ctx).unwrap();
        assert_eq!(resolution.next_event_id.as_deref(), Some("voyage"));
        assert_eq!(ctx.triggered_event_id.as_deref(), Some("feast"));
    }

    #[test]
    fn use_item_spends_charges() {
        let items = items();
        let mut player = player();
        player.inventory.add(Item {
            remaining_charges: Some(1),
            effects_on_use: vec![Effect::StatChange {
                stat: StatId::Strength,
                amount: 1,
            }],
            ..item("mead_flask", Vec::new())
        });
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        use_item(&mut ctx, 0).unwrap();
        use_item(&mut ctx, 0).unwrap();
        assert_eq!(use_item(&mut ctx, 3), Err(EvaluationError::SlotOutOfRange(3)));
        assert_eq!(player.stats.get(StatId::Strength), 4);
        assert!(!player.inventory.has_item("mead_flask"));
    }

    #[test]
    fn unequip_applies_effects_and_respects_curses() {
        let items = items();
        let mut player = player();
        player.inventory.add(Item {
            effects_on_unequip: vec![Effect::StatChange {
                stat: StatId::Gold,
                amount: -5,
            }],
            ..item("war_banner", Vec::new())
        });
        player.inventory.add(Item {
            is_cursed: true,
            ..item("black_ring", Vec::new())
        });
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        let removed = unequip_item(&mut ctx, 0).unwrap();
        assert_eq!(removed.map(|i| i.id), Some("war_banner".to_string()));
        assert_eq!(
            unequip_item(&mut ctx, 1),
            Err(EvaluationError::CursedItem("black_ring".to_string()))
        );
        assert_eq!(unequip_item(&mut ctx, 2), Ok(None));
        assert_eq!(player.stats.get(StatId::Gold), 0);
    }

    #[test]
    fn item_with_unknown_grant_changes_nothing() {
        let items = items();
        let mut player = player();
        let grants_ghost = vec![
            Effect::StatChange {
                stat: StatId::Food,
                amount: 5,
            },
            Effect::GrantItem("ghost".to_string()),
        ];
        player.inventory.add(Item {
            remaining_charges: Some(1),
            effects_on_use: grants_ghost.clone(),
            effects_on_unequip: grants_ghost,
            ..item("horn", Vec::new())
        });
        let mut ctx = EvaluationContext::new(&mut player, &items, None);
        assert_eq!(
            use_item(&mut ctx, 0),
            Err(EvaluationError::UnknownItem("ghost".to_string()))
        );
        assert_eq!(
            unequip_item(&mut ctx, 0),
            Err(EvaluationError::UnknownItem("ghost".to_string()))
        );
        assert_eq!(player.stats.get(StatId::Food), 2);
        let horn = player.inventory.get(0).unwrap();
        assert_eq!(horn.id, "horn");
        assert_eq!(horn.remaining_charges, Some(1));
    }
}
