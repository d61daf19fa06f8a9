use serde::{Deserialize, Serialize};

use super::vocabulary::Effect;

pub const INVENTORY_SLOTS: usize = 3;

/// A compiled item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub art: String,
    /// Cursed items cannot be unequipped.
    pub is_cursed: bool,
    /// `None` for items that are never used up.
    pub remaining_charges: Option<u32>,
    pub effects_on_use: Vec<Effect>,
    pub effects_on_equip: Vec<Effect>,
    pub effects_on_unequip: Vec<Effect>,
}

impl Item {
    pub fn is_consumable(&self) -> bool {
        self.remaining_charges.is_some()
    }
}

/// Fixed-size inventory. Slots are addressed by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    slots: [Option<Item>; INVENTORY_SLOTS],
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[Option<Item>] {
        &self.slots
    }

    pub fn get(&self, slot: usize) -> Option<&Item> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_some())
    }

    pub fn has_item(&self, item_id: &str) -> bool {
        self.slots.iter().flatten().any(|item| item.id == item_id)
    }

    /// Place the item in the first free slot. Returns the slot index, or
    /// `None` (leaving the inventory untouched) when every slot is taken.
    pub fn add(&mut self, item: Item) -> Option<usize> {
        let free = self.slots.iter().position(|slot| slot.is_none())?;
        self.slots[free] = Some(item);
        Some(free)
    }

    /// Take the item out of `slot`. Cursed items stay put.
    pub fn remove(&mut self, slot: usize) -> Option<Item> {
        let entry = self.slots.get_mut(slot)?;
        if entry.as_ref().is_some_and(|item| item.is_cursed) {
            return None;
        }
        entry.take()
    }

    /// Spend one charge of a consumable item, clearing the slot when it
    /// runs out. Returns true if the item was used up.
    pub(crate) fn consume_charge(&mut self, slot: usize) -> bool {
        let Some(entry) = self.slots.get_mut(slot) else {
            return false;
        };
        let exhausted = match entry.as_mut().and_then(|item| item.remaining_charges.as_mut()) {
            Some(charges) => {
                *charges = charges.saturating_sub(1);
                *charges == 0
            }
            None => false,
        };
        if exhausted {
            *entry = None;
        }
        exhausted
    }
}
