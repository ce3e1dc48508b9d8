//! # Slot Containers
//!
//! The seam between session logic and the game. A [`SlotContainer`] is
//! anything with numbered slots holding item records; the embedding
//! server implements it over its live player inventory, and tests use
//! [`VecContainer`].
//!
//! ## Regions
//! A player's belongings span four containers:
//! ```text
//! ┌───────────────┬──────────┬─────────────────────────────────────────┐
//! │ Region        │ Slots    │ Contents                                │
//! ├───────────────┼──────────┼─────────────────────────────────────────┤
//! │ main          │ 36       │ Hotbar + main grid                      │
//! │ armor         │ 4        │ Boots, leggings, chestplate, helmet     │
//! │ offhand       │ 1        │ Shield slot                             │
//! │ vault         │ 27       │ Ender chest                             │
//! └───────────────┴──────────┴─────────────────────────────────────────┘
//! ```

use shoplink_core::{ItemRecord, SlotTable, Snapshot};

use crate::error::{SessionError, SessionResult};

// =============================================================================
// Slot Container Trait
// =============================================================================

/// Mutable access to one region of numbered item slots.
///
/// Reads copy by value; the session layer never holds references into
/// live game state. Writes can fail (the host may reject a slot index
/// or an item it cannot represent), and a failed write surfaces to the
/// applier.
pub trait SlotContainer: Send {
    /// Number of slots, fixed for the container's lifetime.
    fn slot_count(&self) -> u32;

    /// The record in `slot`, or None for empty/air slots.
    fn record(&self, slot: u32) -> Option<ItemRecord>;

    /// Overwrites `slot`. None clears the slot.
    fn set_record(&mut self, slot: u32, record: Option<ItemRecord>) -> SessionResult<()>;
}

/// Captures a container into an immutable slot table.
pub fn capture_table(container: &dyn SlotContainer) -> SlotTable {
    let mut table = SlotTable::new(container.slot_count());
    for slot in 0..container.slot_count() {
        if let Some(record) = container.record(slot) {
            if !record.is_air() {
                table.items.insert(slot, record);
            }
        }
    }
    table
}

// =============================================================================
// Live Inventory (four-region bundle)
// =============================================================================

/// Which region a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Main,
    Armor,
    Offhand,
    Vault,
}

/// A money item removed from a specific slot, with enough context to
/// put it back exactly where it was.
#[derive(Debug, Clone)]
pub struct MoneyRemoval {
    pub region: Region,
    pub slot: u32,
    pub record: ItemRecord,
}

/// Borrowed access to all four regions of a player's live inventory.
pub struct LiveInventory<'a> {
    pub main: &'a mut dyn SlotContainer,
    pub armor: &'a mut dyn SlotContainer,
    pub offhand: &'a mut dyn SlotContainer,
    pub vault: &'a mut dyn SlotContainer,
}

impl LiveInventory<'_> {
    /// Captures all four regions into an immutable snapshot.
    pub fn capture(&self) -> Snapshot {
        Snapshot {
            main: capture_table(self.main),
            armor: capture_table(self.armor),
            offhand: capture_table(self.offhand),
            vault: capture_table(self.vault),
        }
    }

    /// Strips every stack whose item id `is_money` from main, offhand,
    /// and vault. Armor is left alone; currency never sits there.
    pub fn remove_money_items(
        &mut self,
        is_money: impl Fn(&str) -> bool,
    ) -> SessionResult<Vec<MoneyRemoval>> {
        let mut removed = Vec::new();
        for (region, container) in [
            (Region::Main, &mut *self.main),
            (Region::Offhand, &mut *self.offhand),
            (Region::Vault, &mut *self.vault),
        ] {
            for slot in 0..container.slot_count() {
                if let Some(record) = container.record(slot) {
                    if is_money(&record.item_id) {
                        container.set_record(slot, None)?;
                        removed.push(MoneyRemoval {
                            region,
                            slot,
                            record,
                        });
                    }
                }
            }
        }
        Ok(removed)
    }

    /// Puts previously removed money items back into their slots.
    /// Used when a session fails before the website could credit them.
    pub fn restore_money_items(&mut self, removed: Vec<MoneyRemoval>) -> SessionResult<()> {
        for removal in removed {
            let container: &mut dyn SlotContainer = match removal.region {
                Region::Main => self.main,
                Region::Armor => self.armor,
                Region::Offhand => self.offhand,
                Region::Vault => self.vault,
            };
            container.set_record(removal.slot, Some(removal.record))?;
        }
        Ok(())
    }
}

// =============================================================================
// Vec-backed Container
// =============================================================================

/// Simple in-memory container backed by a Vec. The reference
/// implementation for tests and headless hosts.
#[derive(Debug, Clone)]
pub struct VecContainer {
    slots: Vec<Option<ItemRecord>>,
}

impl VecContainer {
    pub fn new(size: u32) -> Self {
        VecContainer {
            slots: vec![None; size as usize],
        }
    }

    /// Builds a container prefilled from a slot table.
    pub fn from_table(table: &SlotTable) -> Self {
        let mut container = VecContainer::new(table.size);
        for (slot, record) in table.iter() {
            container.slots[slot as usize] = Some(record.clone());
        }
        container
    }
}

impl SlotContainer for VecContainer {
    fn slot_count(&self) -> u32 {
        self.slots.len() as u32
    }

    fn record(&self, slot: u32) -> Option<ItemRecord> {
        self.slots.get(slot as usize).cloned().flatten()
    }

    fn set_record(&mut self, slot: u32, record: Option<ItemRecord>) -> SessionResult<()> {
        match self.slots.get_mut(slot as usize) {
            Some(cell) => {
                *cell = record;
                Ok(())
            }
            None => Err(SessionError::ApplyFailed {
                reason: format!(
                    "slot {slot} is out of range for a {}-slot container",
                    self.slots.len()
                ),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
