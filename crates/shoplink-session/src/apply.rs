//! # Reconciliation Applier
//!
//! Writes the server-computed inventory back into live containers.
//!
//! Application is positional: slot `n` of the target overwrites slot `n`
//! of the container whenever the two differ, and live slots with no
//! target record are cleared. The server is the authority on where
//! everything ends up; the applier never merges or repacks. It is only
//! safe after the confirm equality guard has validated the live state,
//! because it overwrites blindly rather than reconciling quantities.
//!
//! A failed slot write aborts the remaining slots and surfaces to the
//! caller; there is no cross-slot atomicity.
//!
//! ## Combined Inventory Layout
//! The checkout endpoint returns the player inventory as one combined
//! table, indexed the way the game addresses it:
//! ```text
//! ┌──────────────┬───────────────┬──────────────┐
//! │ slots 0..36  │ slots 36..40  │ slot 40      │
//! │ main grid    │ armor         │ offhand      │
//! └──────────────┴───────────────┴──────────────┘
//! ```

use shoplink_core::SlotTable;
use tracing::debug;

use crate::container::{LiveInventory, SlotContainer};
use crate::error::{SessionError, SessionResult};
use crate::state::PendingPurchase;

/// Main-grid slot count in the combined inventory table.
pub const MAIN_SLOTS: u32 = 36;
/// Armor slot count.
pub const ARMOR_SLOTS: u32 = 4;
/// Offhand slot count.
pub const OFFHAND_SLOTS: u32 = 1;
/// Total combined size.
pub const COMBINED_SLOTS: u32 = MAIN_SLOTS + ARMOR_SLOTS + OFFHAND_SLOTS;

// =============================================================================
// Single-container apply
// =============================================================================

/// Reconciles `container` against `target`, slot by slot over
/// `[0, target.size)`. Slots already holding the target record are left
/// alone. Returns the number of slots written.
pub fn apply_slot_table(
    container: &mut dyn SlotContainer,
    target: &SlotTable,
) -> SessionResult<u32> {
    let mut written = 0;
    for slot in 0..target.size {
        let desired = target.record(slot).cloned();
        if container.record(slot) != desired {
            container.set_record(slot, desired)?;
            written += 1;
        }
    }
    Ok(written)
}

// =============================================================================
// Full-purchase apply
// =============================================================================

/// Splits the combined inventory table into its three regions.
fn split_combined(combined: &SlotTable) -> SessionResult<(SlotTable, SlotTable, SlotTable)> {
    let mut main = SlotTable::new(MAIN_SLOTS);
    let mut armor = SlotTable::new(ARMOR_SLOTS);
    let mut offhand = SlotTable::new(OFFHAND_SLOTS);

    for (slot, record) in combined.iter() {
        match slot {
            s if s < MAIN_SLOTS => {
                main.items.insert(s, record.clone());
            }
            s if s < MAIN_SLOTS + ARMOR_SLOTS => {
                armor.items.insert(s - MAIN_SLOTS, record.clone());
            }
            s if s < COMBINED_SLOTS => {
                offhand.items.insert(s - MAIN_SLOTS - ARMOR_SLOTS, record.clone());
            }
            s => {
                return Err(SessionError::ApplyFailed {
                    reason: format!(
                        "combined inventory slot {s} ({}) exceeds the {COMBINED_SLOTS}-slot layout",
                        record.item_id
                    ),
                });
            }
        }
    }
    Ok((main, armor, offhand))
}

/// Applies a fetched purchase across the live regions. The vault is
/// only touched when the purchase carries one. Returns total slots
/// written; a failed write aborts the remainder.
pub fn apply_purchase(
    live: &mut LiveInventory<'_>,
    purchase: &PendingPurchase,
) -> SessionResult<u32> {
    let (main, armor, offhand) = split_combined(&purchase.inventory)?;

    let mut written = 0;
    written += apply_slot_table(live.main, &main)?;
    written += apply_slot_table(live.armor, &armor)?;
    written += apply_slot_table(live.offhand, &offhand)?;
    if let Some(vault) = &purchase.vault {
        written += apply_slot_table(live.vault, vault)?;
    }

    debug!(written, "Purchase applied to live inventory");
    Ok(written)
}

// =============================================================================
// Unit Tests
// =============================================================================
