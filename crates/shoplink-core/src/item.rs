//! # Item Data Model
//!
//! Item records, slot tables, inventory snapshots, and identity keys.
//!
//! ## Model Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Inventory Data Model                               │
//! │                                                                         │
//! │  Snapshot                                                              │
//! │  ├── main:    SlotTable { size, items: { idx → ItemRecord } }          │
//! │  ├── armor:   SlotTable                                                │
//! │  ├── offhand: SlotTable                                                │
//! │  └── vault:   SlotTable   (the player's private vault container)       │
//! │                                                                         │
//! │  ItemRecord { item_id, count > 0, tag? }                               │
//! │                                                                         │
//! │  Slot tables are SPARSE: an absent index is an empty slot. A present   │
//! │  record ALWAYS has count > 0 - "zero of something" is not a record.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Keys
//! Two stacks are "the same kind of item" iff `item_id` matches AND their
//! metadata tags are equal. The identity key collapses that pair into a
//! single string: the item id, plus a stable hash of the canonically
//! encoded tag when one is present. Slot position plays no part.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{CoreError, CoreResult};
use crate::tag::TagValue;
use crate::EMPTY_ITEM_ID;

// =============================================================================
// Item Record
// =============================================================================

/// One occupied inventory slot: an item stack with optional metadata.
///
/// ## Design Notes
/// Constructed explicitly via [`ItemRecord::new`] - there is no partially
/// initialized form. The `count > 0` invariant is checked at the boundary
/// so every record in a `SlotTable` can be trusted downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// Namespaced item identifier, e.g. `minecraft:iron_ingot`.
    pub item_id: String,

    /// Stack size. Always > 0; empty slots carry no record.
    pub count: u32,

    /// Metadata tag document, if the stack has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<TagValue>,
}

impl ItemRecord {
    /// Creates a record, enforcing the `count > 0` invariant.
    pub fn new(item_id: impl Into<String>, count: u32, tag: Option<TagValue>) -> CoreResult<Self> {
        let item_id = item_id.into();
        if count == 0 {
            return Err(CoreError::InvalidRecord {
                item_id,
                reason: "count must be positive".to_string(),
            });
        }
        Ok(ItemRecord { item_id, count, tag })
    }

    /// True if this wire record actually denotes an empty slot.
    ///
    /// The marketplace sometimes sends explicit air/zero-count entries
    /// instead of omitting the slot; both must read as empty.
    pub fn is_air(&self) -> bool {
        self.item_id == EMPTY_ITEM_ID || self.count == 0
    }

    /// The identity key of this stack (see [`identity_key`]).
    pub fn identity_key(&self) -> String {
        identity_key(&self.item_id, self.tag.as_ref())
    }
}

// =============================================================================
// Identity Key
// =============================================================================

/// Derives the identity key for an item id plus optional metadata tag.
///
/// - No tag: the bare item id (`"minecraft:iron_ingot"`).
/// - With tag: item id + `#` + zero-padded hex xxh3 of the canonical
///   encoded-tag JSON (`"minecraft:sword#1f2e3d4c5b6a7988"`).
///
/// Hashing the *encoded* form with sorted compound keys makes the key
/// insensitive to field insertion order.
pub fn identity_key(item_id: &str, tag: Option<&TagValue>) -> String {
    match tag {
        None => item_id.to_string(),
        Some(tag) => {
            let hash = xxh3_64(tag.canonical_json().as_bytes());
            format!("{item_id}#{hash:016x}")
        }
    }
}

/// Formats an item id for chat display: strips the namespace and converts
/// `snake_case` to Title Case (`minecraft:iron_ingot` → `Iron Ingot`).
pub fn display_name(item_id: &str) -> String {
    let bare = match item_id.split_once(':') {
        Some((_, name)) => name,
        None => item_id,
    };
    let mut out = String::with_capacity(bare.len());
    for part in bare.split('_').filter(|p| !p.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

// =============================================================================
// Slot Table
// =============================================================================

/// An indexed container region: a fixed size and a sparse map of occupied
/// slots.
///
/// ## Invariants
/// - Every present record has `count > 0`
/// - Indices are `< size` (the marketplace controls `size`; out-of-range
///   indices are ignored by the applier rather than trusted)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotTable {
    /// Total slot count of the region, occupied or not.
    pub size: u32,

    /// Occupied slots only. JSON object keys are stringified indices.
    #[serde(default)]
    pub items: BTreeMap<u32, ItemRecord>,
}

impl SlotTable {
    /// Creates an empty table of the given size.
    pub fn new(size: u32) -> Self {
        SlotTable {
            size,
            items: BTreeMap::new(),
        }
    }

    /// Builds a table from a dense slot listing, skipping empty slots.
    pub fn from_records<I>(size: u32, records: I) -> Self
    where
        I: IntoIterator<Item = (u32, Option<ItemRecord>)>,
    {
        let items = records
            .into_iter()
            .filter_map(|(index, record)| match record {
                Some(r) if !r.is_air() => Some((index, r)),
                _ => None,
            })
            .collect();
        SlotTable { size, items }
    }

    /// The record at an index, if the slot is occupied.
    pub fn record(&self, index: u32) -> Option<&ItemRecord> {
        self.items.get(&index)
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.items.len()
    }

    /// Iterates occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &ItemRecord)> {
        self.items.iter().map(|(index, record)| (*index, record))
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// A by-value capture of every inventory region a shop transaction can
/// touch.
///
/// ## Why by value?
/// The snapshot is the baseline for the stale-inventory guard: confirm
/// compares the live inventory against it slot by slot. A snapshot that
/// aliased live slots would mutate along with them and the guard would
/// never fire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Main inventory region (hotbar + backpack).
    pub main: SlotTable,

    /// Worn armor region.
    pub armor: SlotTable,

    /// Offhand region.
    pub offhand: SlotTable,

    /// Private vault region (the ender chest).
    pub vault: SlotTable,
}

impl Snapshot {
    /// Iterates all regions in a fixed order.
    pub fn regions(&self) -> impl Iterator<Item = &SlotTable> {
        [&self.main, &self.armor, &self.offhand, &self.vault].into_iter()
    }

    /// Total occupied slots across all regions, for logging.
    pub fn occupied(&self) -> usize {
        self.regions().map(SlotTable::occupied).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TagValue;

    fn enchanted_tag(order_flipped: bool) -> TagValue {
        // Same logical tag, built in two different insertion orders
        let fields: Vec<(&str, TagValue)> = if order_flipped {
            vec![
                ("lvl", TagValue::Int(3)),
                ("id", TagValue::String("sharpness".into())),
            ]
        } else {
            vec![
                ("id", TagValue::String("sharpness".into())),
                ("lvl", TagValue::Int(3)),
            ]
        };
        TagValue::compound(fields)
    }

    #[test]
    fn test_record_rejects_zero_count() {
        assert!(ItemRecord::new("minecraft:stone", 0, None).is_err());
        assert!(ItemRecord::new("minecraft:stone", 1, None).is_ok());
    }

    #[test]
    fn test_identity_key_without_tag_is_item_id() {
        assert_eq!(identity_key("ore", None), "ore");
        let record = ItemRecord::new("minecraft:iron_ingot", 5, None).unwrap();
        assert_eq!(record.identity_key(), "minecraft:iron_ingot");
    }

    #[test]
    fn test_identity_key_stable_under_field_reorder() {
        let a = identity_key("minecraft:sword", Some(&enchanted_tag(false)));
        let b = identity_key("minecraft:sword", Some(&enchanted_tag(true)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_key_differs_by_tag() {
        let plain = identity_key("minecraft:sword", None);
        let tagged = identity_key("minecraft:sword", Some(&enchanted_tag(false)));
        assert_ne!(plain, tagged);

        let other_tag = TagValue::compound([("lvl", TagValue::Int(4))]);
        let other = identity_key("minecraft:sword", Some(&other_tag));
        assert_ne!(tagged, other);
    }

    #[test]
    fn test_air_records_are_skipped() {
        let table = SlotTable::from_records(
            5,
            vec![
                (0, Some(ItemRecord::new("minecraft:stone", 3, None).unwrap())),
                (
                    1,
                    Some(ItemRecord {
                        item_id: EMPTY_ITEM_ID.to_string(),
                        count: 1,
                        tag: None,
                    }),
                ),
                (2, None),
            ],
        );
        assert_eq!(table.occupied(), 1);
        assert!(table.record(0).is_some());
        assert!(table.record(1).is_none());
    }

    #[test]
    fn test_slot_table_wire_shape() {
        let mut table = SlotTable::new(27);
        table.items.insert(
            3,
            ItemRecord::new("minecraft:gold_ingot", 7, None).unwrap(),
        );
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["size"], 27);
        // Map keys serialize as strings
        assert_eq!(json["items"]["3"]["itemId"], "minecraft:gold_ingot");
        assert_eq!(json["items"]["3"]["count"], 7);
        assert!(json["items"]["3"].get("tag").is_none());

        let back: SlotTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_snapshot_equality_is_slot_by_slot() {
        let mut a = Snapshot::default();
        a.main = SlotTable::new(36);
        a.main
            .items
            .insert(0, ItemRecord::new("minecraft:stone", 3, None).unwrap());
        let mut b = a.clone();
        assert_eq!(a, b);

        // One-slot count drift breaks equality
        b.main.items.get_mut(&0).unwrap().count = 2;
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("minecraft:iron_ingot"), "Iron Ingot");
        assert_eq!(display_name("gem"), "Gem");
        assert_eq!(display_name("modpack:super_rare_gem"), "Super Rare Gem");
    }
}
