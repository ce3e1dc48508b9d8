//! # Inventory Diff Engine
//!
//! Quantity-based inventory deltas keyed by item identity.
//!
//! ## Diff Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Quantity Diff (NOT positional)                       │
//! │                                                                         │
//! │  original: main [ ore x3 ]                                             │
//! │  target:        [ ore x1, gem x5 ]                                     │
//! │                                                                         │
//! │       original multiset        target multiset                         │
//! │       { ore: 3 }               { ore: 1, gem: 5 }                      │
//! │                    │                   │                               │
//! │                    └──── delta per key ┘                               │
//! │                                                                         │
//! │       removed: [ (ore, 2) ]    added: [ (gem, 5) ]                     │
//! │                                                                         │
//! │  Slot positions are discarded on purpose: the marketplace returns an   │
//! │  unrelated slot layout, so only counts are comparable.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Laws
//! - `diff(X, X)` is empty for any X
//! - `diff(A, B).added == diff(B, A).removed` and vice versa

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::item::{identity_key, SlotTable, Snapshot};

// =============================================================================
// Diff Types
// =============================================================================

/// A single quantity change, keyed by item identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryChange {
    /// Identity key (item id, or item id + tag hash).
    pub key: String,

    /// Absolute quantity changed. Always > 0; zero deltas are omitted.
    pub count: u64,
}

impl InventoryChange {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        InventoryChange {
            key: key.into(),
            count,
        }
    }
}

/// The result of diffing an original snapshot against a target inventory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDiff {
    /// Item kinds the player gains, sorted by key.
    pub added: Vec<InventoryChange>,

    /// Item kinds the player loses, sorted by key.
    pub removed: Vec<InventoryChange>,
}

impl InventoryDiff {
    /// True when the target is quantity-identical to the original.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

// =============================================================================
// Diff Computation
// =============================================================================

/// Computes the quantity delta between an original snapshot and a set of
/// target slot tables.
///
/// Both sides are flattened into count-by-identity-key multisets before
/// comparison; every region contributes to the same multiset. Positive
/// per-key deltas land in `added`, negative in `removed`, zero deltas are
/// dropped. Output is sorted by key so the result is deterministic.
pub fn diff(original: &Snapshot, targets: &[&SlotTable]) -> InventoryDiff {
    let mut original_counts: BTreeMap<String, i64> = BTreeMap::new();
    for region in original.regions() {
        accumulate(&mut original_counts, region);
    }

    let mut target_counts: BTreeMap<String, i64> = BTreeMap::new();
    for table in targets {
        accumulate(&mut target_counts, table);
    }

    let mut result = InventoryDiff::default();
    // Walk the union of keys; BTreeMap keeps the output sorted.
    let keys: BTreeMap<&String, ()> = original_counts
        .keys()
        .chain(target_counts.keys())
        .map(|k| (k, ()))
        .collect();

    for (key, ()) in keys {
        let before = original_counts.get(key).copied().unwrap_or(0);
        let after = target_counts.get(key).copied().unwrap_or(0);
        let delta = after - before;
        if delta > 0 {
            result.added.push(InventoryChange::new(key.clone(), delta as u64));
        } else if delta < 0 {
            result
                .removed
                .push(InventoryChange::new(key.clone(), delta.unsigned_abs()));
        }
    }

    result
}

fn accumulate(counts: &mut BTreeMap<String, i64>, table: &SlotTable) {
    for (_, record) in table.iter() {
        if record.is_air() {
            continue;
        }
        let key = identity_key(&record.item_id, record.tag.as_ref());
        *counts.entry(key).or_insert(0) += i64::from(record.count);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
