//! # shoplink-core: Pure Business Logic for Shoplink
//!
//! This crate is the **heart** of Shoplink. It contains the tag codec, the
//! item data model, and the inventory diff engine as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shoplink Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Game Server (command dispatch)                  │   │
//! │  │    /shop <slug> ──► /shopFinish <id> ──► /confirmFinish <id>   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                shoplink-session (orchestration)                 │   │
//! │  │    session store, stale-inventory guard, reconciliation         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shoplink-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │    tag    │  │   item    │  │   diff    │                  │   │
//! │  │   │  TagValue │  │ ItemRecord│  │ Inventory │                  │   │
//! │  │   │ encode/   │  │ SlotTable │  │   Diff    │                  │   │
//! │  │   │ decode    │  │ Snapshot  │  │           │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`tag`] - The tag codec: `TagValue` ↔ JSON with numeric-subtype inference
//! - [`item`] - Item records, slot tables, snapshots, identity keys
//! - [`diff`] - Quantity-based inventory diffing
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Network, file system, and game-engine access is FORBIDDEN here
//! 3. **Canonical Encoding**: Compounds use sorted keys so equal tags encode equally
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use shoplink_core::tag::{decode, encode, TagValue};
//!
//! let mut fields = std::collections::BTreeMap::new();
//! fields.insert("Damage".to_string(), TagValue::Int(12));
//! let tag = TagValue::Compound(fields);
//!
//! // The codec round-trips over the 64-bit-safe subset
//! let json = encode(&tag);
//! assert_eq!(decode(&json).unwrap(), tag);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod diff;
pub mod error;
pub mod item;
pub mod tag;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use shoplink_core::TagValue` instead of
// `use shoplink_core::tag::TagValue`

pub use diff::{InventoryChange, InventoryDiff};
pub use error::{CoreError, CoreResult};
pub use item::{identity_key, ItemRecord, SlotTable, Snapshot};
pub use tag::TagValue;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// The item id that represents an empty slot on the wire.
///
/// ## Why a constant?
/// The marketplace occasionally sends explicit "air" records instead of
/// omitting the slot. Both forms must be treated as an empty slot.
pub const EMPTY_ITEM_ID: &str = "minecraft:air";

/// Maximum length of a shop label before truncation.
///
/// ## Business Reason
/// Longer labels underflow the fixed-width chat border the game server
/// renders around shop prompts.
pub const MAX_SHOP_LABEL_LEN: usize = 40;
