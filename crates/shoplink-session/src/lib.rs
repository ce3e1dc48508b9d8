//! # shoplink-session: Checkout Session Lifecycle
//!
//! Owns everything stateful between "player types the shop command" and
//! "items appear in their inventory": the session registry, the state
//! machine, the stale-inventory guard, and the reconciliation applier.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Crate Layout                               │
//! │                                                                         │
//! │  ┌──────────────┐      ┌──────────────┐      ┌──────────────────────┐  │
//! │  │   workflow   │─────▶│    store     │      │      container       │  │
//! │  │ ShopWorkflow │      │ SessionStore │      │ SlotContainer trait  │  │
//! │  │ (lifecycle)  │      │ (RwLock map) │      │ LiveInventory bundle │  │
//! │  └──────┬───────┘      └──────────────┘      └──────────┬───────────┘  │
//! │         │                                               │              │
//! │         │              ┌──────────────┐      ┌──────────▼───────────┐  │
//! │         └─────────────▶│    state     │      │        apply         │  │
//! │                        │ SessionState │      │  positional applier  │  │
//! │                        │ (transitions)│      │  (notify-then-apply) │  │
//! │                        └──────────────┘      └──────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Guarantees
//! - **One session per player**: opening a new session supersedes and
//!   cancels the old one.
//! - **Stale-inventory guard**: a purchase is only applied if the live
//!   inventory still matches the snapshot the website priced against;
//!   on drift the session is destroyed before anything is touched.
//! - **Notify-then-apply**: the server records the purchase as applied
//!   before a single live slot changes. A retryable notification failure
//!   leaves the game untouched and the session waiting for another
//!   attempt; a terminal failure destroys the session.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod apply;
pub mod container;
pub mod error;
pub mod state;
pub mod store;
pub mod workflow;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use apply::{apply_purchase, apply_slot_table};
pub use container::{capture_table, LiveInventory, MoneyRemoval, Region, SlotContainer, VecContainer};
pub use error::{SessionError, SessionResult};
pub use state::{PendingPurchase, Session, SessionState};
pub use store::SessionStore;
pub use workflow::{
    summary_lines, CancelOutcome, CheckoutReady, ConfirmOutcome, InitiateOutcome, ShopWorkflow,
};
