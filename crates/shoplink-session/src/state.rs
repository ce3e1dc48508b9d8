//! # Session State Machine
//!
//! A checkout session walks a one-way street: transitions are monotonic,
//! with two sanctioned exceptions. A failed checkout fetch reverts to
//! Open so the player can retry, and the terminal states absorb
//! everything.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session State Machine                              │
//! │                                                                         │
//! │                       ┌── retry on failure ──┐                          │
//! │                       ▼                      │                          │
//! │  ┌─────────────────┐ ┌──────┐ ┌───────────────────┐ ┌────────────────┐ │
//! │  │ PendingInitiate │▶│ Open │▶│ CheckoutRequested │▶│ AwaitingConfirm│ │
//! │  └────────┬────────┘ └──┬───┘ └─────────┬─────────┘ └───────┬────────┘ │
//! │           │             │               │                   │          │
//! │     (never stored;      │               │                   ▼          │
//! │      discarded on       │               │             ┌──────────┐     │
//! │      initiate failure)  │               │             │ Applied  │ ✓   │
//! │                         │               │             └──────────┘     │
//! │                         └───────┬───────┴──────────┬──────┘            │
//! │                                 ▼                  ▼                   │
//! │                         ┌───────────┐       ┌─────────┐                │
//! │                         │ Cancelled │       │ Expired │                │
//! │                         └───────────┘       └─────────┘                │
//! │                          (from any non-terminal state)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Terminal states (Applied, Cancelled, Expired) never transition again.
//! - A PendingInitiate session is a local provisional entry only. It is
//!   promoted to Open once the server confirms, or discarded entirely;
//!   the store never holds a pending session.
//! - Confirm does not introduce a state: a retryable notification
//!   failure leaves the session in AwaitingConfirm for another attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shoplink_core::{ItemRecord, SlotTable, Snapshot};
use uuid::Uuid;

// =============================================================================
// Session State
// =============================================================================

/// Where a session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created locally, waiting for the server to confirm the initiate.
    /// Never stored: promoted to Open or discarded.
    PendingInitiate,

    /// Session open; the player is browsing the shop website.
    Open,

    /// A checkout fetch is in flight.
    CheckoutRequested,

    /// The post-purchase inventory is attached to the session, waiting
    /// for the player to confirm in-game.
    AwaitingConfirm,

    /// Purchase applied in-game and confirmed by the server. Terminal.
    Applied,

    /// Session abandoned by the player or superseded. Terminal.
    Cancelled,

    /// Server no longer knows the session. Terminal.
    Expired,
}

impl SessionState {
    /// True once the session can never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Applied | SessionState::Cancelled | SessionState::Expired
        )
    }

    /// Whether the state machine permits moving to `next`.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        if self.is_terminal() {
            return false;
        }
        // Any live state may be cancelled or expired.
        if matches!(next, SessionState::Cancelled | SessionState::Expired) {
            return true;
        }
        matches!(
            (self, next),
            (SessionState::PendingInitiate, SessionState::Open)
                | (SessionState::Open, SessionState::CheckoutRequested)
                | (SessionState::CheckoutRequested, SessionState::AwaitingConfirm)
                | (SessionState::CheckoutRequested, SessionState::Open)
                | (SessionState::AwaitingConfirm, SessionState::Applied)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::PendingInitiate => "pending_initiate",
            SessionState::Open => "open",
            SessionState::CheckoutRequested => "checkout_requested",
            SessionState::AwaitingConfirm => "awaiting_confirm",
            SessionState::Applied => "applied",
            SessionState::Cancelled => "cancelled",
            SessionState::Expired => "expired",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// Pending Purchase
// =============================================================================

/// The post-purchase inventory fetched at checkout, attached to the
/// session until the player confirms in-game.
#[derive(Debug, Clone)]
pub struct PendingPurchase {
    /// Combined player inventory (main + armor + offhand) by slot index.
    pub inventory: SlotTable,

    /// Vault contents, absent when the purchase leaves the vault alone.
    pub vault: Option<SlotTable>,
}

impl PendingPurchase {
    /// The slot tables the purchase will install, for diffing.
    pub fn targets(&self) -> Vec<&SlotTable> {
        let mut targets = vec![&self.inventory];
        if let Some(vault) = &self.vault {
            targets.push(vault);
        }
        targets
    }
}

// =============================================================================
// Session
// =============================================================================

/// One checkout session for one player.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session id. Provisional until the server confirms the initiate,
    /// then replaced with the server-assigned id.
    pub id: Uuid,

    /// The player who opened the session.
    pub player_id: String,

    /// Shop label shown in chat, truncated at session start.
    pub label: String,

    /// Browser link to the shop website.
    pub web_link: String,

    /// Two-factor code for session-scoped endpoints. Never shown.
    pub auth_code: String,

    /// Current lifecycle state.
    pub state: SessionState,

    /// Inventory at session start (after money items were removed).
    /// The stale-inventory guard compares against this.
    pub original: Snapshot,

    /// Money items stripped at session start, kept for refund on cancel.
    pub removed_money: Vec<ItemRecord>,

    /// Server-computed purchase, present once state is AwaitingConfirm.
    pub purchase: Option<PendingPurchase>,

    /// When the session was opened.
    pub created_at: DateTime<Utc>,

    /// Last state change.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a provisional session awaiting server confirmation. The
    /// id is a placeholder until [`Session::promote`] installs the
    /// server-assigned one.
    pub fn pending(
        player_id: impl Into<String>,
        label: impl Into<String>,
        original: Snapshot,
        removed_money: Vec<ItemRecord>,
    ) -> Self {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            player_id: player_id.into(),
            label: label.into(),
            web_link: String::new(),
            auth_code: String::new(),
            state: SessionState::PendingInitiate,
            original,
            removed_money,
            purchase: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Installs the server-assigned identity and opens the session.
    pub fn promote(&mut self, id: Uuid, web_link: impl Into<String>, auth_code: impl Into<String>) {
        self.id = id;
        self.web_link = web_link.into();
        self.auth_code = auth_code.into();
        self.transition_to(SessionState::Open);
    }

    /// Moves the session to `next` if the state machine allows it.
    /// Returns false (and leaves the session untouched) otherwise.
    pub fn transition_to(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        self.updated_at = Utc::now();
        true
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
