//! # Shop Workflow
//!
//! Orchestrates the full purchase lifecycle over a [`ShopApi`] and the
//! [`SessionStore`].
//!
//! ## Commit Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Confirm: notify THEN apply                           │
//! │                                                                         │
//! │   1. Guard: live inventory still matches the session snapshot?          │
//! │      └── mismatch: session removed, nothing applied                     │
//! │   2. POST /applied/{uuid}  ◀── server commits FIRST                     │
//! │      └── retryable failure: session stays AwaitingConfirm               │
//! │      └── terminal failure:  session removed, nothing applied            │
//! │   3. Overwrite live slots  ◀── game commits SECOND                      │
//! │      └── failure here is a true divergence (server says applied,        │
//! │          game says not): logged fatal, never retried                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use shoplink_api::{InitiateRequest, RegionPayload, ShopApi, ShopApiConfig};
use shoplink_core::diff::diff;
use shoplink_core::item::display_name;
use shoplink_core::{InventoryDiff, ItemRecord, MAX_SHOP_LABEL_LEN};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::apply::apply_purchase;
use crate::container::LiveInventory;
use crate::error::{SessionError, SessionResult};
use crate::state::{PendingPurchase, Session, SessionState};
use crate::store::SessionStore;

// =============================================================================
// Outcomes
// =============================================================================

/// Result of opening a session.
#[derive(Debug, Clone)]
pub struct InitiateOutcome {
    pub session_id: Uuid,
    /// Browser link for the player.
    pub link: String,
    /// Chat-safe shop label, truncated to [`MAX_SHOP_LABEL_LEN`].
    pub label: String,
    /// Total count of money items credited to the website.
    pub money_removed: u64,
}

/// Result of fetching the post-purchase inventory.
#[derive(Debug, Clone)]
pub struct CheckoutReady {
    pub session_id: Uuid,
    pub label: String,
    /// What the purchase will change, by item identity.
    pub diff: InventoryDiff,
}

/// Result of confirming a purchase in-game.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    pub label: String,
    pub diff: InventoryDiff,
    /// Live slots the applier rewrote.
    pub slots_written: u32,
}

/// Result of cancelling a session.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub label: String,
    /// Money items to hand back to the player.
    pub refund: Vec<ItemRecord>,
}

/// Truncates a label to the chat-safe length, on a char boundary.
fn truncate_label(label: &str) -> String {
    label.chars().take(MAX_SHOP_LABEL_LEN).collect()
}

/// Renders a diff as chat lines, one change per line, display names
/// instead of raw item ids.
pub fn summary_lines(diff: &InventoryDiff) -> Vec<String> {
    let name_of = |key: &str| display_name(key.split('#').next().unwrap_or(key));
    let mut lines = Vec::with_capacity(diff.added.len() + diff.removed.len());
    for change in &diff.added {
        lines.push(format!("+ {} {}", change.count, name_of(&change.key)));
    }
    for change in &diff.removed {
        lines.push(format!("- {} {}", change.count, name_of(&change.key)));
    }
    lines
}

// =============================================================================
// Workflow
// =============================================================================

/// The purchase lifecycle driver. Generic over the API so tests run
/// against an in-memory fake. Owns nothing global: the store and the
/// client are injected and shared by `Arc`.
pub struct ShopWorkflow<A: ShopApi> {
    api: Arc<A>,
    store: Arc<SessionStore>,
    config: ShopApiConfig,
}

impl<A: ShopApi> ShopWorkflow<A> {
    pub fn new(api: Arc<A>, store: Arc<SessionStore>, config: ShopApiConfig) -> Self {
        ShopWorkflow { api, store, config }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    // =========================================================================
    // Initiate
    // =========================================================================

    /// Opens a session: strips money items, uploads the inventory
    /// snapshot, and registers the session locally once the server has
    /// confirmed it. A failed initiate stores nothing, restores the
    /// stripped money, and leaves any previous session untouched.
    ///
    /// An existing session for the same player is superseded, but only
    /// once the new session is confirmed: removed locally, cancelled
    /// remotely fire-and-forget, and its money refund carried over into
    /// the new session.
    pub async fn initiate(
        &self,
        player_id: &str,
        shop_slug: &str,
        label: &str,
        live: &mut LiveInventory<'_>,
    ) -> SessionResult<InitiateOutcome> {
        let previous = self.store.find_for_player(player_id).await;

        let removals = live.remove_money_items(|id| self.config.is_money_item(id))?;
        let snapshot = live.capture();

        let request = InitiateRequest {
            player_id: player_id.to_string(),
            shop_slug: shop_slug.to_string(),
            inventories: RegionPayload::from(&snapshot),
        };

        let ticket = match self.api.initiate(request).await {
            Ok(ticket) => ticket,
            Err(e) => {
                // The website never saw the money; give it back. The
                // pending session is simply never stored, and a previous
                // session (holding its own refund) stays registered.
                if let Err(restore) = live.restore_money_items(removals) {
                    error!(player_id, error = %restore, "Failed to restore money items after failed initiate");
                }
                return Err(e.into());
            }
        };

        let mut carried_refund = Vec::new();
        if let Some(old) = previous {
            info!(player_id, old_session = %old.id, "Superseding existing session");
            self.store.remove(old.id).await;
            carried_refund = old.removed_money;
            let api = Arc::clone(&self.api);
            let (old_id, old_code) = (old.id, old.auth_code);
            tokio::spawn(async move {
                if let Err(e) = api.cancel(old_id, &old_code).await {
                    warn!(session_id = %old_id, error = %e, "Best-effort cancel of superseded session failed");
                }
            });
        }

        let money_removed: u64 = removals.iter().map(|r| u64::from(r.record.count)).sum();
        let mut removed_money: Vec<ItemRecord> =
            removals.into_iter().map(|r| r.record).collect();
        removed_money.extend(carried_refund);

        let mut session = Session::pending(
            player_id,
            truncate_label(label),
            snapshot,
            removed_money,
        );
        session.promote(ticket.session_id, ticket.link.clone(), ticket.auth_code);
        let label = session.label.clone();
        self.store.insert(session).await;

        info!(player_id, session_id = %ticket.session_id, shop = %label, "Shop session opened");
        Ok(InitiateOutcome {
            session_id: ticket.session_id,
            link: ticket.link,
            label,
            money_removed,
        })
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Fetches the post-purchase inventory for an open session and
    /// reports what the purchase will change.
    pub async fn request_checkout(
        &self,
        player_id: &str,
        session_id: Uuid,
    ) -> SessionResult<CheckoutReady> {
        let session = self.owned_session(player_id, session_id).await?;
        self.transition(session_id, SessionState::CheckoutRequested, session.state)
            .await?;

        let response = match self.api.checkout(session_id, &session.auth_code).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_session_gone() {
                    warn!(%session_id, "Server no longer knows the session, dropping it");
                    self.store.remove(session_id).await;
                } else {
                    // Fetch can be retried; back to Open.
                    self.store
                        .update(session_id, |s| s.transition_to(SessionState::Open))
                        .await;
                }
                return Err(e.into());
            }
        };

        let purchase = PendingPurchase {
            inventory: response.inventory,
            vault: response.vault,
        };
        let summary = diff(&session.original, &purchase.targets());

        let stored = self
            .store
            .update(session_id, |s| {
                s.purchase = Some(purchase);
                s.transition_to(SessionState::AwaitingConfirm)
            })
            .await;
        if stored != Some(true) {
            // Cancelled out from under us while the fetch was in
            // flight; the remover won.
            return Err(SessionError::NotFound(session_id));
        }

        info!(%session_id, added = summary.added.len(), removed = summary.removed.len(), "Checkout fetched");
        Ok(CheckoutReady {
            session_id,
            label: session.label,
            diff: summary,
        })
    }

    // =========================================================================
    // Confirm
    // =========================================================================

    /// Confirms the purchase: stale-inventory guard, then notify the
    /// server, then (and only then) overwrite the live inventory.
    pub async fn confirm(
        &self,
        player_id: &str,
        session_id: Uuid,
        live: &mut LiveInventory<'_>,
    ) -> SessionResult<ConfirmOutcome> {
        let session = self.owned_session(player_id, session_id).await?;
        let purchase = match (session.state, session.purchase.clone()) {
            (SessionState::AwaitingConfirm, Some(purchase)) => purchase,
            _ => {
                return Err(SessionError::WrongState {
                    required: SessionState::AwaitingConfirm,
                    actual: session.state,
                })
            }
        };

        // Stale-inventory guard: the purchase was priced against the
        // snapshot; a drifted inventory would be silently clobbered.
        // The session is unconditionally destroyed on mismatch.
        if live.capture() != session.original {
            warn!(%session_id, "Live inventory diverged from session snapshot, aborting");
            self.store.remove(session_id).await;
            return Err(SessionError::InventoryChanged);
        }

        if let Err(e) = self.api.notify_applied(session_id, &session.auth_code).await {
            if e.is_retryable() {
                // Session stays AwaitingConfirm for another attempt.
                return Err(e.into());
            }
            warn!(%session_id, error = %e, "Applied notification rejected, destroying session");
            self.store.remove(session_id).await;
            return Err(e.into());
        }

        // Winner takes the session; a racing cancel loses from here on.
        // Losing here after a successful notification is the same
        // server/game divergence as a failed apply: the server has the
        // purchase applied, the game never will.
        if self
            .store
            .take_if(session_id, |s| s.state == SessionState::AwaitingConfirm)
            .await
            .is_none()
        {
            error!(%session_id, "Server marked purchase applied but the session was removed before apply");
            return Err(SessionError::NotFound(session_id));
        }

        let summary = diff(&session.original, &purchase.targets());
        let slots_written = match apply_purchase(live, &purchase) {
            Ok(written) => written,
            Err(e) => {
                // The server has already recorded the purchase as
                // applied. This divergence cannot be undone remotely;
                // it needs an operator.
                error!(%session_id, error = %e, "Server marked purchase applied but in-game apply failed");
                return Err(e);
            }
        };

        info!(%session_id, slots_written, "Purchase applied");
        Ok(ConfirmOutcome {
            label: session.label,
            diff: summary,
            slots_written,
        })
    }

    // =========================================================================
    // Cancel / Inspect
    // =========================================================================

    /// Abandons a session, permitted while Open or AwaitingConfirm.
    /// The remote cancel is best-effort; the local session is gone
    /// either way, and the money refund is returned for the host to
    /// hand back.
    pub async fn cancel(&self, player_id: &str, session_id: Uuid) -> SessionResult<CancelOutcome> {
        let session = self.owned_session(player_id, session_id).await?;
        if !matches!(
            session.state,
            SessionState::Open | SessionState::AwaitingConfirm
        ) {
            return Err(SessionError::WrongState {
                required: SessionState::Open,
                actual: session.state,
            });
        }

        let Some(session) = self
            .store
            .take_if(session_id, |s| {
                matches!(s.state, SessionState::Open | SessionState::AwaitingConfirm)
            })
            .await
        else {
            // Lost a race with confirm or another cancel.
            return Err(SessionError::NotFound(session_id));
        };

        if let Err(e) = self.api.cancel(session_id, &session.auth_code).await {
            warn!(%session_id, error = %e, "Remote cancel failed, session dropped locally anyway");
        }

        info!(%session_id, "Session cancelled");
        Ok(CancelOutcome {
            label: session.label,
            refund: session.removed_money,
        })
    }

    /// What the pending purchase will change, for the confirm prompt.
    pub async fn diff_summary(&self, session_id: Uuid) -> SessionResult<InventoryDiff> {
        let session = self
            .store
            .get(session_id)
            .await
            .ok_or(SessionError::NotFound(session_id))?;
        match session.purchase {
            Some(purchase) => Ok(diff(&session.original, &purchase.targets())),
            None => Err(SessionError::WrongState {
                required: SessionState::AwaitingConfirm,
                actual: session.state,
            }),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// The session, if it exists and belongs to `player_id`. A session
    /// owned by someone else is reported as missing, not as forbidden.
    async fn owned_session(&self, player_id: &str, session_id: Uuid) -> SessionResult<Session> {
        self.store
            .get(session_id)
            .await
            .filter(|s| s.player_id == player_id)
            .ok_or(SessionError::NotFound(session_id))
    }

    /// Transitions the stored session, mapping failures to typed errors.
    async fn transition(
        &self,
        session_id: Uuid,
        next: SessionState,
        current: SessionState,
    ) -> SessionResult<()> {
        let moved = self
            .store
            .update(session_id, |s| s.transition_to(next))
            .await
            .ok_or(SessionError::NotFound(session_id))?;
        if !moved {
            return Err(SessionError::WrongState {
                required: next,
                actual: current,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::COMBINED_SLOTS;
    use crate::container::{SlotContainer, VecContainer};
    use shoplink_api::{ApiError, ApiResult, CheckoutResponse, SessionTicket};
    use shoplink_core::SlotTable;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    const SESSION_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    // =========================================================================
    // In-memory fake API
    // =========================================================================

    #[derive(Default)]
    struct MockShopApi {
        calls: Mutex<Vec<String>>,
        checkout_response: Mutex<Option<CheckoutResponse>>,
        fail_initiate: AtomicBool,
        applied_wrong_message: AtomicBool,
        applied_transport_down: AtomicBool,
        checkout_gone: AtomicBool,
        /// Simulates a cancel racing in between the applied call and the
        /// local apply: the session vanishes while the server commits.
        drop_on_applied: Mutex<Option<(Arc<SessionStore>, Uuid)>>,
    }

    impl MockShopApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn set_checkout_response(&self, response: CheckoutResponse) {
            *self.checkout_response.lock().unwrap() = Some(response);
        }
    }

    impl ShopApi for MockShopApi {
        async fn initiate(&self, _request: InitiateRequest) -> ApiResult<SessionTicket> {
            self.calls.lock().unwrap().push("initiate".into());
            if self.fail_initiate.load(Ordering::SeqCst) {
                return Err(ApiError::Transport("connection refused".into()));
            }
            Ok(SessionTicket {
                session_id: Uuid::parse_str(SESSION_ID).unwrap(),
                link: "https://shop.example.com/s/abc".into(),
                auth_code: "123456".into(),
            })
        }

        async fn checkout(&self, _session_id: Uuid, _code: &str) -> ApiResult<CheckoutResponse> {
            self.calls.lock().unwrap().push("checkout".into());
            if self.checkout_gone.load(Ordering::SeqCst) {
                return Err(ApiError::remote(404, "Shop instance not found"));
            }
            Ok(self
                .checkout_response
                .lock()
                .unwrap()
                .clone()
                .expect("checkout response not configured"))
        }

        async fn notify_applied(&self, _session_id: Uuid, _code: &str) -> ApiResult<()> {
            self.calls.lock().unwrap().push("applied".into());
            if self.applied_transport_down.load(Ordering::SeqCst) {
                return Err(ApiError::Transport("connection reset".into()));
            }
            let racing_drop = self.drop_on_applied.lock().unwrap().take();
            if let Some((store, id)) = racing_drop {
                store.remove(id).await;
            }
            if self.applied_wrong_message.load(Ordering::SeqCst) {
                return Err(ApiError::remote(
                    200,
                    "applied not confirmed: Shop instance updated",
                ));
            }
            Ok(())
        }

        async fn cancel(&self, _session_id: Uuid, _code: &str) -> ApiResult<()> {
            self.calls.lock().unwrap().push("cancel".into());
            Ok(())
        }
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    fn record(id: &str, count: u32) -> ItemRecord {
        ItemRecord::new(id, count, None).unwrap()
    }

    struct Regions {
        main: VecContainer,
        armor: VecContainer,
        offhand: VecContainer,
        vault: VecContainer,
    }

    impl Regions {
        /// Player carrying 2 iron ore and 10 emeralds.
        fn with_ore_and_money() -> Self {
            let mut main = VecContainer::new(36);
            main.set_record(0, Some(record("minecraft:iron_ore", 2)))
                .unwrap();
            main.set_record(8, Some(record("minecraft:emerald", 10)))
                .unwrap();
            Regions {
                main,
                armor: VecContainer::new(4),
                offhand: VecContainer::new(1),
                vault: VecContainer::new(27),
            }
        }

        fn live(&mut self) -> LiveInventory<'_> {
            LiveInventory {
                main: &mut self.main,
                armor: &mut self.armor,
                offhand: &mut self.offhand,
                vault: &mut self.vault,
            }
        }
    }

    /// Server swapped the 2 ore for 5 diamonds.
    fn ore_for_diamonds_checkout() -> CheckoutResponse {
        let mut inventory = SlotTable::new(COMBINED_SLOTS);
        inventory.items.insert(0, record("minecraft:diamond", 5));
        CheckoutResponse {
            inventory,
            vault: None,
        }
    }

    fn workflow(api: &Arc<MockShopApi>) -> ShopWorkflow<MockShopApi> {
        ShopWorkflow::new(
            Arc::clone(api),
            Arc::new(SessionStore::new()),
            ShopApiConfig::default(),
        )
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    #[tokio::test]
    async fn test_full_purchase_flow() {
        let api = Arc::new(MockShopApi::default());
        api.set_checkout_response(ore_for_diamonds_checkout());
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let opened = workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();
        assert_eq!(opened.money_removed, 10);
        assert_eq!(
            workflow.store().get(opened.session_id).await.unwrap().state,
            SessionState::Open
        );

        let ready = workflow
            .request_checkout("player-1", opened.session_id)
            .await
            .unwrap();
        assert_eq!(ready.diff.removed.len(), 1);
        assert_eq!(ready.diff.removed[0].key, "minecraft:iron_ore");
        assert_eq!(ready.diff.removed[0].count, 2);
        assert_eq!(ready.diff.added[0].key, "minecraft:diamond");
        assert_eq!(ready.diff.added[0].count, 5);

        let confirmed = workflow
            .confirm("player-1", opened.session_id, &mut regions.live())
            .await
            .unwrap();
        assert_eq!(confirmed.diff.added[0].count, 5);
        assert!(confirmed.slots_written > 0);

        // Server committed before the game did.
        assert_eq!(api.calls(), vec!["initiate", "checkout", "applied"]);
        assert_eq!(regions.main.record(0).unwrap().item_id, "minecraft:diamond");
        // Session is gone once applied.
        assert!(workflow.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_stale_inventory_guard_destroys_session() {
        let api = Arc::new(MockShopApi::default());
        api.set_checkout_response(ore_for_diamonds_checkout());
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let opened = workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();
        workflow
            .request_checkout("player-1", opened.session_id)
            .await
            .unwrap();

        // Player picks something up mid-checkout.
        regions
            .main
            .set_record(20, Some(record("minecraft:cobblestone", 7)))
            .unwrap();

        let err = workflow
            .confirm("player-1", opened.session_id, &mut regions.live())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InventoryChanged));

        // The server was never told, the inventory never touched, and
        // the session is unconditionally destroyed.
        assert!(!api.calls().contains(&"applied".to_string()));
        assert_eq!(regions.main.record(0).unwrap().item_id, "minecraft:iron_ore");
        assert!(workflow.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_retryable_notify_failure_keeps_session() {
        let api = Arc::new(MockShopApi::default());
        api.set_checkout_response(ore_for_diamonds_checkout());
        api.applied_transport_down.store(true, Ordering::SeqCst);
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let opened = workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();
        workflow
            .request_checkout("player-1", opened.session_id)
            .await
            .unwrap();

        let err = workflow
            .confirm("player-1", opened.session_id, &mut regions.live())
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        // Notify failed, so the game must not change, and the session
        // waits for another attempt.
        assert_eq!(regions.main.record(0).unwrap().item_id, "minecraft:iron_ore");
        assert_eq!(
            workflow.store().get(opened.session_id).await.unwrap().state,
            SessionState::AwaitingConfirm
        );

        // The retry succeeds against the same session.
        api.applied_transport_down.store(false, Ordering::SeqCst);
        workflow
            .confirm("player-1", opened.session_id, &mut regions.live())
            .await
            .unwrap();
        assert_eq!(regions.main.record(0).unwrap().item_id, "minecraft:diamond");
    }

    #[tokio::test]
    async fn test_wrong_applied_message_destroys_session() {
        let api = Arc::new(MockShopApi::default());
        api.set_checkout_response(ore_for_diamonds_checkout());
        api.applied_wrong_message.store(true, Ordering::SeqCst);
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let opened = workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();
        workflow
            .request_checkout("player-1", opened.session_id)
            .await
            .unwrap();

        let err = workflow
            .confirm("player-1", opened.session_id, &mut regions.live())
            .await
            .unwrap_err();
        assert!(!err.is_retryable());

        // An unconfirmed applied is terminal: inventory untouched,
        // session destroyed.
        assert_eq!(regions.main.record(0).unwrap().item_id, "minecraft:iron_ore");
        assert!(workflow.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_checkout_session_gone_drops_local() {
        let api = Arc::new(MockShopApi::default());
        api.checkout_gone.store(true, Ordering::SeqCst);
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let opened = workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();
        let err = workflow
            .request_checkout("player-1", opened.session_id)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Api(ref e) if e.is_session_gone()));
        assert!(workflow.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() {
        let api = Arc::new(MockShopApi::default());
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let err = workflow
            .confirm("player-1", Uuid::new_v4(), &mut regions.live())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sessions_are_player_scoped() {
        let api = Arc::new(MockShopApi::default());
        api.set_checkout_response(ore_for_diamonds_checkout());
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let opened = workflow
            .initiate("alice", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();

        // Someone else's session id reads as missing, not forbidden.
        let err = workflow
            .request_checkout("mallory", opened.session_id)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
        assert_eq!(workflow.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_initiate_strips_money_and_truncates_label() {
        let api = Arc::new(MockShopApi::default());
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let long_label = "The Grand Emporium of Exceedingly Rare and Wonderful Goods";
        let opened = workflow
            .initiate("player-1", "grand-emporium", long_label, &mut regions.live())
            .await
            .unwrap();

        assert_eq!(opened.label.chars().count(), MAX_SHOP_LABEL_LEN);
        assert_eq!(opened.money_removed, 10);
        assert!(regions.main.record(8).is_none(), "emeralds stripped");
        assert_eq!(regions.main.record(0).unwrap().item_id, "minecraft:iron_ore");
    }

    #[tokio::test]
    async fn test_initiate_failure_restores_money_and_stores_nothing() {
        let api = Arc::new(MockShopApi::default());
        api.fail_initiate.store(true, Ordering::SeqCst);
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let err = workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        // Money back in its original slot, no session registered.
        assert_eq!(regions.main.record(8).unwrap().count, 10);
        assert!(workflow.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_reinitiate_supersedes_old_session() {
        let api = Arc::new(MockShopApi::default());
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();
        let second = workflow
            .initiate("player-1", "iron-imports", "Iron Imports", &mut regions.live())
            .await
            .unwrap();

        // One session per player; its refund carries the old money.
        assert_eq!(workflow.store().len().await, 1);
        let session = workflow.store().get(second.session_id).await.unwrap();
        assert_eq!(session.label, "Iron Imports");
        let refund: u64 = session.removed_money.iter().map(|r| u64::from(r.count)).sum();
        assert_eq!(refund, 10);

        // Give the spawned best-effort cancel a chance to run.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert!(api.calls().contains(&"cancel".to_string()));
    }

    #[tokio::test]
    async fn test_failed_reinitiate_keeps_old_session_refund() {
        let api = Arc::new(MockShopApi::default());
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let first = workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();

        api.fail_initiate.store(true, Ordering::SeqCst);
        workflow
            .initiate("player-1", "iron-imports", "Iron Imports", &mut regions.live())
            .await
            .unwrap_err();

        // The supersede must not happen until the new session is
        // confirmed: the first session survives, still holding the
        // stripped emeralds, and cancelling it recovers them.
        assert_eq!(workflow.store().len().await, 1);
        let cancelled = workflow.cancel("player-1", first.session_id).await.unwrap();
        let refund: u64 = cancelled.refund.iter().map(|r| u64::from(r.count)).sum();
        assert_eq!(refund, 10);
    }

    #[tokio::test]
    async fn test_cancel_racing_applied_skips_apply() {
        let api = Arc::new(MockShopApi::default());
        api.set_checkout_response(ore_for_diamonds_checkout());
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let opened = workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();
        workflow
            .request_checkout("player-1", opened.session_id)
            .await
            .unwrap();

        // The session vanishes while the applied call is in flight.
        *api.drop_on_applied.lock().unwrap() =
            Some((Arc::clone(workflow.store()), opened.session_id));

        let err = workflow
            .confirm("player-1", opened.session_id, &mut regions.live())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));

        // The server committed but the losing confirm must not touch
        // the live inventory.
        assert!(api.calls().contains(&"applied".to_string()));
        assert_eq!(regions.main.record(0).unwrap().item_id, "minecraft:iron_ore");
    }

    #[tokio::test]
    async fn test_cancel_refunds_money() {
        let api = Arc::new(MockShopApi::default());
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let opened = workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();
        let cancelled = workflow.cancel("player-1", opened.session_id).await.unwrap();

        assert_eq!(cancelled.refund.len(), 1);
        assert_eq!(cancelled.refund[0].item_id, "minecraft:emerald");
        assert!(workflow.store().is_empty().await);
        assert!(api.calls().contains(&"cancel".to_string()));
    }

    #[tokio::test]
    async fn test_diff_summary_requires_awaiting_confirm() {
        let api = Arc::new(MockShopApi::default());
        api.set_checkout_response(ore_for_diamonds_checkout());
        let workflow = workflow(&api);
        let mut regions = Regions::with_ore_and_money();

        let opened = workflow
            .initiate("player-1", "diamond-deals", "Diamond Deals", &mut regions.live())
            .await
            .unwrap();
        let err = workflow.diff_summary(opened.session_id).await.unwrap_err();
        assert!(matches!(err, SessionError::WrongState { .. }));

        workflow
            .request_checkout("player-1", opened.session_id)
            .await
            .unwrap();
        let summary = workflow.diff_summary(opened.session_id).await.unwrap();
        assert_eq!(summary.removed[0].key, "minecraft:iron_ore");
    }

    #[test]
    fn test_summary_lines_use_display_names() {
        let diff = InventoryDiff {
            added: vec![shoplink_core::InventoryChange {
                key: "minecraft:diamond".into(),
                count: 5,
            }],
            removed: vec![shoplink_core::InventoryChange {
                key: "minecraft:iron_ore#0011223344556677".into(),
                count: 2,
            }],
        };
        let lines = summary_lines(&diff);
        assert_eq!(lines, vec!["+ 5 Diamond", "- 2 Iron Ore"]);
    }

    #[test]
    fn test_truncate_label_char_boundary() {
        let label = "é".repeat(50);
        assert_eq!(truncate_label(&label).chars().count(), MAX_SHOP_LABEL_LEN);
        assert_eq!(truncate_label("short"), "short");
    }
}
