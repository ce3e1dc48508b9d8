//! # Wire Protocol Types
//!
//! Request and response bodies for the marketplace HTTP API. Field names
//! follow the server's camelCase JSON convention.
//!
//! ## Endpoints
//! ```text
//! POST /initiate          InitiateRequest  -> InitiateResponse
//! POST /checkout/{uuid}   CheckoutRequest  -> CheckoutResponse
//! POST /applied/{uuid}    AppliedRequest   -> AppliedResponse
//! POST /cancel/{uuid}     CancelRequest    -> (body ignored)
//! ```

use serde::{Deserialize, Serialize};
use shoplink_core::{SlotTable, Snapshot};
use uuid::Uuid;

/// Exact confirmation message the server returns from the applied
/// endpoint. Anything else means the server did NOT record the purchase
/// as applied, and the local inventory must not change.
pub const APPLIED_CONFIRMATION: &str = "Shop instance marked as applied";

// =============================================================================
// Initiate
// =============================================================================

/// Four inventory regions as the server expects them, keyed by region name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegionPayload {
    pub main_inventory: SlotTable,
    pub armor_inventory: SlotTable,
    pub offhand_inventory: SlotTable,
    pub ender_chest_inventory: SlotTable,
}

impl From<&Snapshot> for RegionPayload {
    fn from(snapshot: &Snapshot) -> Self {
        RegionPayload {
            main_inventory: snapshot.main.clone(),
            armor_inventory: snapshot.armor.clone(),
            offhand_inventory: snapshot.offhand.clone(),
            ender_chest_inventory: snapshot.vault.clone(),
        }
    }
}

impl From<RegionPayload> for Snapshot {
    fn from(payload: RegionPayload) -> Self {
        Snapshot {
            main: payload.main_inventory,
            armor: payload.armor_inventory,
            offhand: payload.offhand_inventory,
            vault: payload.ender_chest_inventory,
        }
    }
}

/// Body of `POST /initiate`: the player, the shop they want, and a full
/// snapshot of what they currently carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub player_id: String,
    pub shop_slug: String,
    pub inventories: RegionPayload,
}

/// Successful answer to `/initiate`. All fields optional at the wire
/// level; the client validates presence before trusting them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub uuid: Option<Uuid>,
    pub link: Option<String>,
    pub two_factor_code: Option<String>,
}

// =============================================================================
// Checkout
// =============================================================================

/// Body of the session-scoped endpoints. The two-factor code proves the
/// caller is the same mod instance that initiated the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TfaBody {
    pub tfa_code: String,
}

/// Answer to `/checkout/{uuid}`: the post-purchase inventory the server
/// computed, split into the combined player inventory and the vault.
/// The vault is omitted when the purchase leaves it untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub inventory: SlotTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<SlotTable>,
}

// =============================================================================
// Applied / Cancel
// =============================================================================

/// Answer to `/applied/{uuid}`. Only [`APPLIED_CONFIRMATION`] counts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppliedResponse {
    pub message: Option<String>,
}

impl AppliedResponse {
    /// True if the server confirmed the applied transition with the
    /// exact expected message.
    pub fn is_confirmed(&self) -> bool {
        self.message.as_deref() == Some(APPLIED_CONFIRMATION)
    }
}

// =============================================================================
// Error body
// =============================================================================

/// Error payload shape. Servers are inconsistent about which key carries
/// the text, so both are accepted.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best-effort extraction of the error text, preferring `message`.
    pub fn text(&self) -> &str {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or("unknown error")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shoplink_core::ItemRecord;

    fn snapshot_with_pickaxe() -> Snapshot {
        let mut main = SlotTable::new(36);
        main.items.insert(
            0,
            ItemRecord::new("minecraft:diamond_pickaxe", 1, None).unwrap(),
        );
        Snapshot {
            main,
            armor: SlotTable::new(4),
            offhand: SlotTable::new(1),
            vault: SlotTable::new(27),
        }
    }

    #[test]
    fn test_initiate_request_wire_shape() {
        let request = InitiateRequest {
            player_id: "8f14e45f-ea3a-4b50-b63a-7d1c6e4b1a11".into(),
            shop_slug: "diamond-deals".into(),
            inventories: RegionPayload::from(&snapshot_with_pickaxe()),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["shopSlug"], "diamond-deals");
        assert!(json["inventories"]["mainInventory"]["items"]["0"]["itemId"]
            .as_str()
            .unwrap()
            .contains("pickaxe"));
        assert!(json["inventories"].get("enderChestInventory").is_some());
    }

    #[test]
    fn test_region_payload_round_trips_snapshot() {
        let snapshot = snapshot_with_pickaxe();
        let payload = RegionPayload::from(&snapshot);
        let back: Snapshot = payload.into();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_initiate_response_tolerates_missing_fields() {
        let response: InitiateResponse = serde_json::from_str("{}").unwrap();
        assert!(response.uuid.is_none());
        assert!(response.link.is_none());
        assert!(response.two_factor_code.is_none());
    }

    #[test]
    fn test_checkout_response_vault_optional() {
        let response: CheckoutResponse =
            serde_json::from_str(r#"{"inventory": {"size": 41, "items": {}}}"#).unwrap();
        assert!(response.vault.is_none());
        assert_eq!(response.inventory.size, 41);
    }

    #[test]
    fn test_applied_confirmation_exact_match() {
        let confirmed = AppliedResponse {
            message: Some(APPLIED_CONFIRMATION.to_string()),
        };
        assert!(confirmed.is_confirmed());

        // Close is not good enough.
        let almost = AppliedResponse {
            message: Some("Shop instance marked as applied.".to_string()),
        };
        assert!(!almost.is_confirmed());
        assert!(!AppliedResponse::default().is_confirmed());
    }

    #[test]
    fn test_error_body_prefers_message_over_error() {
        let both: ErrorBody =
            serde_json::from_str(r#"{"message": "primary", "error": "secondary"}"#).unwrap();
        assert_eq!(both.text(), "primary");

        let only_error: ErrorBody = serde_json::from_str(r#"{"error": "fallback"}"#).unwrap();
        assert_eq!(only_error.text(), "fallback");

        assert_eq!(ErrorBody::default().text(), "unknown error");
    }
}
