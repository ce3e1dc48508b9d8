//! # Shop API Configuration
//!
//! Configuration for the marketplace HTTP client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOPLINK_API_URL=https://shop.example.com/api/shop                 │
//! │                                                                         │
//! │  2. TOML Config File (shoplink.toml, path supplied by the host)        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8080/api/shop                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # shoplink.toml
//! [api]
//! base_url = "http://localhost:8080/api/shop"
//! connect_timeout_secs = 10
//!
//! [inventory]
//! money_items = ["minecraft:emerald", "minecraft:emerald_block"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ApiError, ApiResult};

// =============================================================================
// API Settings
// =============================================================================

/// HTTP endpoint settings.
///
/// The session-scoped paths carry a `{uuid}` placeholder that the client
/// substitutes with the session id at request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the marketplace API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path for starting a session.
    #[serde(default = "default_initiate_path")]
    pub initiate_path: String,

    /// Path for fetching the post-purchase inventory.
    #[serde(default = "default_checkout_path")]
    pub checkout_path: String,

    /// Path for confirming that the purchase was applied in-game.
    #[serde(default = "default_applied_path")]
    pub applied_path: String,

    /// Path for abandoning a session.
    #[serde(default = "default_cancel_path")]
    pub cancel_path: String,

    /// Connection timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api/shop".to_string()
}
fn default_initiate_path() -> String {
    "/initiate".to_string()
}
fn default_checkout_path() -> String {
    "/checkout/{uuid}".to_string()
}
fn default_applied_path() -> String {
    "/applied/{uuid}".to_string()
}
fn default_cancel_path() -> String {
    "/cancel/{uuid}".to_string()
}
fn default_connect_timeout() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            initiate_path: default_initiate_path(),
            checkout_path: default_checkout_path(),
            applied_path: default_applied_path(),
            cancel_path: default_cancel_path(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Inventory Settings
// =============================================================================

/// Inventory-handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Item ids treated as currency. These are stripped from the
    /// player's inventory when a session starts, since the website
    /// prices the cart from them.
    #[serde(default = "default_money_items")]
    pub money_items: Vec<String>,
}

fn default_money_items() -> Vec<String> {
    vec![
        "minecraft:emerald".to_string(),
        "minecraft:emerald_block".to_string(),
    ]
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            money_items: default_money_items(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete shop client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopApiConfig {
    /// HTTP endpoint settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Inventory-handling settings.
    #[serde(default)]
    pub inventory: InventorySettings,
}

impl ShopApiConfig {
    /// Creates a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (shoplink.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ApiResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            if path.exists() {
                info!(?path, "Loading shop config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ApiError::Parse(format!("cannot read {}: {e}", path.display())))?;
                config = toml::from_str(&contents)
                    .map_err(|e| ApiError::Parse(format!("invalid config: {e}")))?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or falls back to defaults if the load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load shop config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        Url::parse(&self.api.base_url)
            .map_err(|e| ApiError::Parse(format!("invalid base_url '{}': {e}", self.api.base_url)))?;

        for (name, path) in [
            ("initiate_path", &self.api.initiate_path),
            ("checkout_path", &self.api.checkout_path),
            ("applied_path", &self.api.applied_path),
            ("cancel_path", &self.api.cancel_path),
        ] {
            if !path.starts_with('/') {
                return Err(ApiError::Parse(format!(
                    "{name} must start with '/', got: {path}"
                )));
            }
        }

        // The session-scoped paths need somewhere to put the session id.
        for (name, path) in [
            ("checkout_path", &self.api.checkout_path),
            ("applied_path", &self.api.applied_path),
            ("cancel_path", &self.api.cancel_path),
        ] {
            if !path.contains("{uuid}") {
                return Err(ApiError::Parse(format!(
                    "{name} must contain a {{uuid}} placeholder, got: {path}"
                )));
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SHOPLINK_API_URL") {
            debug!(url = %url, "Overriding base URL from environment");
            self.api.base_url = url;
        }

        if let Ok(secs) = std::env::var("SHOPLINK_CONNECT_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse::<u64>() {
                self.api.connect_timeout_secs = parsed;
            }
        }
    }

    /// Returns true if the given item id is configured as currency.
    pub fn is_money_item(&self, item_id: &str) -> bool {
        self.inventory.money_items.iter().any(|id| id == item_id)
    }
}
