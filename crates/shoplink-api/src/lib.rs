//! # shoplink-api: Marketplace HTTP Client
//!
//! Wire protocol types, the [`ShopApi`] trait, its `reqwest`-backed
//! implementation, and remote-error classification.
//!
//! ## Transaction Round Trips
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Marketplace API Round Trips                         │
//! │                                                                         │
//! │  INITIATE                                                              │
//! │  ────────                                                              │
//! │  game ───► POST /initiate { playerId, shopSlug, inventories }          │
//! │  game ◄─── { uuid, link, twoFactorCode }                               │
//! │                                                                         │
//! │  CHECKOUT                                                              │
//! │  ────────                                                              │
//! │  game ───► POST /checkout/{uuid} { tfaCode }                           │
//! │  game ◄─── { inventory: SlotTable, vault: SlotTable }                  │
//! │                                                                         │
//! │  APPLIED (strict confirmation)                                         │
//! │  ─────────────────────────────                                         │
//! │  game ───► POST /applied/{uuid} { tfaCode }                            │
//! │  game ◄─── { "message": "Shop instance marked as applied" }  EXACTLY   │
//! │                                                                         │
//! │  CANCEL (best-effort)                                                  │
//! │  ────────────────────                                                  │
//! │  game ───► POST /cancel/{uuid} { tfaCode }                             │
//! │  game ◄─── opaque                                                      │
//! │                                                                         │
//! │  ERRORS: { "message": "..." } or { "error": "..." }, classified by     │
//! │  case-insensitive substring matching - see error::ShopErrorKind        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;

pub use client::{HttpShopClient, SessionTicket, ShopApi};
pub use config::ShopApiConfig;
pub use error::{ApiError, ApiResult, ShopErrorKind};
pub use protocol::{
    AppliedResponse, CheckoutResponse, InitiateRequest, InitiateResponse, RegionPayload,
    APPLIED_CONFIRMATION,
};
