//! # API Error Types
//!
//! Error types for marketplace communication, including the free-text
//! remote-error classifier.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       API Error Categories                              │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Transport     │  │     Parse       │  │       Remote            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  server not     │  │  malformed      │  │  server answered with   │ │
//! │  │  reachable at   │  │  response body  │  │  an error - classified  │ │
//! │  │  all            │  │                 │  │  into ShopErrorKind     │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ShopErrorKind: already-open, shop-not-found, session-not-found,       │
//! │  expired, empty-cart, permission, maintenance, rate-limited,           │
//! │  invalid-purchase, payment, timeout, network, tfa, other               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Classification Contract
//! The server reports failures as free text. Classification is a
//! case-insensitive substring match over known phrases; everything the
//! player ultimately sees is derived from the classified kind's fixed
//! feedback triad (title / message / help), **never** from the raw server
//! text. The raw text is kept on the error for logs only.

use thiserror::Error;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// API Error
// =============================================================================

/// A failed marketplace call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server could not be reached at all (DNS, connect, TLS, ...).
    #[error("Cannot reach shop server: {0}")]
    Transport(String),

    /// The server answered, but the body was not the expected shape.
    #[error("Malformed shop response: {0}")]
    Parse(String),

    /// The server answered with an error, or with a semantically failed
    /// success body. `message` is raw server text - log it, never show it.
    #[error("Shop error ({kind:?}, status {status}): {message}")]
    Remote {
        kind: ShopErrorKind,
        status: u16,
        message: String,
    },
}

impl ApiError {
    /// Builds a classified remote error from raw server text.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::Remote {
            kind: ShopErrorKind::classify(&message),
            status,
            message,
        }
    }

    /// The classified kind, if this is a remote error.
    pub fn kind(&self) -> Option<ShopErrorKind> {
        match self {
            ApiError::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True if the operation may be retried against the same session.
    ///
    /// ## Retryable
    /// - Transport failures (server unreachable)
    /// - Timeout / network / rate-limit / maintenance classifications
    ///
    /// ## Not Retryable
    /// - Session gone (not found / expired)
    /// - Semantic rejections (payment, permission, invalid purchase, ...)
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Parse(_) => false,
            ApiError::Remote { kind, .. } => matches!(
                kind,
                ShopErrorKind::Timeout
                    | ShopErrorKind::Network
                    | ShopErrorKind::RateLimited
                    | ShopErrorKind::Maintenance
            ),
        }
    }

    /// True if the server no longer knows the session: the local entry
    /// must be dropped, not retried.
    pub fn is_session_gone(&self) -> bool {
        matches!(
            self.kind(),
            Some(ShopErrorKind::SessionNotFound | ShopErrorKind::SessionExpired)
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

// =============================================================================
// Shop Error Kind (classification)
// =============================================================================

/// Classified category of a free-text server error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopErrorKind {
    /// The player already has an open shop instance.
    AlreadyOpenSession,
    /// The requested shop slug does not exist.
    ShopNotFound,
    /// The shop instance (session) was not found on the server.
    SessionNotFound,
    /// The session existed but has expired.
    SessionExpired,
    /// Checkout attempted with an empty cart.
    EmptyCart,
    /// Permission denied.
    Permission,
    /// Server maintenance window.
    Maintenance,
    /// Rate limited.
    RateLimited,
    /// Cart contains invalid or unavailable items.
    InvalidPurchase,
    /// Payment processing failed.
    Payment,
    /// Server-side timeout.
    Timeout,
    /// Server-side network trouble.
    Network,
    /// Two-factor code rejected.
    Tfa,
    /// Anything unrecognized.
    Other,
}

/// Phrase table for classification. First match wins, so more specific
/// phrases sit above the generic ones (e.g. "connection timed out" must
/// classify as Timeout before Network can claim "connection").
const PHRASES: &[(ShopErrorKind, &[&str])] = &[
    (
        ShopErrorKind::AlreadyOpenSession,
        &["already has an open shop instance"],
    ),
    (ShopErrorKind::ShopNotFound, &["shop not found"]),
    (ShopErrorKind::SessionNotFound, &["instance not found"]),
    (ShopErrorKind::SessionExpired, &["expired"]),
    (
        ShopErrorKind::EmptyCart,
        &["empty cart", "no items", "nothing to purchase"],
    ),
    (
        ShopErrorKind::Permission,
        &["permission", "not allowed", "unauthorized"],
    ),
    (
        ShopErrorKind::Maintenance,
        &["maintenance", "temporarily unavailable", "down for maintenance"],
    ),
    (
        ShopErrorKind::RateLimited,
        &["rate limit", "too many requests", "try again later"],
    ),
    (
        ShopErrorKind::InvalidPurchase,
        &["invalid purchase", "invalid item", "item not available"],
    ),
    (
        ShopErrorKind::Payment,
        &["payment", "transaction failed", "insufficient funds"],
    ),
    (
        ShopErrorKind::Timeout,
        &["timeout", "timed out", "connection timed out"],
    ),
    (
        ShopErrorKind::Network,
        &["network", "connection", "unreachable"],
    ),
    (
        ShopErrorKind::Tfa,
        &["tfa", "two-factor", "verification code"],
    ),
];

impl ShopErrorKind {
    /// Classifies raw server text by case-insensitive substring match.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        for (kind, phrases) in PHRASES {
            if phrases.iter().any(|phrase| lower.contains(phrase)) {
                return *kind;
            }
        }
        ShopErrorKind::Other
    }

    /// Short title for the player-facing error box.
    pub fn title(&self) -> &'static str {
        match self {
            ShopErrorKind::AlreadyOpenSession => "Active Session Exists",
            ShopErrorKind::ShopNotFound => "Shop Not Found",
            ShopErrorKind::SessionNotFound => "Session Not Found",
            ShopErrorKind::SessionExpired => "Session Expired",
            ShopErrorKind::EmptyCart => "Empty Cart",
            ShopErrorKind::Permission => "Permission Denied",
            ShopErrorKind::Maintenance => "Server Maintenance",
            ShopErrorKind::RateLimited => "Rate Limited",
            ShopErrorKind::InvalidPurchase => "Invalid Purchase",
            ShopErrorKind::Payment => "Payment Error",
            ShopErrorKind::Timeout => "Connection Timeout",
            ShopErrorKind::Network => "Network Error",
            ShopErrorKind::Tfa => "Verification Code Error",
            ShopErrorKind::Other => "Shop Error",
        }
    }

    /// Player-facing explanation. Fixed text only - raw server messages
    /// never pass through here.
    pub fn message(&self) -> &'static str {
        match self {
            ShopErrorKind::AlreadyOpenSession => {
                "You already have an active shop session. Please finish or cancel \
                 your current session before starting a new one."
            }
            ShopErrorKind::ShopNotFound => {
                "The requested shop could not be found. Please check the shop name \
                 and try again."
            }
            ShopErrorKind::SessionNotFound => {
                "Your shop session was not found. It may have expired or been closed."
            }
            ShopErrorKind::SessionExpired => {
                "Your shop session has expired. Please start a new session."
            }
            ShopErrorKind::EmptyCart => {
                "Your shopping cart is empty. You need to add items to your cart \
                 before checking out."
            }
            ShopErrorKind::Permission => "You don't have permission to perform this action.",
            ShopErrorKind::Maintenance => {
                "The shop server is currently under maintenance. Please try again later."
            }
            ShopErrorKind::RateLimited => {
                "You've made too many requests. Please wait a moment before trying again."
            }
            ShopErrorKind::InvalidPurchase => {
                "Your purchase contains invalid or unavailable items."
            }
            ShopErrorKind::Payment => {
                "There was an issue processing your payment. The transaction could \
                 not be completed."
            }
            ShopErrorKind::Timeout => {
                "The request timed out while connecting to the shop server."
            }
            ShopErrorKind::Network => {
                "A network error occurred while communicating with the shop server."
            }
            ShopErrorKind::Tfa => {
                "The verification code provided is incorrect or has expired."
            }
            ShopErrorKind::Other => "The shop reported an error. Please try again later.",
        }
    }

    /// Help text accompanying the error message.
    pub fn help(&self) -> &'static str {
        match self {
            ShopErrorKind::AlreadyOpenSession => {
                "If you can't find your active session, wait for it to expire \
                 automatically, which takes at most 15 minutes."
            }
            ShopErrorKind::ShopNotFound => "Check the shop name and make sure it exists.",
            ShopErrorKind::SessionNotFound => "Please start a new shop session.",
            ShopErrorKind::SessionExpired => {
                "Shop sessions expire after a period of inactivity."
            }
            ShopErrorKind::EmptyCart => {
                "Return to the shop website and add some items to your cart before \
                 checking out."
            }
            ShopErrorKind::Permission => {
                "Contact a server administrator if you believe you should have access."
            }
            ShopErrorKind::Maintenance => {
                "The shop server is being updated. Please check back in a few minutes."
            }
            ShopErrorKind::RateLimited => {
                "Rate limits help protect the server. Wait a minute before trying again."
            }
            ShopErrorKind::InvalidPurchase => {
                "Some items may be out of stock or no longer available. Try adjusting \
                 your cart."
            }
            ShopErrorKind::Payment => {
                "Check your payment details or try using a different payment method."
            }
            ShopErrorKind::Timeout => {
                "The shop server may be experiencing high traffic. Please try again later."
            }
            ShopErrorKind::Network => {
                "Check your internet connection and try again. If the problem \
                 persists, the server may be down."
            }
            ShopErrorKind::Tfa => {
                "Make sure you're using the most recent verification code. Try \
                 starting a new shop session."
            }
            ShopErrorKind::Other => "Please try again later or contact an administrator.",
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
