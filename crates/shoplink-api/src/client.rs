//! # Marketplace HTTP Client
//!
//! The [`ShopApi`] trait is the seam between session logic and the wire:
//! workflows are generic over it, so tests drive them with an in-memory
//! fake while production uses [`HttpShopClient`].
//!
//! ## Request Flow
//! ```text
//! ┌──────────────┐   POST /initiate            ┌──────────────────────────┐
//! │              │ ───────────────────────────▶│                          │
//! │  Mod / Game  │   POST /checkout/{uuid}     │   Marketplace Server     │
//! │   (client)   │ ───────────────────────────▶│                          │
//! │              │   POST /applied/{uuid}      │  free-text errors are    │
//! │              │ ───────────────────────────▶│  classified, never shown │
//! │              │   POST /cancel/{uuid}       │  to the player raw       │
//! │              │ ───────────────────────────▶│                          │
//! └──────────────┘                             └──────────────────────────┘
//! ```

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ShopApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::protocol::{
    AppliedResponse, CheckoutResponse, ErrorBody, InitiateRequest, InitiateResponse, TfaBody,
};

// =============================================================================
// Session Ticket
// =============================================================================

/// A validated `/initiate` answer: every field present, or the response
/// is rejected as malformed.
#[derive(Debug, Clone)]
pub struct SessionTicket {
    /// Server-assigned session id, used in all later endpoint paths.
    pub session_id: Uuid,

    /// Browser link for the player to open the shop.
    pub link: String,

    /// Two-factor code proving later calls come from the same client.
    pub auth_code: String,
}

impl TryFrom<InitiateResponse> for SessionTicket {
    type Error = ApiError;

    fn try_from(response: InitiateResponse) -> ApiResult<Self> {
        let session_id = response
            .uuid
            .ok_or_else(|| ApiError::Parse("initiate response missing uuid".into()))?;
        let link = response
            .link
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ApiError::Parse("initiate response missing link".into()))?;
        let auth_code = response
            .two_factor_code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApiError::Parse("initiate response missing twoFactorCode".into()))?;
        Ok(SessionTicket {
            session_id,
            link,
            auth_code,
        })
    }
}

// =============================================================================
// Shop API Trait
// =============================================================================

/// Async interface to the marketplace.
///
/// Methods return `impl Future + Send` so generic workflow code can move
/// the futures onto the runtime freely.
pub trait ShopApi: Send + Sync + 'static {
    /// Starts a session: uploads the inventory snapshot, receives the
    /// session id, shop link, and two-factor code.
    fn initiate(
        &self,
        request: InitiateRequest,
    ) -> impl Future<Output = ApiResult<SessionTicket>> + Send;

    /// Fetches the post-purchase inventory for a checked-out session.
    fn checkout(
        &self,
        session_id: Uuid,
        auth_code: &str,
    ) -> impl Future<Output = ApiResult<CheckoutResponse>> + Send;

    /// Tells the server the purchase has been applied in-game. Succeeds
    /// only on the exact confirmation message.
    fn notify_applied(
        &self,
        session_id: Uuid,
        auth_code: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// Abandons a session.
    fn cancel(
        &self,
        session_id: Uuid,
        auth_code: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// Production [`ShopApi`] over HTTP.
pub struct HttpShopClient {
    http: reqwest::Client,
    config: ShopApiConfig,
}

impl HttpShopClient {
    /// Builds a client from configuration. The configured connect
    /// timeout doubles as the total request timeout.
    pub fn new(config: ShopApiConfig) -> ApiResult<Self> {
        let timeout = Duration::from_secs(config.api.connect_timeout_secs);
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(HttpShopClient { http, config })
    }

    /// Resolves a configured path against the base URL, substituting the
    /// `{uuid}` placeholder when a session id is given.
    fn endpoint(&self, path: &str, session_id: Option<Uuid>) -> String {
        let path = match session_id {
            Some(id) => path.replace("{uuid}", &id.to_string()),
            None => path.to_string(),
        };
        format!("{}{}", self.config.api.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%url, "POST shop endpoint");
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let message = if body.text() == "unknown error" && !text.is_empty() {
                // Not JSON at all, keep the raw body for the log.
                text
            } else {
                body.text().to_string()
            };
            warn!(%url, status = status.as_u16(), %message, "Shop endpoint rejected request");
            return Err(ApiError::remote(status.as_u16(), message));
        }

        Ok(response.json::<T>().await?)
    }
}

impl ShopApi for HttpShopClient {
    async fn initiate(&self, request: InitiateRequest) -> ApiResult<SessionTicket> {
        let url = self.endpoint(&self.config.api.initiate_path, None);
        let response: InitiateResponse = self.post_json(&url, &request).await?;
        let ticket = SessionTicket::try_from(response)?;
        debug!(session_id = %ticket.session_id, "Shop session initiated");
        Ok(ticket)
    }

    async fn checkout(&self, session_id: Uuid, auth_code: &str) -> ApiResult<CheckoutResponse> {
        let url = self.endpoint(&self.config.api.checkout_path, Some(session_id));
        let body = TfaBody {
            tfa_code: auth_code.to_string(),
        };
        self.post_json(&url, &body).await
    }

    async fn notify_applied(&self, session_id: Uuid, auth_code: &str) -> ApiResult<()> {
        let url = self.endpoint(&self.config.api.applied_path, Some(session_id));
        let body = TfaBody {
            tfa_code: auth_code.to_string(),
        };
        let response: AppliedResponse = self.post_json(&url, &body).await?;
        if response.is_confirmed() {
            Ok(())
        } else {
            // A 200 with the wrong message is still a failure: the
            // server has NOT recorded the applied transition.
            let message = response.message.unwrap_or_default();
            warn!(%session_id, %message, "Applied endpoint returned unexpected confirmation");
            Err(ApiError::remote(
                200,
                format!("applied not confirmed: {message}"),
            ))
        }
    }

    async fn cancel(&self, session_id: Uuid, auth_code: &str) -> ApiResult<()> {
        let url = self.endpoint(&self.config.api.cancel_path, Some(session_id));
        let body = TfaBody {
            tfa_code: auth_code.to_string(),
        };
        // The cancel body is opaque; reaching the server is all we need.
        let _: serde_json::Value = self.post_json(&url, &body).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpShopClient {
        HttpShopClient::new(ShopApiConfig::default()).unwrap()
    }

    #[test]
    fn test_endpoint_substitutes_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let url = client().endpoint("/checkout/{uuid}", Some(id));
        assert_eq!(
            url,
            "http://localhost:8080/api/shop/checkout/550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_endpoint_handles_trailing_slash_in_base() {
        let mut config = ShopApiConfig::default();
        config.api.base_url = "http://localhost:8080/api/shop/".to_string();
        let client = HttpShopClient::new(config).unwrap();
        assert_eq!(
            client.endpoint("/initiate", None),
            "http://localhost:8080/api/shop/initiate"
        );
    }

    #[test]
    fn test_session_ticket_requires_all_fields() {
        let full = InitiateResponse {
            uuid: Some(Uuid::new_v4()),
            link: Some("https://shop.example.com/s/abc".into()),
            two_factor_code: Some("123456".into()),
        };
        assert!(SessionTicket::try_from(full.clone()).is_ok());

        let missing_link = InitiateResponse {
            link: None,
            ..full.clone()
        };
        assert!(SessionTicket::try_from(missing_link).is_err());

        let empty_code = InitiateResponse {
            two_factor_code: Some(String::new()),
            ..full
        };
        assert!(SessionTicket::try_from(empty_code).is_err());
    }
}
