//! Card confirmation against the Stripe REST API.
//!
//! Confirmation talks to the provider directly, never through the gateway.
//! It is authenticated with the publishable key and scoped to one intent by
//! its client secret, so no server-side secret is involved.

use crate::error::ApiError;
use ourbusway_core::error::ConfirmationError;
use ourbusway_core::payment::{BoxFuture, CardConfirmer};
use ourbusway_core::types::{CardInput, ClientSecret, ConfirmedIntent};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;

/// Default provider API URL
pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";

/// Provider error body: `{ "error": { "message", "code", "type" } }`
#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl From<StripeErrorDetail> for ConfirmationError {
    fn from(detail: StripeErrorDetail) -> Self {
        let message = detail
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Payment failed".to_string());
        match detail.kind.as_deref() {
            Some("card_error") => Self::card(message, detail.code),
            Some("invalid_request_error") => Self {
                code: detail.code,
                ..Self::invalid_request(message)
            },
            _ => Self {
                code: detail.code,
                ..Self::api(message)
            },
        }
    }
}

/// [`CardConfirmer`] backed by `POST /v1/payment_intents/{id}/confirm`.
#[derive(Clone)]
pub struct StripeCardConfirmer {
    http: Client,
    api_url: String,
    publishable_key: String,
}

impl StripeCardConfirmer {
    /// Confirmer for the live provider API
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidConfig`] if the HTTP client cannot be built.
    pub fn new(publishable_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_api_url(publishable_key, DEFAULT_STRIPE_API_URL)
    }

    /// Confirmer for another API URL (test doubles, proxies)
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidConfig`] if the HTTP client cannot be built.
    pub fn with_api_url(
        publishable_key: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            publishable_key: publishable_key.into(),
        })
    }

    async fn confirm(
        &self,
        client_secret: &ClientSecret,
        card: &CardInput,
    ) -> Result<ConfirmedIntent, ConfirmationError> {
        let intent_id = client_secret
            .intent_id()
            .ok_or_else(|| ConfirmationError::invalid_request("Invalid client secret"))?;

        let form = serde_urlencoded::to_string([
            ("client_secret", client_secret.expose()),
            ("payment_method", card.payment_method()),
        ])
        .map_err(|e| ConfirmationError::invalid_request(e.to_string()))?;

        tracing::debug!(payment_intent_id = intent_id, "Confirming card payment");

        let response = self
            .http
            .post(format!(
                "{}/v1/payment_intents/{intent_id}/confirm",
                self.api_url
            ))
            .bearer_auth(&self.publishable_key)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|e| ConfirmationError::api(format!("Network error: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ConfirmationError::api(format!("Network error: {e}")))?;

        if status.is_success() {
            let intent: ConfirmedIntent = serde_json::from_slice(&body)
                .map_err(|e| ConfirmationError::api(format!("Unexpected provider response: {e}")))?;
            tracing::info!(
                payment_intent_id = %intent.id,
                status = %intent.status,
                "Card confirmation answered"
            );
            return Ok(intent);
        }

        let error = serde_json::from_slice::<StripeErrorBody>(&body).map_or_else(
            |_| ConfirmationError::api(format!("Payment failed (status {})", status.as_u16())),
            |body| ConfirmationError::from(body.error),
        );
        tracing::warn!(
            status = status.as_u16(),
            code = ?error.code,
            kind = ?error.kind,
            "Card confirmation rejected"
        );
        Err(error)
    }
}

impl CardConfirmer for StripeCardConfirmer {
    fn confirm_card_payment<'a>(
        &'a self,
        client_secret: &'a ClientSecret,
        card: &'a CardInput,
    ) -> BoxFuture<'a, Result<ConfirmedIntent, ConfirmationError>> {
        Box::pin(self.confirm(client_secret, card))
    }
}

impl std::fmt::Debug for StripeCardConfirmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeCardConfirmer")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ourbusway_core::error::ConfirmationErrorKind;

    #[test]
    fn test_error_body_kinds() {
        let body: StripeErrorBody = serde_json::from_str(
            r#"{"error":{"message":"Your card was declined.","code":"card_declined","type":"card_error"}}"#,
        )
        .unwrap();
        let error = ConfirmationError::from(body.error);
        assert_eq!(error.kind, ConfirmationErrorKind::Card);
        assert_eq!(error.code.as_deref(), Some("card_declined"));
        assert_eq!(error.message, "Your card was declined.");

        let body: StripeErrorBody =
            serde_json::from_str(r#"{"error":{"type":"invalid_request_error"}}"#).unwrap();
        let error = ConfirmationError::from(body.error);
        assert_eq!(error.kind, ConfirmationErrorKind::InvalidRequest);
        assert_eq!(error.message, "Payment failed");
    }

    #[test]
    fn test_malformed_secret_is_rejected_locally() {
        let confirmer = StripeCardConfirmer::with_api_url("pk_test", "http://127.0.0.1:9").unwrap();
        let result = tokio_test::block_on(
            confirmer.confirm_card_payment(&ClientSecret::new("no-marker"), &CardInput::new("pm_card_visa")),
        );
        let err = tokio_test::assert_err!(result);
        assert_eq!(err.kind, ConfirmationErrorKind::InvalidRequest);
    }
}
