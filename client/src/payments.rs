//! Payment endpoints (`/paymentMgtApi/payments`).
//!
//! [`PaymentApi`] is the production [`PaymentGateway`]: the checkout flow polls
//! [`PaymentApi::process`] until the payment intent exists.

use crate::api::{ApiClient, PageQuery};
use crate::error::ApiError;
use crate::types::Page;
use ourbusway_core::error::GatewayError;
use ourbusway_core::payment::{BoxFuture, GatewayResult, PaymentGateway};
use ourbusway_core::types::{PaymentIntentDescriptor, PurchaseRequestReference};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Path prefix of the payment service
pub const PAYMENT_BASE: &str = "/paymentMgtApi/payments";

/// Status of a recorded payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Intent created, not confirmed
    Pending,
    /// Waiting for card confirmation
    RequiresConfirmation,
    /// Charged
    Succeeded,
    /// Charge failed
    Failed,
}

/// A payment as recorded by the payment service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Payment id
    pub id: String,
    /// Payer
    pub user_id: String,
    /// Amount
    pub amount: Decimal,
    /// ISO currency code
    pub currency: String,
    /// Status
    pub status: PaymentStatus,
    /// Provider intent id
    pub stripe_payment_intent_id: String,
    /// Provider charge id, once charged
    #[serde(default)]
    pub stripe_charge_id: Option<String>,
    /// Ticket purchase request paid for
    #[serde(default)]
    pub ticket_request_id: Option<String>,
    /// Ticket issued, once issued
    #[serde(default)]
    pub ticket_id: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Payment service
#[derive(Debug, Clone)]
pub struct PaymentApi {
    client: ApiClient,
}

impl PaymentApi {
    /// Wrap a gateway client
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Create or fetch the payment intent for a purchase request.
    ///
    /// Answers 404 (or 500) while the purchase request has not reached the
    /// payment service yet.
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, reference), fields(reference = %reference))]
    pub async fn process(
        &self,
        reference: &PurchaseRequestReference,
    ) -> Result<PaymentIntentDescriptor, ApiError> {
        self.client
            .send_json(
                Method::POST,
                &format!("{PAYMENT_BASE}/process"),
                &reference.to_process_request(),
            )
            .await
    }

    /// One payment
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, payment_id: &str) -> Result<Payment, ApiError> {
        self.client
            .get_json(&format!("{PAYMENT_BASE}/{payment_id}"))
            .await
    }

    /// Payment made for a ticket purchase request
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn by_ticket_request(&self, ticket_request_id: &str) -> Result<Payment, ApiError> {
        self.client
            .get_json(&format!("{PAYMENT_BASE}/ticket-request/{ticket_request_id}"))
            .await
    }

    /// Payments of the signed-in user
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn history(&self, page: u32, size: u32) -> Result<Page<Payment>, ApiError> {
        self.client
            .get_json_query(&format!("{PAYMENT_BASE}/history"), &PageQuery { page, size })
            .await
    }
}

impl PaymentGateway for PaymentApi {
    fn process_payment<'a>(
        &'a self,
        reference: &'a PurchaseRequestReference,
    ) -> BoxFuture<'a, GatewayResult<PaymentIntentDescriptor>> {
        Box::pin(async move { self.process(reference).await.map_err(GatewayError::from) })
    }
}
