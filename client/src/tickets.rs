//! Ticket endpoints (`/ticketMgtApi`).

use crate::api::{ApiClient, PageQuery};
use crate::error::ApiError;
use crate::types::Page;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Path prefix of the ticket service
pub const TICKET_BASE: &str = "/ticketMgtApi";

/// Lifecycle of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Bought, not yet used
    Active,
    /// Validated on board
    Used,
    /// Past its validity
    Expired,
}

/// A bought ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket id
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Route the ticket is valid on
    pub route_id: String,
    /// Purchase timestamp, as sent by the service
    pub purchase_date: String,
    /// Price paid
    pub price: Decimal,
    /// Status
    pub status: TicketStatus,
}

/// Route being paid for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRef {
    /// Route id
    pub id: String,
    /// Displayed price
    pub price: Decimal,
}

/// Ticket purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketPurchaseRequest {
    /// Route to buy a ticket for
    pub route: RouteRef,
}

/// Purchase acknowledgement.
///
/// The ticket itself is issued asynchronously; `ticket_request_id` is what
/// the checkout page pays for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPurchase {
    /// Purchase request to pay
    #[serde(default)]
    pub ticket_request_id: Option<String>,
    /// Ticket id, once issued
    #[serde(default)]
    pub id: Option<String>,
    /// Request status
    #[serde(default)]
    pub status: Option<String>,
}

/// Outcome of a ticket validation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationResponse {
    /// Whether the ticket was accepted
    pub valid: bool,
    /// Ticket validated
    pub ticket: Ticket,
    /// Reason, when rejected
    #[serde(default)]
    pub message: Option<String>,
}

/// Ticket service
#[derive(Debug, Clone)]
pub struct TicketApi {
    client: ApiClient,
}

impl TicketApi {
    /// Wrap a gateway client
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Buy a ticket for a route
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request), fields(route_id = %request.route.id))]
    pub async fn purchase(
        &self,
        request: &TicketPurchaseRequest,
    ) -> Result<TicketPurchase, ApiError> {
        self.client
            .send_json(Method::POST, &format!("{TICKET_BASE}/purchase"), request)
            .await
    }

    /// Tickets of the signed-in passenger
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn history(&self, page: u32, size: u32) -> Result<Page<Ticket>, ApiError> {
        self.client
            .get_json_query(&format!("{TICKET_BASE}/history"), &PageQuery { page, size })
            .await
    }

    /// One ticket
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        self.client
            .get_json(&format!("{TICKET_BASE}/{ticket_id}"))
            .await
    }

    /// QR code image (PNG bytes)
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn qr_code(&self, ticket_id: &str) -> Result<Vec<u8>, ApiError> {
        self.client
            .get_bytes(&format!("{TICKET_BASE}/{ticket_id}/qrcode"))
            .await
    }

    /// Validate a ticket on board
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn validate(&self, ticket_id: &str) -> Result<ValidationResponse, ApiError> {
        self.client
            .send_json(
                Method::POST,
                &format!("{TICKET_BASE}/{ticket_id}/validate"),
                &serde_json::json!({}),
            )
            .await
    }

    /// Look a ticket up without validating it (controllers)
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn inspect(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        self.client
            .get_json(&format!("{TICKET_BASE}/{ticket_id}/inspect"))
            .await
    }

    /// Printable ticket (PDF bytes)
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn pdf(&self, ticket_id: &str) -> Result<Vec<u8>, ApiError> {
        self.client
            .get_bytes(&format!("{TICKET_BASE}/{ticket_id}/pdf"))
            .await
    }
}
