//! Domain types for checkout and purchase requests.
//!
//! Identifiers coming back from the ticket and subscription services are opaque
//! strings; the only rule enforced locally is that they are not blank.

use crate::error::InvalidReference;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Purchase request identifiers
// ============================================================================

/// Identifier of a ticket purchase request, issued by the ticket service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketRequestId(String);

impl TicketRequestId {
    /// Creates a `TicketRequestId`, rejecting blank input.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReference::Empty`] if `id` is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidReference> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InvalidReference::Empty);
        }
        Ok(Self(id))
    }

    /// Returns the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a subscription purchase request, issued by the subscription service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionRequestId(String);

impl SubscriptionRequestId {
    /// Creates a `SubscriptionRequestId`, rejecting blank input.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReference::Empty`] if `id` is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidReference> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InvalidReference::Empty);
        }
        Ok(Self(id))
    }

    /// Returns the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to exactly one purchase request awaiting payment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PurchaseRequestReference {
    /// A single-ticket purchase
    Ticket(TicketRequestId),
    /// A subscription purchase
    Subscription(SubscriptionRequestId),
}

impl PurchaseRequestReference {
    /// Builds a reference from the two optional identifiers a page may carry.
    ///
    /// Blank strings count as absent. Exactly one identifier must remain.
    ///
    /// # Errors
    ///
    /// - [`InvalidReference::Both`] when both identifiers are present
    /// - [`InvalidReference::Neither`] when none is present
    pub fn from_parts(
        ticket_request_id: Option<&str>,
        subscription_request_id: Option<&str>,
    ) -> Result<Self, InvalidReference> {
        let ticket = ticket_request_id.and_then(|id| TicketRequestId::new(id).ok());
        let subscription =
            subscription_request_id.and_then(|id| SubscriptionRequestId::new(id).ok());

        match (ticket, subscription) {
            (Some(ticket), None) => Ok(Self::Ticket(ticket)),
            (None, Some(subscription)) => Ok(Self::Subscription(subscription)),
            (Some(_), Some(_)) => Err(InvalidReference::Both),
            (None, None) => Err(InvalidReference::Neither),
        }
    }

    /// The wire body for `POST /payments/process`.
    #[must_use]
    pub fn to_process_request(&self) -> PaymentProcessRequest {
        match self {
            Self::Ticket(id) => PaymentProcessRequest {
                ticket_request_id: Some(id.as_str().to_string()),
                subscription_request_id: None,
            },
            Self::Subscription(id) => PaymentProcessRequest {
                ticket_request_id: None,
                subscription_request_id: Some(id.as_str().to_string()),
            },
        }
    }

    /// Short label for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ticket(_) => "ticket",
            Self::Subscription(_) => "subscription",
        }
    }
}

impl fmt::Display for PurchaseRequestReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ticket(id) => write!(f, "ticket-request:{id}"),
            Self::Subscription(id) => write!(f, "subscription-request:{id}"),
        }
    }
}

/// Body of `POST /payments/process`. Absent identifiers are omitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProcessRequest {
    /// Ticket purchase request, if paying for a ticket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_request_id: Option<String>,
    /// Subscription purchase request, if paying for a subscription
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_request_id: Option<String>,
}

// ============================================================================
// Payment intents
// ============================================================================

/// Secret handed to the payment provider to confirm an intent.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(String);

impl ClientSecret {
    /// Wraps a raw secret
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the raw secret for the provider call
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The provider intent id embedded in the secret (`pi_123_secret_abc` → `pi_123`).
    #[must_use]
    pub fn intent_id(&self) -> Option<&str> {
        self.0
            .split_once("_secret_")
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(<redacted>)")
    }
}

/// Payment intent issued by the payment service once a purchase request
/// has been processed server-side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentDescriptor {
    /// Provider-assigned intent id
    #[serde(rename = "paymentIntentId")]
    pub provider_intent_id: String,
    /// Secret used for client-side confirmation
    pub client_secret: ClientSecret,
    /// Amount to charge
    pub amount: Decimal,
    /// ISO currency code (the platform charges in MAD)
    pub currency: String,
}

impl PaymentIntentDescriptor {
    /// Amount formatted the way the checkout summary shows it (`12.50 MAD`).
    #[must_use]
    pub fn display_amount(&self) -> String {
        format!("{:.2} {}", self.amount, self.currency)
    }
}

/// Status of a provider payment intent after confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentStatus {
    /// Charge completed
    Succeeded,
    /// Provider still processing
    Processing,
    /// Extra customer action (3-D Secure) needed
    RequiresAction,
    /// A new payment method is needed
    RequiresPaymentMethod,
    /// Confirmation still needed
    RequiresConfirmation,
    /// Authorized, awaiting capture
    RequiresCapture,
    /// Intent canceled
    Canceled,
    /// Status this client does not know about
    Other(String),
}

impl IntentStatus {
    /// Only `succeeded` counts as final success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Processing => "processing",
            Self::RequiresAction => "requires_action",
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for IntentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "succeeded" => Self::Succeeded,
            "processing" => Self::Processing,
            "requires_action" => Self::RequiresAction,
            "requires_payment_method" => Self::RequiresPaymentMethod,
            "requires_confirmation" => Self::RequiresConfirmation,
            "requires_capture" => Self::RequiresCapture,
            "canceled" => Self::Canceled,
            _ => Self::Other(value),
        }
    }
}

impl From<IntentStatus> for String {
    fn from(value: IntentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intent as reported by the provider after a confirmation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedIntent {
    /// Provider intent id
    pub id: String,
    /// Resulting status
    pub status: IntentStatus,
}

/// Card captured by the provider's input element, as a payment-method reference.
#[derive(Clone, PartialEq, Eq)]
pub struct CardInput {
    payment_method: String,
}

impl CardInput {
    /// Wraps a provider payment-method reference such as `pm_card_visa`.
    #[must_use]
    pub fn new(payment_method: impl Into<String>) -> Self {
        Self {
            payment_method: payment_method.into(),
        }
    }

    /// The payment-method reference sent to the provider
    #[must_use]
    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }
}

impl fmt::Debug for CardInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CardInput(<redacted>)")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reference_requires_exactly_one_id() {
        assert_eq!(
            PurchaseRequestReference::from_parts(Some("t-1"), Some("s-1")),
            Err(InvalidReference::Both)
        );
        assert_eq!(
            PurchaseRequestReference::from_parts(None, None),
            Err(InvalidReference::Neither)
        );
        assert_eq!(
            PurchaseRequestReference::from_parts(Some("  "), None),
            Err(InvalidReference::Neither)
        );
        assert!(matches!(
            PurchaseRequestReference::from_parts(None, Some("s-1")),
            Ok(PurchaseRequestReference::Subscription(_))
        ));
    }

    #[test]
    fn process_request_omits_absent_field() {
        let reference = PurchaseRequestReference::from_parts(Some("t-42"), None).unwrap();
        let body = serde_json::to_value(reference.to_process_request()).unwrap();
        assert_eq!(body, serde_json::json!({ "ticketRequestId": "t-42" }));
    }

    #[test]
    fn descriptor_reads_gateway_payload() {
        let descriptor: PaymentIntentDescriptor = serde_json::from_value(serde_json::json!({
            "paymentIntentId": "pi_1",
            "clientSecret": "pi_1_secret_abc",
            "amount": 12.5,
            "currency": "MAD"
        }))
        .unwrap();

        assert_eq!(descriptor.provider_intent_id, "pi_1");
        assert_eq!(descriptor.client_secret.intent_id(), Some("pi_1"));
        assert_eq!(descriptor.display_amount(), "12.50 MAD");
        assert!(!format!("{descriptor:?}").contains("abc"));
    }

    #[test]
    fn intent_status_keeps_unknown_values() {
        let status: IntentStatus = serde_json::from_str("\"requires_action\"").unwrap();
        assert_eq!(status, IntentStatus::RequiresAction);

        let status: IntentStatus = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(status, IntentStatus::Other("on_hold".to_string()));
        assert!(!status.is_success());
        assert!(IntentStatus::Succeeded.is_success());
    }

    proptest! {
        #[test]
        fn any_single_non_blank_id_is_accepted(id in "[a-zA-Z0-9-]{1,36}") {
            let ticket = PurchaseRequestReference::from_parts(Some(&id), None).unwrap();
            prop_assert_eq!(ticket.kind(), "ticket");

            let subscription = PurchaseRequestReference::from_parts(None, Some(&id)).unwrap();
            prop_assert_eq!(subscription.kind(), "subscription");

            prop_assert_eq!(
                PurchaseRequestReference::from_parts(Some(&id), Some(&id)),
                Err(InvalidReference::Both)
            );
        }
    }
}
