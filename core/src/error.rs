//! Error types for checkout.
//!
//! [`PaymentError`] is what a checkout page ends up showing. Every variant
//! resolves to a human-readable message through [`PaymentError::user_message`].

use crate::types::IntentStatus;
use thiserror::Error;

/// A purchase reference that cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidReference {
    /// Both a ticket and a subscription request were supplied
    #[error("both a ticket request and a subscription request were supplied")]
    Both,

    /// Neither identifier was supplied
    #[error("no ticket request or subscription request was supplied")]
    Neither,

    /// The identifier was blank
    #[error("purchase request identifier is empty")]
    Empty,
}

/// Failure reported by the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Gateway answered with an error status
    #[error("payment gateway returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// `message` field of the error body, if any
        message: Option<String>,
    },

    /// Request never got an answer
    #[error("payment gateway unreachable: {0}")]
    Transport(String),

    /// Success status with a body that is not a payment intent
    #[error("payment gateway response could not be decoded: {0}")]
    Decode(String),
}

impl GatewayError {
    /// HTTP status, when the gateway answered
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// Server-provided message, when there is one
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// Broad category of a provider confirmation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationErrorKind {
    /// Card was declined or failed validation
    Card,
    /// Request was rejected as invalid
    InvalidRequest,
    /// Provider or network failure
    Api,
}

/// Failure reported by the payment provider while confirming a card.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConfirmationError {
    /// Provider message, shown verbatim
    pub message: String,
    /// Provider error code (`card_declined`, …)
    pub code: Option<String>,
    /// Error category
    pub kind: ConfirmationErrorKind,
}

impl ConfirmationError {
    /// Card error with a provider message
    #[must_use]
    pub fn card(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            message: message.into(),
            code,
            kind: ConfirmationErrorKind::Card,
        }
    }

    /// Provider/API failure
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            kind: ConfirmationErrorKind::Api,
        }
    }

    /// Invalid request failure
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            kind: ConfirmationErrorKind::InvalidRequest,
        }
    }
}

/// Everything that can end a checkout step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The purchase reference was rejected before any request
    #[error("invalid purchase reference: {0}")]
    InvalidReference(#[from] InvalidReference),

    /// Gateway rejected the request; not retried
    #[error("payment initialization failed: {0}")]
    Terminal(GatewayError),

    /// Every attempt reported "not ready"
    #[error("payment initialization gave up after {attempts} attempts: {last}")]
    RetryExhausted {
        /// Attempts made
        attempts: u32,
        /// Last gateway error observed
        last: GatewayError,
    },

    /// Owner of the flow went away mid-retry
    #[error("payment initialization was cancelled")]
    Cancelled,

    /// Card submitted before a payment intent was obtained
    #[error("no payment intent has been obtained for this checkout")]
    MissingDescriptor,

    /// Provider rejected the card or the confirmation call
    #[error("card confirmation failed: {0}")]
    ProviderConfirmation(ConfirmationError),

    /// Confirmation returned a status that is neither success nor error
    #[error("unexpected payment status: {0}")]
    UnexpectedIntentStatus(IntentStatus),
}

impl PaymentError {
    /// Message for the retry-exhausted case when the gateway gave none
    pub const TAKING_LONGER: &'static str =
        "Payment initialization is taking longer than expected.";

    /// Text shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidReference(InvalidReference::Both) => {
                "Only one of ticket or subscription can be paid at a time.".to_string()
            },
            Self::InvalidReference(_) => "Purchase request ID missing.".to_string(),
            Self::Terminal(err) => err.server_message().map_or_else(
                || match err {
                    GatewayError::Status { status: 401, .. } => {
                        "Your session has expired. Please sign in again.".to_string()
                    },
                    GatewayError::Status { status: 403, .. } => {
                        "You are not allowed to pay for this purchase.".to_string()
                    },
                    GatewayError::Status { status, .. } => {
                        format!("Payment initialization failed (status {status}).")
                    },
                    GatewayError::Transport(_) => {
                        "Cannot connect to the payment service.".to_string()
                    },
                    GatewayError::Decode(_) => {
                        "The payment service sent an unexpected response.".to_string()
                    },
                },
                ToString::to_string,
            ),
            Self::RetryExhausted { last, .. } => last
                .server_message()
                .map_or_else(|| Self::TAKING_LONGER.to_string(), ToString::to_string),
            Self::Cancelled => "Payment initialization was cancelled.".to_string(),
            Self::MissingDescriptor => "Client secret missing. Please try again.".to_string(),
            Self::ProviderConfirmation(err) => {
                if err.message.is_empty() {
                    "Payment failed".to_string()
                } else {
                    err.message.clone()
                }
            },
            Self::UnexpectedIntentStatus(status) => format!("Payment status: {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found(message: Option<&str>) -> GatewayError {
        GatewayError::Status {
            status: 404,
            message: message.map(ToString::to_string),
        }
    }

    #[test]
    fn exhausted_prefers_server_message() {
        let err = PaymentError::RetryExhausted {
            attempts: 10,
            last: not_found(Some("Payment not found for ticket request")),
        };
        assert_eq!(err.user_message(), "Payment not found for ticket request");

        let err = PaymentError::RetryExhausted {
            attempts: 10,
            last: not_found(None),
        };
        assert_eq!(err.user_message(), PaymentError::TAKING_LONGER);
    }

    #[test]
    fn terminal_falls_back_to_status_text() {
        let err = PaymentError::Terminal(GatewayError::Status {
            status: 403,
            message: Some(String::new()),
        });
        assert_eq!(
            err.user_message(),
            "You are not allowed to pay for this purchase."
        );
    }

    #[test]
    fn provider_message_is_verbatim() {
        let err = PaymentError::ProviderConfirmation(ConfirmationError::card(
            "Your card was declined.",
            Some("card_declined".to_string()),
        ));
        assert_eq!(err.user_message(), "Your card was declined.");
    }

    #[test]
    fn unexpected_status_names_the_status() {
        let err = PaymentError::UnexpectedIntentStatus(IntentStatus::Processing);
        assert_eq!(err.user_message(), "Payment status: processing");
    }
}
