//! Payment boundaries.
//!
//! Two external collaborators take part in checkout:
//!
//! - the backend **payment gateway**, which turns a purchase request into a
//!   payment intent once the request has been processed server-side
//! - the **payment provider**, which confirms the card against that intent
//!   directly, without going through the backend
//!
//! Both are traits so the checkout flow can be driven against scripted
//! implementations in tests.

use crate::error::{ConfirmationError, GatewayError};
use crate::types::{CardInput, ClientSecret, ConfirmedIntent, PaymentIntentDescriptor, PurchaseRequestReference};
use std::future::Future;
use std::pin::Pin;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Boxed future returned by boundary traits
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Payment gateway trait
///
/// Abstraction over `POST /payments/process`.
pub trait PaymentGateway: Send + Sync {
    /// Fetch the payment intent for a purchase request.
    ///
    /// Re-polling with the same reference is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Status`] while the intent is not materialized
    /// yet (typically 404 or 500) and for caller errors.
    fn process_payment<'a>(
        &'a self,
        reference: &'a PurchaseRequestReference,
    ) -> BoxFuture<'a, GatewayResult<PaymentIntentDescriptor>>;
}

/// Card confirmation trait
///
/// A single request/response exchange with the payment provider. No retries.
pub trait CardConfirmer: Send + Sync {
    /// Confirm the card payment for the intent identified by `client_secret`.
    ///
    /// # Errors
    ///
    /// Returns the provider-reported [`ConfirmationError`] when the card or
    /// the call is rejected.
    fn confirm_card_payment<'a>(
        &'a self,
        client_secret: &'a ClientSecret,
        card: &'a CardInput,
    ) -> BoxFuture<'a, Result<ConfirmedIntent, ConfirmationError>>;
}
