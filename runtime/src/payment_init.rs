//! Payment initialization.
//!
//! A purchase request is turned into a payment intent by the backend
//! asynchronously (it travels through a message queue before the payment
//! service knows about it). Until then `POST /payments/process` answers with a
//! "not ready" status. [`PaymentInitializer`] polls through that window with a
//! bounded number of attempts and surfaces any other failure immediately.

use crate::metrics::names;
use crate::retry::{RetryOutcome, RetryPolicy, retry_with_predicate};
use ourbusway_core::error::{GatewayError, PaymentError};
use ourbusway_core::payment::PaymentGateway;
use ourbusway_core::types::{PaymentIntentDescriptor, PurchaseRequestReference};
use smallvec::{SmallVec, smallvec};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// HTTP statuses that mean "the payment intent does not exist yet".
///
/// Only [`GatewayError::Status`] errors can be "not ready"; transport and
/// decode failures are always terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotReadyPolicy {
    statuses: SmallVec<[u16; 4]>,
}

impl NotReadyPolicy {
    /// Ticket checkout: 404 and 500.
    #[must_use]
    pub fn ticket() -> Self {
        Self {
            statuses: smallvec![404, 500],
        }
    }

    /// Subscription checkout: 400, 404 and 500.
    ///
    /// The subscription service answers 400 while the request is still queued.
    #[must_use]
    pub fn subscription() -> Self {
        Self {
            statuses: smallvec![400, 404, 500],
        }
    }

    /// Policy for the kind of purchase being paid.
    #[must_use]
    pub fn for_reference(reference: &PurchaseRequestReference) -> Self {
        match reference {
            PurchaseRequestReference::Ticket(_) => Self::ticket(),
            PurchaseRequestReference::Subscription(_) => Self::subscription(),
        }
    }

    /// Custom status set
    #[must_use]
    pub fn with_statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }

    /// Whether `err` should be retried
    #[must_use]
    pub fn is_not_ready(&self, err: &GatewayError) -> bool {
        err.status().is_some_and(|status| self.statuses.contains(&status))
    }

    /// Statuses treated as "not ready"
    #[must_use]
    pub fn statuses(&self) -> &[u16] {
        &self.statuses
    }
}

/// Obtains a [`PaymentIntentDescriptor`] for a purchase request.
///
/// Holds no state between calls: every call polls from scratch, so a failed
/// initialization can always be re-run.
#[derive(Clone)]
pub struct PaymentInitializer {
    gateway: Arc<dyn PaymentGateway>,
    policy: RetryPolicy,
    not_ready: Option<NotReadyPolicy>,
}

impl PaymentInitializer {
    /// Initializer with the 10 × 500ms policy and the per-kind "not ready" statuses.
    #[must_use]
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            gateway,
            policy: RetryPolicy::payment_initialization(),
            not_ready: None,
        }
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use the same "not ready" statuses for every kind of purchase
    #[must_use]
    pub fn with_not_ready_policy(mut self, not_ready: NotReadyPolicy) -> Self {
        self.not_ready = Some(not_ready);
        self
    }

    /// Retry policy in use
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Validate the two optional identifiers, then [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// [`PaymentError::InvalidReference`] without any network call when both
    /// or neither identifier is supplied; otherwise as [`initialize`](Self::initialize).
    pub async fn initialize_from_parts(
        &self,
        ticket_request_id: Option<&str>,
        subscription_request_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<PaymentIntentDescriptor, PaymentError> {
        let reference =
            PurchaseRequestReference::from_parts(ticket_request_id, subscription_request_id)?;
        self.initialize(&reference, cancel).await
    }

    /// Poll the gateway until it returns the payment intent.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::Terminal`] for a gateway error that is not "not ready"
    /// - [`PaymentError::RetryExhausted`] when every attempt was "not ready"
    /// - [`PaymentError::Cancelled`] when `cancel` fires first
    #[tracing::instrument(skip(self, reference, cancel), fields(reference = %reference))]
    pub async fn initialize(
        &self,
        reference: &PurchaseRequestReference,
        cancel: &CancellationToken,
    ) -> Result<PaymentIntentDescriptor, PaymentError> {
        let not_ready = self
            .not_ready
            .clone()
            .unwrap_or_else(|| NotReadyPolicy::for_reference(reference));
        let kind = reference.kind();
        let gateway = &self.gateway;
        let max_attempts = self.policy.max_attempts;

        let result = retry_with_predicate(
            &self.policy,
            cancel,
            |attempt| async move {
                tracing::debug!(attempt, max_attempts, "Requesting payment intent");
                metrics::counter!(names::INIT_ATTEMPTS, "kind" => kind).increment(1);
                if attempt > 1 {
                    metrics::counter!(names::INIT_RETRIES, "kind" => kind).increment(1);
                }
                gateway.process_payment(reference).await
            },
            |err| not_ready.is_not_ready(err),
        )
        .await;

        match result {
            Ok(descriptor) => {
                metrics::counter!(names::INIT_OUTCOME, "kind" => kind, "result" => "ready")
                    .increment(1);
                tracing::info!(
                    payment_intent_id = %descriptor.provider_intent_id,
                    amount = %descriptor.amount,
                    currency = %descriptor.currency,
                    "Payment initialized"
                );
                Ok(descriptor)
            },
            Err(RetryOutcome::Rejected(err)) => {
                metrics::counter!(names::INIT_OUTCOME, "kind" => kind, "result" => "terminal")
                    .increment(1);
                Err(PaymentError::Terminal(err))
            },
            Err(RetryOutcome::Exhausted {
                attempts,
                last_error,
            }) => {
                metrics::counter!(names::INIT_OUTCOME, "kind" => kind, "result" => "exhausted")
                    .increment(1);
                Err(PaymentError::RetryExhausted {
                    attempts,
                    last: last_error,
                })
            },
            Err(RetryOutcome::Cancelled { attempts, .. }) => {
                metrics::counter!(names::INIT_OUTCOME, "kind" => kind, "result" => "cancelled")
                    .increment(1);
                tracing::debug!(attempts, "Payment initialization abandoned");
                Err(PaymentError::Cancelled)
            },
        }
    }
}

impl std::fmt::Debug for PaymentInitializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentInitializer")
            .field("policy", &self.policy)
            .field("not_ready", &self.not_ready)
            .finish_non_exhaustive()
    }
}
