//! # OurBusWay Testing
//!
//! Testing utilities for the OurBusWay portal.
//!
//! This crate provides:
//! - Deterministic implementations of environment traits
//! - Scripted payment gateway and card confirmer
//! - A recording navigator
//! - The [`ReducerTest`] Given-When-Then harness
//!
//! ## Example
//!
//! ```ignore
//! use ourbusway_testing::mocks::{ScriptedGateway, descriptor, gateway_status};
//! use ourbusway_runtime::PaymentInitializer;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_ready_after_two_polls() {
//!     let gateway = Arc::new(ScriptedGateway::new([
//!         Err(gateway_status(404)),
//!         Ok(descriptor("pi_1")),
//!     ]));
//!     let initializer = PaymentInitializer::new(gateway.clone());
//!     let intent = initializer.initialize(&reference, &token).await.unwrap();
//!     assert_eq!(gateway.calls(), 2);
//! }
//! ```

use chrono::{DateTime, Utc};
use ourbusway_core::environment::Clock;

pub mod reducer_test;

/// Mock implementations of environment traits and checkout collaborators.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use ourbusway_core::error::{ConfirmationError, GatewayError};
    use ourbusway_core::navigation::{NavigationTarget, Navigator};
    use ourbusway_core::payment::{BoxFuture, CardConfirmer, GatewayResult, PaymentGateway};
    use ourbusway_core::types::{
        CardInput, ClientSecret, ConfirmedIntent, IntentStatus, PaymentIntentDescriptor,
        PurchaseRequestReference,
    };
    use rust_decimal::Decimal;
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use tokio::time::Instant;

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ourbusway_testing::mocks::FixedClock;
    /// use ourbusway_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Descriptor for intent `id` with secret `{id}_secret_test`, 25.00 MAD.
    #[must_use]
    pub fn descriptor(id: &str) -> PaymentIntentDescriptor {
        PaymentIntentDescriptor {
            provider_intent_id: id.to_string(),
            client_secret: ClientSecret::new(format!("{id}_secret_test")),
            amount: Decimal::new(2500, 2),
            currency: "MAD".to_string(),
        }
    }

    /// Gateway error with `status` and no body message
    #[must_use]
    pub const fn gateway_status(status: u16) -> GatewayError {
        GatewayError::Status {
            status,
            message: None,
        }
    }

    /// Payment gateway that replays a script of responses.
    ///
    /// Once the script runs out, the last response is repeated. Every call is
    /// recorded with the (tokio) instant it was made at, so tests running with
    /// paused time can assert on exact spacing.
    #[derive(Debug)]
    pub struct ScriptedGateway {
        script: Mutex<VecDeque<GatewayResult<PaymentIntentDescriptor>>>,
        last: Mutex<Option<GatewayResult<PaymentIntentDescriptor>>>,
        calls: Mutex<Vec<(Instant, PurchaseRequestReference)>>,
    }

    impl ScriptedGateway {
        /// Gateway answering with `script`, in order
        #[must_use]
        pub fn new(
            script: impl IntoIterator<Item = GatewayResult<PaymentIntentDescriptor>>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                last: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Gateway that always answers with `response`
        #[must_use]
        pub fn always(response: GatewayResult<PaymentIntentDescriptor>) -> Self {
            Self::new([response])
        }

        /// Number of `process_payment` calls so far
        #[must_use]
        pub fn calls(&self) -> usize {
            lock(&self.calls).len()
        }

        /// Instants at which each call was made
        #[must_use]
        pub fn call_times(&self) -> Vec<Instant> {
            lock(&self.calls).iter().map(|(at, _)| *at).collect()
        }

        /// References each call was made with
        #[must_use]
        pub fn references(&self) -> Vec<PurchaseRequestReference> {
            lock(&self.calls).iter().map(|(_, r)| r.clone()).collect()
        }

        fn next_response(&self) -> GatewayResult<PaymentIntentDescriptor> {
            let next = lock(&self.script).pop_front();
            let mut last = lock(&self.last);
            match next {
                Some(response) => {
                    *last = Some(response.clone());
                    response
                },
                None => last
                    .clone()
                    .unwrap_or_else(|| Err(GatewayError::Transport("script is empty".to_string()))),
            }
        }
    }

    impl PaymentGateway for ScriptedGateway {
        fn process_payment<'a>(
            &'a self,
            reference: &'a PurchaseRequestReference,
        ) -> BoxFuture<'a, GatewayResult<PaymentIntentDescriptor>> {
            Box::pin(async move {
                lock(&self.calls).push((Instant::now(), reference.clone()));
                self.next_response()
            })
        }
    }

    /// Card confirmer that replays a script of provider answers.
    ///
    /// Repeats the last answer once the script runs out, like [`ScriptedGateway`].
    #[derive(Debug)]
    pub struct ScriptedCardConfirmer {
        script: Mutex<VecDeque<Result<ConfirmedIntent, ConfirmationError>>>,
        last: Mutex<Option<Result<ConfirmedIntent, ConfirmationError>>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedCardConfirmer {
        /// Confirmer answering with `script`, in order
        #[must_use]
        pub fn new(
            script: impl IntoIterator<Item = Result<ConfirmedIntent, ConfirmationError>>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                last: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Confirmer that reports `status` for intent `id`
        #[must_use]
        pub fn with_status(id: &str, status: IntentStatus) -> Self {
            Self::new([Ok(ConfirmedIntent {
                id: id.to_string(),
                status,
            })])
        }

        /// Confirmer that rejects every card with `error`
        #[must_use]
        pub fn failing(error: ConfirmationError) -> Self {
            Self::new([Err(error)])
        }

        /// Number of confirmation calls so far
        #[must_use]
        pub fn calls(&self) -> usize {
            lock(&self.calls).len()
        }

        /// `(client_secret, payment_method)` of each call
        #[must_use]
        pub fn recorded(&self) -> Vec<(String, String)> {
            lock(&self.calls).clone()
        }
    }

    impl CardConfirmer for ScriptedCardConfirmer {
        fn confirm_card_payment<'a>(
            &'a self,
            client_secret: &'a ClientSecret,
            card: &'a CardInput,
        ) -> BoxFuture<'a, Result<ConfirmedIntent, ConfirmationError>> {
            Box::pin(async move {
                lock(&self.calls).push((
                    client_secret.expose().to_string(),
                    card.payment_method().to_string(),
                ));
                let next = lock(&self.script).pop_front();
                let mut last = lock(&self.last);
                match next {
                    Some(response) => {
                        *last = Some(response.clone());
                        response
                    },
                    None => last
                        .clone()
                        .unwrap_or_else(|| Err(ConfirmationError::api("script is empty"))),
                }
            })
        }
    }

    /// Navigator that records every request with the instant it was made.
    #[derive(Debug, Default)]
    pub struct RecordingNavigator {
        targets: Mutex<Vec<(Instant, NavigationTarget)>>,
    }

    impl RecordingNavigator {
        /// Empty navigator
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Targets navigated to, in order
        #[must_use]
        pub fn targets(&self) -> Vec<NavigationTarget> {
            lock(&self.targets).iter().map(|(_, t)| t.clone()).collect()
        }

        /// Instants of each navigation
        #[must_use]
        pub fn times(&self) -> Vec<Instant> {
            lock(&self.targets).iter().map(|(at, _)| *at).collect()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, target: NavigationTarget) {
            lock(&self.targets).push((Instant::now(), target));
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness.
    ///
    /// Honors `RUST_LOG`; safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{
    FixedClock, RecordingNavigator, ScriptedCardConfirmer, ScriptedGateway, descriptor,
    gateway_status, test_clock,
};
pub use reducer_test::ReducerTest;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ourbusway_core::navigation::{NavigationTarget, Navigator};
    use ourbusway_core::payment::PaymentGateway;
    use ourbusway_core::types::{PurchaseRequestReference, TicketRequestId};

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[tokio::test]
    async fn scripted_gateway_repeats_last_response() {
        let gateway = ScriptedGateway::new([Err(gateway_status(404)), Ok(descriptor("pi_1"))]);
        let reference =
            PurchaseRequestReference::Ticket(TicketRequestId::new("tr-1").unwrap());

        assert_eq!(
            gateway.process_payment(&reference).await,
            Err(gateway_status(404))
        );
        assert_eq!(
            gateway.process_payment(&reference).await.unwrap().provider_intent_id,
            "pi_1"
        );
        assert_eq!(
            gateway.process_payment(&reference).await.unwrap().provider_intent_id,
            "pi_1"
        );
        assert_eq!(gateway.calls(), 3);
        assert_eq!(gateway.references()[0], reference);
    }

    #[tokio::test]
    async fn scripted_gateway_records_only_polled_calls() {
        let gateway = ScriptedGateway::new([Err(gateway_status(404)), Ok(descriptor("pi_1"))]);
        let reference =
            PurchaseRequestReference::Ticket(TicketRequestId::new("tr-1").unwrap());

        drop(gateway.process_payment(&reference));
        assert_eq!(gateway.calls(), 0);

        assert_eq!(
            gateway.process_payment(&reference).await,
            Err(gateway_status(404))
        );
        assert_eq!(gateway.calls(), 1);
    }

    #[test]
    fn recording_navigator_keeps_order() {
        let navigator = RecordingNavigator::new();
        navigator.navigate(NavigationTarget::new(NavigationTarget::LOGIN));
        navigator.navigate(NavigationTarget::new(NavigationTarget::BUY_TICKET));
        assert_eq!(
            navigator.targets(),
            vec![
                NavigationTarget::new("/login"),
                NavigationTarget::new("/passenger/buy-ticket"),
            ]
        );
    }

    #[test]
    fn descriptor_secret_embeds_intent_id() {
        let intent = descriptor("pi_9");
        assert_eq!(intent.client_secret.intent_id(), Some("pi_9"));
        assert_eq!(intent.display_amount(), "25.00 MAD");
    }
}
