//! # OurBusWay Runtime
//!
//! Runtime pieces for the OurBusWay portal.
//!
//! ## Core Components
//!
//! - **Store**: manages page state and executes effects
//! - **Retry**: bounded, cancellable retry with a delay between attempts
//! - **Payment initialization**: polls the payment gateway until the payment
//!   intent for a purchase request exists
//!
//! ## Example
//!
//! ```ignore
//! use ourbusway_runtime::Store;
//!
//! let store = Store::new(CheckoutState::default(), CheckoutReducer::new(), env);
//! let _guard = store.drop_guard();
//!
//! store.send(CheckoutAction::Open { .. }).await?;
//! let phase = store.state(|s| s.phase).await;
//! ```

/// Bounded retry with cancellation
pub mod retry;

/// Payment-intent acquisition
pub mod payment_init;

/// Metric names and descriptions
pub mod metrics;

pub use payment_init::{NotReadyPolicy, PaymentInitializer};
pub use retry::{RetryOutcome, RetryPolicy, RetryState};
pub use store::Store;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

/// Store module - state container and effect executor
pub mod store {
    use super::error::StoreError;
    use crate::metrics::names;
    use ourbusway_core::{effect::Effect, reducer::Reducer};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{RwLock, broadcast};
    use tokio_util::sync::{CancellationToken, DropGuard};

    type EffectFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

    /// Decrements the pending-effect counter when an effect task ends,
    /// including when it is cancelled.
    struct PendingGuard(Arc<AtomicUsize>);

    impl Drop for PendingGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// The Store - runtime for a reducer
    ///
    /// The Store:
    /// 1. Holds state behind an async `RwLock`
    /// 2. Runs the reducer for each action
    /// 3. Executes the returned effects on spawned tasks
    /// 4. Feeds actions produced by effects back into the reducer
    ///
    /// Every effect task races against the store's cancellation token. Once the
    /// store is shut down, pending delays and futures are dropped and no
    /// further action reaches the reducer. A page that is closed therefore
    /// leaves nothing running behind it.
    ///
    /// Cloning a store yields another handle to the same state.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        cancel: CancellationToken,
        pending_effects: Arc<AtomicUsize>,
        /// Action broadcast channel for observing actions produced by effects.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                cancel: self.cancel.clone(),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Clone + Send + std::fmt::Debug + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a new store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                cancel: CancellationToken::new(),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// Runs the reducer under the state write lock, then starts the
        /// returned effects. Returns once the effects are started, not finished.
        ///
        /// # Errors
        ///
        /// [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.cancel.is_cancelled() {
                tracing::debug!(?action, "Store shut down, dropping action");
                return Err(StoreError::ShutdownInProgress);
            }

            let effects = {
                let mut state = self.state.write().await;
                self.reducer.reduce(&mut state, action, &self.environment)
            };
            metrics::counter!(names::ACTIONS_PROCESSED).increment(1);

            for effect in effects {
                self.execute_effect(effect);
            }
            Ok(())
        }

        /// Send an action and wait for a matching action produced by an effect
        ///
        /// Subscribes before sending so no produced action is missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action within `timeout`
        /// - [`StoreError::ChannelClosed`]: broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: store shut down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut receiver = self.action_broadcast.subscribe();
            self.send(action).await?;

            let wait = async {
                loop {
                    match receiver.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            };

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => Err(StoreError::ShutdownInProgress),
                result = tokio::time::timeout(timeout, wait) => {
                    result.unwrap_or(Err(StoreError::Timeout))
                }
            }
        }

        /// Read a projection of the current state
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Subscribe to actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Effects started but not yet finished
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Stop accepting actions and abandon every pending effect.
        pub fn shutdown(&self) {
            if !self.cancel.is_cancelled() {
                tracing::debug!(pending = self.pending_effects(), "Shutting down store");
            }
            self.cancel.cancel();
        }

        /// Whether [`shutdown`](Self::shutdown) has been called
        #[must_use]
        pub fn is_shut_down(&self) -> bool {
            self.cancel.is_cancelled()
        }

        /// Guard that shuts the store down when dropped.
        ///
        /// Hold it for as long as the owning page is alive.
        #[must_use]
        pub fn drop_guard(&self) -> DropGuard {
            self.cancel.clone().drop_guard()
        }

        /// Child token cancelled together with the store, for effects that
        /// need to observe cancellation themselves.
        #[must_use]
        pub fn cancellation_token(&self) -> CancellationToken {
            self.cancel.child_token()
        }

        fn execute_effect(&self, effect: Effect<A>) {
            if effect.is_none() {
                metrics::counter!(names::EFFECTS_EXECUTED, "type" => "none").increment(1);
                return;
            }

            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let guard = PendingGuard(Arc::clone(&self.pending_effects));
            let cancel = self.cancel.clone();
            let run = self.clone().run_effect(effect);

            tokio::spawn(async move {
                let _guard = guard;
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        tracing::trace!("Effect abandoned on shutdown");
                    }
                    () = run => {}
                }
            });
        }

        /// Runs one effect to completion, feeding produced actions back.
        fn run_effect(self, effect: Effect<A>) -> EffectFuture {
            Box::pin(async move {
                match effect {
                    Effect::None => {
                        metrics::counter!(names::EFFECTS_EXECUTED, "type" => "none").increment(1);
                    },
                    Effect::Future(fut) => {
                        metrics::counter!(names::EFFECTS_EXECUTED, "type" => "future").increment(1);
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action");
                            self.feed_back(action).await;
                        }
                    },
                    Effect::Delay { duration, action } => {
                        metrics::counter!(names::EFFECTS_EXECUTED, "type" => "delay").increment(1);
                        tracing::trace!(?duration, "Executing Effect::Delay");
                        tokio::time::sleep(duration).await;
                        self.feed_back(*action).await;
                    },
                }
            })
        }

        async fn feed_back(&self, action: A) {
            if self.cancel.is_cancelled() {
                return;
            }
            // Reduce before broadcasting: observers woken by an action see
            // the state it produced.
            if let Err(err) = self.send(action.clone()).await {
                tracing::debug!(error = %err, "Produced action dropped");
                return;
            }
            let _ = self.action_broadcast.send(action);
        }
    }
}
