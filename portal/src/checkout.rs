//! Checkout page for tickets and subscriptions.
//!
//! The page runs in two steps:
//!
//! 1. **Open**: obtain the payment intent for the purchase request, polling
//!    through the backend's processing window ([`PaymentInitializer`])
//! 2. **Submit**: confirm the card with the payment provider, once per
//!    submission, then leave the page after a short delay on success
//!
//! All decisions live in [`CheckoutReducer`]; network calls and the redirect
//! timer are effects run by the [`Store`].

use ourbusway_core::effect::Effect;
use ourbusway_core::environment::{Clock, SystemClock};
use ourbusway_core::error::{InvalidReference, PaymentError};
use ourbusway_core::navigation::{NavigationTarget, Navigator};
use ourbusway_core::payment::CardConfirmer;
use ourbusway_core::reducer::Reducer;
use ourbusway_core::types::{
    CardInput, ConfirmedIntent, PaymentIntentDescriptor, PurchaseRequestReference,
};
use ourbusway_core::{DateTime, SmallVec, Utc, smallvec};
use ourbusway_runtime::store::Store;
use ourbusway_runtime::{PaymentInitializer, error::StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Types
// ============================================================================

/// What is being paid for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckoutKind {
    /// A single ticket
    Ticket,
    /// A subscription
    Subscription,
}

impl CheckoutKind {
    /// Where to go after a successful payment
    #[must_use]
    pub fn success_target(self) -> NavigationTarget {
        match self {
            Self::Ticket => NavigationTarget::new(NavigationTarget::TICKETS_REFRESH),
            Self::Subscription => NavigationTarget::new(NavigationTarget::SUBSCRIPTION_REFRESH),
        }
    }

    /// Where "back" leads, and where an unusable request sends the user
    #[must_use]
    pub fn back_target(self) -> NavigationTarget {
        match self {
            Self::Ticket => NavigationTarget::new(NavigationTarget::BUY_TICKET),
            Self::Subscription => NavigationTarget::new(NavigationTarget::SUBSCRIPTION),
        }
    }

    const fn missing_reference_message(self) -> &'static str {
        match self {
            Self::Ticket => "Ticket request ID missing",
            Self::Subscription => "Subscription request ID missing",
        }
    }

    const fn success_message(self) -> &'static str {
        match self {
            Self::Ticket => "Payment successful! Your ticket is confirmed.",
            Self::Subscription => "Payment successful! Your subscription is now active.",
        }
    }

    const fn accepts(self, reference: &PurchaseRequestReference) -> bool {
        matches!(
            (self, reference),
            (Self::Ticket, PurchaseRequestReference::Ticket(_))
                | (Self::Subscription, PurchaseRequestReference::Subscription(_))
        )
    }
}

/// Where the page is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckoutPhase {
    /// Not opened yet
    Idle,
    /// Waiting for the payment intent
    Initializing,
    /// Payment intent obtained; the card form is enabled
    Ready,
    /// The payment intent could not be obtained
    InitFailed,
    /// Card submitted to the provider
    Confirming,
    /// Charge completed; redirect pending
    Succeeded,
    /// Provider rejected the card; the user may resubmit
    Failed,
    /// Provider answered with a non-final status
    Pending,
}

/// Severity of a [`Notice`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// Positive feedback
    Success,
    /// Needs attention
    Warning,
    /// Something failed
    Error,
}

/// Transient message shown to the user (toast)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text
    pub text: String,
    /// When it was raised
    pub at: DateTime<Utc>,
}

impl Notice {
    fn new(at: DateTime<Utc>, level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            at,
        }
    }
}

/// Identifiers the page was opened with (query parameters)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceParts {
    /// `ticketRequestId`
    pub ticket_request_id: Option<String>,
    /// `subscriptionRequestId`
    pub subscription_request_id: Option<String>,
}

impl ReferenceParts {
    /// Parts for a ticket purchase request
    #[must_use]
    pub fn ticket(id: impl Into<String>) -> Self {
        Self {
            ticket_request_id: Some(id.into()),
            subscription_request_id: None,
        }
    }

    /// Parts for a subscription purchase request
    #[must_use]
    pub fn subscription(id: impl Into<String>) -> Self {
        Self {
            ticket_request_id: None,
            subscription_request_id: Some(id.into()),
        }
    }
}

/// Checkout page state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutState {
    /// What is being paid for
    pub kind: CheckoutKind,
    /// Lifecycle phase
    pub phase: CheckoutPhase,
    /// Purchase request being paid
    pub reference: Option<PurchaseRequestReference>,
    /// Payment intent obtained for `reference`
    pub descriptor: Option<PaymentIntentDescriptor>,
    /// Inline error
    pub error: Option<String>,
    /// Notices, oldest first
    pub notices: Vec<Notice>,
    /// Navigation requests, oldest first
    pub navigations: Vec<NavigationTarget>,
    /// Card submissions sent to the provider
    pub confirmation_attempts: u32,
}

impl CheckoutState {
    /// Fresh page
    #[must_use]
    pub const fn new(kind: CheckoutKind) -> Self {
        Self {
            kind,
            phase: CheckoutPhase::Idle,
            reference: None,
            descriptor: None,
            error: None,
            notices: Vec::new(),
            navigations: Vec::new(),
            confirmation_attempts: 0,
        }
    }

    /// Amount line of the summary (`25.00 MAD`), once known
    #[must_use]
    pub fn amount_label(&self) -> Option<String> {
        self.descriptor
            .as_ref()
            .map(PaymentIntentDescriptor::display_amount)
    }

    /// Whether the card form accepts a submission
    #[must_use]
    pub const fn can_submit(&self) -> bool {
        self.descriptor.is_some()
            && matches!(
                self.phase,
                CheckoutPhase::Ready | CheckoutPhase::Failed | CheckoutPhase::Pending
            )
    }

    /// Most recent notice
    #[must_use]
    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    fn notify(&mut self, clock: &dyn Clock, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(Notice::new(clock.now(), level, text));
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Checkout page actions
#[derive(Clone, Debug)]
pub enum CheckoutAction {
    /// Page opened with these identifiers
    Open(ReferenceParts),
    /// Payment intent obtained
    Initialized(PaymentIntentDescriptor),
    /// Payment intent could not be obtained
    InitializationFailed(PaymentError),
    /// User submitted the card form
    SubmitCard(CardInput),
    /// Provider answered the confirmation
    Confirmed(ConfirmedIntent),
    /// Provider rejected the confirmation
    ConfirmationFailed(PaymentError),
    /// Leave the page
    Navigate(NavigationTarget),
    /// Page torn down
    Close,
}

// ============================================================================
// Environment
// ============================================================================

/// Collaborators of the checkout page
#[derive(Clone)]
pub struct CheckoutEnvironment {
    /// Obtains payment intents
    pub initializer: PaymentInitializer,
    /// Confirms cards with the provider
    pub confirmer: Arc<dyn CardConfirmer>,
    /// Performs navigation
    pub navigator: Arc<dyn Navigator>,
    /// Stamps notices
    pub clock: Arc<dyn Clock>,
    /// Pause between success and redirect
    pub redirect_delay: Duration,
    cancel: CancellationToken,
}

impl CheckoutEnvironment {
    /// Redirect delay after a successful payment
    pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_secs(2);

    /// Creates an environment with the default redirect delay
    #[must_use]
    pub fn new(
        initializer: PaymentInitializer,
        confirmer: Arc<dyn CardConfirmer>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            initializer,
            confirmer,
            navigator,
            clock: Arc::new(SystemClock),
            redirect_delay: Self::DEFAULT_REDIRECT_DELAY,
            cancel: CancellationToken::new(),
        }
    }

    /// Override the redirect delay
    #[must_use]
    pub const fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    /// Override the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Token cancelled by [`CheckoutAction::Close`]
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl std::fmt::Debug for CheckoutEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutEnvironment")
            .field("retry_policy", self.initializer.retry_policy())
            .field("redirect_delay", &self.redirect_delay)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the checkout page
#[derive(Clone, Debug, Default)]
pub struct CheckoutReducer;

impl CheckoutReducer {
    /// Creates a new `CheckoutReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Turn the page parameters into a reference this page can pay for.
    fn resolve(
        kind: CheckoutKind,
        parts: &ReferenceParts,
    ) -> Result<PurchaseRequestReference, String> {
        match PurchaseRequestReference::from_parts(
            parts.ticket_request_id.as_deref(),
            parts.subscription_request_id.as_deref(),
        ) {
            Ok(reference) if kind.accepts(&reference) => Ok(reference),
            Err(err @ InvalidReference::Both) => Err(PaymentError::from(err).user_message()),
            Ok(_) | Err(_) => Err(kind.missing_reference_message().to_string()),
        }
    }

    fn navigate(
        state: &mut CheckoutState,
        env: &CheckoutEnvironment,
        target: NavigationTarget,
    ) -> Effect<CheckoutAction> {
        tracing::info!(path = %target, "Leaving checkout");
        state.navigations.push(target.clone());
        let navigator = Arc::clone(&env.navigator);
        Effect::Future(Box::pin(async move {
            navigator.navigate(target);
            None
        }))
    }

    fn initialize(
        reference: PurchaseRequestReference,
        env: &CheckoutEnvironment,
    ) -> Effect<CheckoutAction> {
        let initializer = env.initializer.clone();
        let cancel = env.cancel.clone();
        Effect::Future(Box::pin(async move {
            match initializer.initialize(&reference, &cancel).await {
                Ok(descriptor) => Some(CheckoutAction::Initialized(descriptor)),
                Err(PaymentError::Cancelled) => None,
                Err(err) => Some(CheckoutAction::InitializationFailed(err)),
            }
        }))
    }

    fn confirm(
        descriptor: &PaymentIntentDescriptor,
        card: CardInput,
        env: &CheckoutEnvironment,
    ) -> Effect<CheckoutAction> {
        let confirmer = Arc::clone(&env.confirmer);
        let client_secret = descriptor.client_secret.clone();
        Effect::Future(Box::pin(async move {
            match confirmer.confirm_card_payment(&client_secret, &card).await {
                Ok(intent) => Some(CheckoutAction::Confirmed(intent)),
                Err(err) => Some(CheckoutAction::ConfirmationFailed(
                    PaymentError::ProviderConfirmation(err),
                )),
            }
        }))
    }
}

impl Reducer for CheckoutReducer {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = CheckoutEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Open ==========
            CheckoutAction::Open(parts) => {
                if matches!(
                    state.phase,
                    CheckoutPhase::Initializing | CheckoutPhase::Confirming | CheckoutPhase::Succeeded
                ) {
                    tracing::debug!(phase = ?state.phase, "Open ignored");
                    return SmallVec::new();
                }

                let reference = match Self::resolve(state.kind, &parts) {
                    Ok(reference) => reference,
                    Err(message) => {
                        tracing::warn!(kind = ?state.kind, "Checkout opened without a usable purchase request");
                        state.error = Some(message.clone());
                        state.notify(env.clock.as_ref(), NoticeLevel::Error, message);
                        let back = state.kind.back_target();
                        return smallvec![Self::navigate(state, env, back)];
                    },
                };

                tracing::info!(reference = %reference, "Initializing payment");
                state.phase = CheckoutPhase::Initializing;
                state.reference = Some(reference.clone());
                state.descriptor = None;
                state.error = None;
                smallvec![Self::initialize(reference, env)]
            },

            // ========== Initialization results ==========
            CheckoutAction::Initialized(descriptor) => {
                if state.phase != CheckoutPhase::Initializing {
                    return SmallVec::new();
                }
                state.phase = CheckoutPhase::Ready;
                state.descriptor = Some(descriptor);
                state.notify(env.clock.as_ref(), NoticeLevel::Success, "Ready for payment");
                SmallVec::new()
            },

            CheckoutAction::InitializationFailed(err) => {
                if state.phase != CheckoutPhase::Initializing {
                    return SmallVec::new();
                }
                tracing::warn!(error = %err, "Payment initialization failed");
                let message = err.user_message();
                state.phase = CheckoutPhase::InitFailed;
                state.error = Some(message.clone());
                state.notify(env.clock.as_ref(), NoticeLevel::Error, message);
                SmallVec::new()
            },

            // ========== Card submission ==========
            CheckoutAction::SubmitCard(card) => {
                if matches!(
                    state.phase,
                    CheckoutPhase::Confirming | CheckoutPhase::Succeeded
                ) {
                    tracing::debug!(phase = ?state.phase, "Submission ignored");
                    return SmallVec::new();
                }

                let Some(descriptor) = state.descriptor.as_ref() else {
                    state.notify(
                        env.clock.as_ref(),
                        NoticeLevel::Error,
                        PaymentError::MissingDescriptor.user_message(),
                    );
                    return SmallVec::new();
                };

                let effect = Self::confirm(descriptor, card, env);
                state.phase = CheckoutPhase::Confirming;
                state.error = None;
                state.confirmation_attempts += 1;
                smallvec![effect]
            },

            // ========== Confirmation results ==========
            CheckoutAction::Confirmed(intent) => {
                if state.phase != CheckoutPhase::Confirming {
                    return SmallVec::new();
                }

                if intent.status.is_success() {
                    tracing::info!(payment_intent_id = %intent.id, "Payment succeeded");
                    let kind = state.kind;
                    state.phase = CheckoutPhase::Succeeded;
                    state.notify(env.clock.as_ref(), NoticeLevel::Success, kind.success_message());
                    smallvec![Effect::Delay {
                        duration: env.redirect_delay,
                        action: Box::new(CheckoutAction::Navigate(kind.success_target())),
                    }]
                } else {
                    tracing::warn!(
                        payment_intent_id = %intent.id,
                        status = %intent.status,
                        "Unexpected payment status"
                    );
                    let message = PaymentError::UnexpectedIntentStatus(intent.status).user_message();
                    state.phase = CheckoutPhase::Pending;
                    state.error = Some(message.clone());
                    state.notify(env.clock.as_ref(), NoticeLevel::Warning, message);
                    SmallVec::new()
                }
            },

            CheckoutAction::ConfirmationFailed(err) => {
                if state.phase != CheckoutPhase::Confirming {
                    return SmallVec::new();
                }
                tracing::warn!(error = %err, "Card confirmation failed");
                let message = err.user_message();
                state.phase = CheckoutPhase::Failed;
                state.error = Some(message.clone());
                state.notify(env.clock.as_ref(), NoticeLevel::Error, message);
                SmallVec::new()
            },

            // ========== Leaving ==========
            CheckoutAction::Navigate(target) => smallvec![Self::navigate(state, env, target)],

            CheckoutAction::Close => {
                env.cancel.cancel();
                SmallVec::new()
            },
        }
    }
}

// ============================================================================
// Driving a checkout
// ============================================================================

/// Store running one checkout page
pub type CheckoutStore = Store<CheckoutState, CheckoutAction, CheckoutEnvironment, CheckoutReducer>;

/// Create the store for a checkout page
#[must_use]
pub fn checkout_store(kind: CheckoutKind, environment: CheckoutEnvironment) -> CheckoutStore {
    Store::new(CheckoutState::new(kind), CheckoutReducer::new(), environment)
}

async fn wait_for(
    receiver: &mut broadcast::Receiver<CheckoutAction>,
    predicate: impl Fn(&CheckoutAction) -> bool,
    timeout: Duration,
) -> Result<CheckoutAction, StoreError> {
    let wait = async {
        loop {
            match receiver.recv().await {
                Ok(action) if predicate(&action) => return Ok(action),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {},
                Err(broadcast::error::RecvError::Closed) => return Err(StoreError::ChannelClosed),
            }
        }
    };
    tokio::time::timeout(timeout, wait)
        .await
        .unwrap_or(Err(StoreError::Timeout))
}

/// Open the page, submit `card` once the intent is ready, and wait for the
/// redirect after a successful payment.
///
/// Stops early, returning the state reached, when a step fails. The redirect
/// counts as a step, so `step_timeout` must exceed the redirect delay.
///
/// # Errors
///
/// [`StoreError::Timeout`] when a step takes longer than `step_timeout`;
/// [`StoreError::ShutdownInProgress`] when the store is shut down meanwhile.
pub async fn complete_checkout(
    store: &CheckoutStore,
    parts: ReferenceParts,
    card: CardInput,
    step_timeout: Duration,
) -> Result<CheckoutState, StoreError> {
    let mut opened = store.subscribe_actions();
    store.send(CheckoutAction::Open(parts)).await?;
    if store.state(|s| s.phase).await == CheckoutPhase::Initializing {
        wait_for(
            &mut opened,
            |a| {
                matches!(
                    a,
                    CheckoutAction::Initialized(_) | CheckoutAction::InitializationFailed(_)
                )
            },
            step_timeout,
        )
        .await?;
    }
    if store.state(|s| s.phase).await != CheckoutPhase::Ready {
        return Ok(store.state(Clone::clone).await);
    }

    let mut redirected = store.subscribe_actions();
    store
        .send_and_wait_for(
            CheckoutAction::SubmitCard(card),
            |a| {
                matches!(
                    a,
                    CheckoutAction::Confirmed(_) | CheckoutAction::ConfirmationFailed(_)
                )
            },
            step_timeout,
        )
        .await?;

    if store.state(|s| s.phase).await == CheckoutPhase::Succeeded {
        wait_for(
            &mut redirected,
            |a| matches!(a, CheckoutAction::Navigate(_)),
            step_timeout,
        )
        .await?;
    }
    Ok(store.state(Clone::clone).await)
}

/// Tear the page down: cancel initialization, then stop the store.
///
/// Safe to call on a store that is already shut down.
pub async fn close_checkout(store: &CheckoutStore) {
    if let Err(err) = store.send(CheckoutAction::Close).await {
        tracing::debug!(error = %err, "Checkout already closed");
    }
    store.shutdown();
}
