//! Current sign-in for a portal instance.
//!
//! [`SessionStore`] is handed to whatever needs the signed-in user. It hands
//! out gateway clients carrying the session token and reacts to an expired
//! token by signing out and sending the user to the sign-in page.

use ourbusway_client::{ApiClient, ApiError, LoginRequest};
use ourbusway_core::navigation::{NavigationTarget, Navigator};
use ourbusway_core::session::Session;
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory holder of the current [`Session`]
#[derive(Clone)]
pub struct SessionStore {
    client: ApiClient,
    navigator: Arc<dyn Navigator>,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    /// Signed-out store over `client`
    #[must_use]
    pub fn new(client: ApiClient, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            client: client.without_session(),
            navigator,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the current session
    pub fn sign_in(&self, session: Session) {
        tracing::info!(user_id = %session.user.id, "Signed in");
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Forget the current session
    pub fn sign_out(&self) {
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = previous {
            tracing::info!(user_id = %session.user.id, "Signed out");
        }
    }

    /// Current session, if any
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a session is held
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Gateway client for the current session (anonymous when signed out)
    #[must_use]
    pub fn client(&self) -> ApiClient {
        self.current()
            .map_or_else(|| self.client.clone(), |session| self.client.with_session(&session))
    }

    /// Sign in with email and password and keep the resulting session.
    ///
    /// Returns the landing path for the user's role.
    ///
    /// # Errors
    ///
    /// Whatever the auth service reports; the current session is untouched.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<NavigationTarget, ApiError> {
        let response = self.client.auth().login(credentials).await?;
        let session = Session::from(response);
        let home = session
            .user
            .role()
            .map_or(NavigationTarget::LOGIN, |role| role.home_path());
        self.sign_in(session);
        Ok(NavigationTarget::new(home))
    }

    /// Tell the auth service, then forget the session whatever it answered.
    pub async fn logout(&self) {
        if let Err(err) = self.client().auth().logout().await {
            tracing::debug!(error = %err, "Logout call failed");
        }
        self.sign_out();
    }

    /// Apply the portal-wide reaction to a gateway error.
    ///
    /// An expired or missing token clears the session and navigates to the
    /// sign-in page. Returns `true` when that happened.
    pub fn handle_error(&self, err: &ApiError) -> bool {
        if !err.is_unauthorized() {
            return false;
        }
        tracing::info!("Session rejected by the gateway");
        self.sign_out();
        self.navigator
            .navigate(NavigationTarget::new(NavigationTarget::LOGIN));
        true
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
