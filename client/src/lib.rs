//! # OurBusWay Client
//!
//! Typed HTTP client for the OurBusWay gateway, plus the card confirmation
//! adapter for the payment provider.
//!
//! ## Example
//!
//! ```no_run
//! use ourbusway_client::{ApiClient, ApiConfig, AuthApi, LoginRequest};
//! use ourbusway_core::session::Session;
//!
//! # async fn example() -> Result<(), ourbusway_client::ApiError> {
//! let client = ApiClient::new(&ApiConfig::default())?;
//! let response = AuthApi::new(client.clone())
//!     .login(&LoginRequest {
//!         email: "amina@example.com".to_string(),
//!         password: "secret".to_string(),
//!     })
//!     .await?;
//! let session = Session::from(response);
//! let tickets = client.with_session(&session).tickets().history(0, 10).await?;
//! # Ok(())
//! # }
//! ```

pub mod admin_stats;
pub mod api;
pub mod auth;
pub mod error;
pub mod incidents;
pub mod payments;
pub mod routes;
pub mod stripe;
pub mod subscriptions;
pub mod tickets;
pub mod trips;
pub mod types;

pub use admin_stats::AdminStatsApi;
pub use api::{ApiClient, ApiConfig};
pub use auth::{AuthApi, LoginRequest, LoginResponse};
pub use error::ApiError;
pub use incidents::IncidentApi;
pub use payments::PaymentApi;
pub use routes::RouteApi;
pub use stripe::StripeCardConfirmer;
pub use subscriptions::{InspectionResult, SubscriptionApi};
pub use tickets::TicketApi;
pub use trips::TripApi;
pub use types::Page;

impl ApiClient {
    /// Authentication service
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Ticket service
    #[must_use]
    pub fn tickets(&self) -> TicketApi {
        TicketApi::new(self.clone())
    }

    /// Subscription service
    #[must_use]
    pub fn subscriptions(&self) -> SubscriptionApi {
        SubscriptionApi::new(self.clone())
    }

    /// Payment service
    #[must_use]
    pub fn payments(&self) -> PaymentApi {
        PaymentApi::new(self.clone())
    }

    /// Route service
    #[must_use]
    pub fn routes(&self) -> RouteApi {
        RouteApi::new(self.clone())
    }

    /// Driver trips
    #[must_use]
    pub fn trips(&self) -> TripApi {
        TripApi::new(self.clone())
    }

    /// Incident reporting
    #[must_use]
    pub fn incidents(&self) -> IncidentApi {
        IncidentApi::new(self.clone())
    }

    /// Back-office statistics
    #[must_use]
    pub fn admin_stats(&self) -> AdminStatsApi {
        AdminStatsApi::new(self.clone())
    }
}
