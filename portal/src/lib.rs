//! # OurBusWay Portal
//!
//! Page flows of the passenger and back-office portal, built on the gateway
//! client and the reducer runtime.
//!
//! - [`checkout`]: payment of a ticket or subscription request
//! - [`session`]: current sign-in
//! - [`booking`]: trip search form
//! - [`dashboard`]: back-office statistics
//! - [`config`]: environment configuration

pub mod booking;
pub mod checkout;
pub mod config;
pub mod dashboard;
pub mod session;

pub use booking::{BookingError, BookingRequest, KNOWN_LOCATIONS};
pub use checkout::{
    CheckoutAction, CheckoutEnvironment, CheckoutKind, CheckoutPhase, CheckoutReducer,
    CheckoutState, CheckoutStore, Notice, NoticeLevel, ReferenceParts, checkout_store,
    close_checkout, complete_checkout,
};
pub use config::{Config, ConfigError};
pub use dashboard::DashboardOverview;
pub use session::SessionStore;
