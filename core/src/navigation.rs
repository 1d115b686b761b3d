//! Navigation requests emitted by portal pages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Application path a page asks to move to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavigationTarget(String);

impl NavigationTarget {
    /// Tickets list, refreshed after a ticket payment
    pub const TICKETS_REFRESH: &'static str = "/passenger/tickets?refresh=true";
    /// Subscription page, refreshed after a subscription payment
    pub const SUBSCRIPTION_REFRESH: &'static str = "/passenger/subscription?refresh=true";
    /// Ticket purchase page
    pub const BUY_TICKET: &'static str = "/passenger/buy-ticket";
    /// Subscription page
    pub const SUBSCRIPTION: &'static str = "/passenger/subscription";
    /// Sign-in page
    pub const LOGIN: &'static str = "/login";

    /// Creates a target from a path
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Performs navigation on behalf of a page.
pub trait Navigator: Send + Sync {
    /// Move to `target`
    fn navigate(&self, target: NavigationTarget);
}
