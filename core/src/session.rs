//! Signed-in identity.
//!
//! The portal passes a [`Session`] explicitly to whatever needs the current
//! user instead of reading a process-wide token store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a platform account
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Buys tickets and subscriptions
    Passenger,
    /// Operates trips
    Driver,
    /// Inspects tickets on board
    Controller,
    /// Runs the back office
    Admin,
}

impl UserRole {
    /// Landing path after sign-in
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Passenger => "/passenger",
            Self::Driver => "/driver",
            Self::Controller => "/controller",
            Self::Admin => "/admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passenger" => Ok(Self::Passenger),
            "driver" => Ok(Self::Driver),
            "controller" => Ok(Self::Controller),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The signed-in account as returned by the auth service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Account id
    pub id: String,
    /// Email
    pub email: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Role, as sent by the backend (any case)
    pub role: String,
}

impl SessionUser {
    /// Parsed role, if the backend sent a known one
    #[must_use]
    pub fn role(&self) -> Option<UserRole> {
        self.role.parse().ok()
    }

    /// "First Last"
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Bearer token plus the user it belongs to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    /// Signed-in user
    pub user: SessionUser,
}

impl Session {
    /// Creates a session
    #[must_use]
    pub fn new(token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Bearer token for the `Authorization` header
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}
