//! Driver trip endpoints (`/routeMgtApi/trips`).

use crate::api::{ApiClient, PageQuery};
use crate::error::ApiError;
use crate::types::Page;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Path prefix of the trip endpoints
pub const TRIP_BASE: &str = "/routeMgtApi/trips";

/// Lifecycle of a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    /// Bus on the road
    InProgress,
    /// Ended by the driver
    Completed,
    /// Called off
    Cancelled,
}

/// A run of a bus along a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// Trip id
    pub id: String,
    /// Route driven
    pub route_id: String,
    /// Controller on board, if any
    #[serde(default)]
    pub inspector_id: Option<String>,
    /// Bus used
    #[serde(default)]
    pub bus_id: Option<String>,
    /// Driver
    pub driver_id: String,
    /// Start, as sent by the service (`2025-11-28T18:46:11.142`)
    pub start_time: String,
    /// End, once ended
    #[serde(default)]
    pub end_time: Option<String>,
    /// Status
    pub status: TripStatus,
}

impl Trip {
    /// Whether the trip is still running
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self.status, TripStatus::InProgress)
    }
}

/// Trip start
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTripRequest {
    /// Route to drive
    pub route_id: String,
    /// Bus used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_id: Option<String>,
    /// Start time; the service uses its own clock when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

/// Trip end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndTripRequest {
    /// End time; the service uses its own clock when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Driver notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Trip service (driver role)
#[derive(Debug, Clone)]
pub struct TripApi {
    client: ApiClient,
}

impl TripApi {
    /// Wrap a gateway client
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Start a trip. Keep the returned id to end it later.
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request), fields(route_id = %request.route_id))]
    pub async fn start(&self, request: &StartTripRequest) -> Result<Trip, ApiError> {
        self.client
            .send_json(Method::POST, &format!("{TRIP_BASE}/startTrip"), request)
            .await
    }

    /// End a trip
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request))]
    pub async fn end(&self, trip_id: &str, request: &EndTripRequest) -> Result<Trip, ApiError> {
        self.client
            .send_json(Method::PATCH, &format!("{TRIP_BASE}/endTrip/{trip_id}"), request)
            .await
    }

    /// One trip
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, trip_id: &str) -> Result<Trip, ApiError> {
        self.client.get_json(&format!("{TRIP_BASE}/{trip_id}")).await
    }

    /// The trip started earlier as `trip_id`, `None` once the service no
    /// longer knows it.
    ///
    /// The service has no "current trip" endpoint; the caller keeps the id
    /// returned by [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway, except 404.
    pub async fn current(&self, trip_id: &str) -> Result<Option<Trip>, ApiError> {
        match self.get(trip_id).await {
            Ok(trip) => Ok(Some(trip)),
            Err(ApiError::Status { status: 404, .. }) => {
                tracing::debug!(trip_id, "Current trip is gone");
                Ok(None)
            },
            Err(err) => Err(err),
        }
    }

    /// Trips of the signed-in driver, newest first
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn history(&self, page: u32, size: u32) -> Result<Page<Trip>, ApiError> {
        self.client
            .get_json_query(&format!("{TRIP_BASE}/history"), &PageQuery { page, size })
            .await
    }

    /// Every trip of the signed-in driver
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn driver_trips(&self) -> Result<Vec<Trip>, ApiError> {
        self.client.get_json(&format!("{TRIP_BASE}/driver")).await
    }
}
