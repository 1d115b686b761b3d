//! Incident reporting (`/incidentMgtApi`).

use crate::api::ApiClient;
use crate::error::ApiError;
use ourbusway_core::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Path prefix of the incident service
pub const INCIDENT_BASE: &str = "/incidentMgtApi";

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    /// Breakdown, accident, ...
    Incident,
    /// Running late
    Delay,
    /// Service called off
    Cancellation,
}

/// Handling status of an incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    /// Reported
    Open,
    /// Being handled
    InProgress,
    /// Closed
    Resolved,
}

/// Incident report from a driver
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportIncidentRequest {
    /// Route concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    /// Bus concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_id: Option<String>,
    /// Kind of incident
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    /// Free text
    pub description: String,
    /// When it happened (RFC 3339); set to now when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<String>,
    /// Latitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl ReportIncidentRequest {
    /// Report of `incident_type` with `description`
    #[must_use]
    pub fn new(incident_type: IncidentType, description: impl Into<String>) -> Self {
        Self {
            route_id: None,
            bus_id: None,
            incident_type,
            description: description.into(),
            reported_at: None,
            latitude: None,
            longitude: None,
        }
    }
}

/// Incident as stored by the service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Incident id
    pub id: String,
    /// Reporting driver
    pub driver_id: String,
    /// Route concerned
    #[serde(default)]
    pub route_id: Option<String>,
    /// Bus concerned
    #[serde(default)]
    pub bus_id: Option<String>,
    /// Kind of incident
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    /// Handling status
    pub status: IncidentStatus,
    /// Free text
    pub description: String,
    /// Latitude
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude
    #[serde(default)]
    pub longitude: Option<f64>,
    /// When it was reported
    pub reported_at: String,
    /// When it was resolved
    #[serde(default)]
    pub resolved_at: Option<String>,
}

/// Incident service (driver role)
#[derive(Debug, Clone)]
pub struct IncidentApi {
    client: ApiClient,
}

impl IncidentApi {
    /// Wrap a gateway client
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Report an incident
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request), fields(incident_type = ?request.incident_type))]
    pub async fn report(&self, request: &ReportIncidentRequest) -> Result<Incident, ApiError> {
        let mut request = request.clone();
        if request.reported_at.is_none() {
            request.reported_at = Some(Utc::now().to_rfc3339());
        }
        self.client
            .send_json(Method::POST, &format!("{INCIDENT_BASE}/incidents"), &request)
            .await
    }
}
