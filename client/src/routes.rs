//! Route and station endpoints (`/routeMgtApi`).

use crate::api::{ApiClient, PageQuery};
use crate::error::ApiError;
use crate::types::Page;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Path prefix of the route service
pub const ROUTE_BASE: &str = "/routeMgtApi";

/// Station served by a route, in travel order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStation {
    /// Station id
    pub station_id: String,
    /// Display name
    pub name: String,
    /// Short code
    pub code: String,
    /// Position along the route
    pub sequence_order: u32,
}

/// Days a schedule rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServicePeriodType {
    /// Every day
    Daily,
    /// Monday to Friday
    Weekday,
    /// Saturday and Sunday
    Weekend,
    /// Public holidays
    Holiday,
    /// A specific date
    SpecialDate,
    /// A special event
    Event,
}

/// Schedule of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    /// When the rule applies
    pub rule_type: ServicePeriodType,
    /// Minutes between departures
    pub frequency_minutes: u32,
    /// Whether the rule is in force
    pub enabled: bool,
    /// Buses assigned
    pub bus_count: u32,
    /// First departure (`HH:mm:ss`)
    pub first_departure: String,
    /// First day (`YYYY-MM-DD`)
    pub start_date: String,
    /// Last day (`YYYY-MM-DD`)
    pub end_date: String,
}

/// A bus route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Route id
    pub id: String,
    /// Line number
    pub number: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Whether the route is operated
    pub active: bool,
    /// First station name
    pub start_station: String,
    /// Last station name
    pub end_station: String,
    /// Length in kilometres
    pub distance: f64,
    /// Minutes end to end
    pub estimated_duration: u32,
    /// Ticket price
    pub price: Decimal,
    /// Schedule, when configured
    #[serde(default)]
    pub config: Option<RouteConfig>,
    /// Stations, when included
    #[serde(default)]
    pub stations: Vec<RouteStation>,
}

/// A station, as offered for selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationOption {
    /// Station id
    pub id: String,
    /// Display name
    pub name: String,
    /// Short code
    pub code: String,
    /// Postal address
    #[serde(default)]
    pub address: String,
    /// Latitude
    pub latitude: f64,
    /// Longitude
    pub longitude: f64,
}

/// A station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Station id
    pub id: String,
    /// Display name
    pub name: String,
    /// Short code
    pub code: String,
    /// Postal address
    #[serde(default)]
    pub address: String,
    /// Latitude
    pub latitude: f64,
    /// Longitude
    pub longitude: f64,
    /// Whether the station is served
    #[serde(default)]
    pub active: Option<bool>,
}

/// New station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateStationRequest {
    /// Display name
    pub name: String,
    /// Short code
    pub code: String,
    /// Postal address
    pub address: String,
    /// Latitude
    pub latitude: f64,
    /// Longitude
    pub longitude: f64,
}

/// Station changes; absent fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateStationRequest {
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Short code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Postal address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Latitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Whether the station is served
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// New route
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteRequest {
    /// Line number
    pub number: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Whether the route is operated
    pub active: bool,
    /// First station name
    pub start_station: String,
    /// Last station name
    pub end_station: String,
    /// Length in kilometres
    pub distance: f64,
    /// Minutes end to end
    pub estimated_duration: u32,
    /// Ticket price
    pub price: Decimal,
    /// Schedule
    pub config: RouteConfig,
    /// Stations served, in travel order
    pub station_ids: Vec<String>,
}

/// Schedule changes; absent fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfigUpdate {
    /// When the rule applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<ServicePeriodType>,
    /// Minutes between departures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_minutes: Option<u32>,
    /// Whether the rule is in force
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Buses assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_count: Option<u32>,
    /// First departure (`HH:mm:ss`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_departure: Option<String>,
    /// First day (`YYYY-MM-DD`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Last day (`YYYY-MM-DD`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Route changes; absent fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRouteRequest {
    /// Line number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the route is operated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// First station name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_station: Option<String>,
    /// Last station name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_station: Option<String>,
    /// Length in kilometres
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Minutes end to end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    /// Ticket price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Schedule changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<RouteConfigUpdate>,
    /// Stations served, in travel order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_ids: Option<Vec<String>>,
}

/// Route service
#[derive(Debug, Clone)]
pub struct RouteApi {
    client: ApiClient,
}

impl RouteApi {
    /// Wrap a gateway client
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// All routes
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn routes(&self, page: u32, size: u32) -> Result<Page<Route>, ApiError> {
        self.client
            .get_json_query(&format!("{ROUTE_BASE}/routes"), &PageQuery { page, size })
            .await
    }

    /// One route, with its stations
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn route(&self, route_id: &str) -> Result<Route, ApiError> {
        self.client
            .get_json(&format!("{ROUTE_BASE}/routes/{route_id}"))
            .await
    }

    /// Create a route (admin)
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request), fields(number = %request.number))]
    pub async fn create_route(&self, request: &CreateRouteRequest) -> Result<Route, ApiError> {
        self.client
            .send_json(Method::POST, &format!("{ROUTE_BASE}/routes"), request)
            .await
    }

    /// Change a route (admin)
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_route(
        &self,
        route_id: &str,
        request: &UpdateRouteRequest,
    ) -> Result<Route, ApiError> {
        self.client
            .send_json(Method::PATCH, &format!("{ROUTE_BASE}/routes/{route_id}"), request)
            .await
    }

    /// All stations
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn stations(&self, page: u32, size: u32) -> Result<Page<StationOption>, ApiError> {
        self.client
            .get_json_query(&format!("{ROUTE_BASE}/stations"), &PageQuery { page, size })
            .await
    }

    /// One station
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn station(&self, station_id: &str) -> Result<Station, ApiError> {
        self.client
            .get_json(&format!("{ROUTE_BASE}/stations/{station_id}"))
            .await
    }

    /// Create a station (admin)
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_station(
        &self,
        request: &CreateStationRequest,
    ) -> Result<Station, ApiError> {
        self.client
            .send_json(Method::POST, &format!("{ROUTE_BASE}/stations"), request)
            .await
    }

    /// Change a station (admin)
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_station(
        &self,
        station_id: &str,
        request: &UpdateStationRequest,
    ) -> Result<Station, ApiError> {
        self.client
            .send_json(
                Method::PATCH,
                &format!("{ROUTE_BASE}/stations/{station_id}"),
                request,
            )
            .await
    }
}
