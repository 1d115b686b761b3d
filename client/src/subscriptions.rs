//! Subscription endpoints (`/subscriptionMgtApi/subscription`).

use crate::api::{ApiClient, PageQuery};
use crate::error::ApiError;
use crate::types::Page;
use serde::{Deserialize, Serialize};

/// Path prefix of the subscription service
pub const SUBSCRIPTION_BASE: &str = "/subscriptionMgtApi/subscription";

/// Lifecycle of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Currently valid
    Active,
    /// Past its end date
    Expired,
    /// Cancelled before its end date
    Cancelled,
}

/// A passenger subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Subscription id
    pub id: String,
    /// Plan name
    pub plan_name: String,
    /// First valid day
    pub start_date: String,
    /// Last valid day
    pub end_date: String,
    /// Status
    pub status: SubscriptionStatus,
    /// Owner
    pub user_id: String,
}

/// Purchase acknowledgement; `subscription_request_id` is what checkout pays for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPurchase {
    /// Purchase request to pay
    #[serde(default)]
    pub subscription_request_id: Option<String>,
    /// Request status
    #[serde(default)]
    pub status: Option<String>,
}

/// Result of a controller inspection. Never an error: failures become
/// `valid: false` with a readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionResult {
    /// Whether the subscription covers the trip
    pub valid: bool,
    /// Text for the controller
    pub message: String,
}

impl InspectionResult {
    fn from_error(err: &ApiError) -> Self {
        let message = match err {
            ApiError::Status { status: 404, .. } => "Subscription not found".to_string(),
            ApiError::Forbidden { message } => message
                .clone()
                .unwrap_or_else(|| "Subscription not valid for this trip".to_string()),
            ApiError::RequestFailed(_) => "Cannot connect to subscription service".to_string(),
            other => other
                .message()
                .map_or_else(|| "Subscription inspection failed".to_string(), ToString::to_string),
        };
        Self {
            valid: false,
            message,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TripQuery<'a> {
    trip_id: &'a str,
}

/// Subscription service
#[derive(Debug, Clone)]
pub struct SubscriptionApi {
    client: ApiClient,
}

impl SubscriptionApi {
    /// Wrap a gateway client
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Current subscription of the signed-in passenger, `None` when there is none
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway, except 404.
    #[tracing::instrument(skip(self))]
    pub async fn mine(&self) -> Result<Option<Subscription>, ApiError> {
        match self
            .client
            .get_json(&format!("{SUBSCRIPTION_BASE}/me"))
            .await
        {
            Ok(subscription) => Ok(Some(subscription)),
            Err(ApiError::Status { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Past subscriptions
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn history(&self, page: u32, size: u32) -> Result<Page<Subscription>, ApiError> {
        self.client
            .get_json_query(
                &format!("{SUBSCRIPTION_BASE}/history"),
                &PageQuery { page, size },
            )
            .await
    }

    /// Request a new subscription; payment follows through checkout
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn purchase(&self) -> Result<SubscriptionPurchase, ApiError> {
        self.client
            .post_empty(&format!("{SUBSCRIPTION_BASE}/create"))
            .await
    }

    /// Check a passenger's subscription for a trip (controllers)
    #[tracing::instrument(skip(self))]
    pub async fn inspect(&self, subscription_id: &str, trip_id: &str) -> InspectionResult {
        let result = self
            .client
            .get_text_query(
                &format!("{SUBSCRIPTION_BASE}/{subscription_id}/inspect"),
                &TripQuery { trip_id },
            )
            .await;

        match result {
            Ok(body) => {
                let body = body.trim();
                InspectionResult {
                    valid: true,
                    message: if body.is_empty() {
                        "Subscription is valid for this trip".to_string()
                    } else {
                        body.to_string()
                    },
                }
            },
            Err(err) => {
                tracing::debug!(error = %err, "Subscription inspection rejected");
                InspectionResult::from_error(&err)
            },
        }
    }
}
