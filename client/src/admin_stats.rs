//! Back-office statistics, served by the ticket and subscription services.

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::subscriptions::SUBSCRIPTION_BASE;
use crate::tickets::TICKET_BASE;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tickets sold today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    /// Tickets sold
    pub count: u64,
    /// Change against yesterday, in percent
    pub growth_percentage: f64,
    /// When the figure was computed
    pub timestamp: String,
}

/// Ticket revenue today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStats {
    /// Revenue
    pub revenue: Decimal,
    /// ISO currency code
    pub currency: String,
    /// Change against yesterday, in percent
    pub growth_percentage: f64,
    /// When the figure was computed
    pub timestamp: String,
}

/// All-time transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStats {
    /// Transactions recorded
    pub total_transactions: u64,
    /// Average revenue per day
    pub avg_daily_revenue: Decimal,
    /// When the figure was computed
    pub timestamp: String,
}

/// Revenue share of one product line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueTypeItem {
    /// Revenue
    pub revenue: Decimal,
    /// Share of the total, in percent
    pub percentage: f64,
    /// Display label
    pub label: String,
}

/// Revenue split by product line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueByType {
    /// Single tickets
    pub single_tickets: RevenueTypeItem,
    /// Monthly subscriptions
    pub monthly_subscriptions: RevenueTypeItem,
    /// Annual subscriptions
    pub annual_subscriptions: RevenueTypeItem,
    /// Sum of the above
    pub total_revenue: Decimal,
    /// When the figure was computed
    pub timestamp: String,
}

/// Active subscriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSubscriptions {
    /// Subscriptions currently active
    pub count: u64,
    /// Status counted
    pub status: String,
}

/// Subscription revenue today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRevenueToday {
    /// Revenue
    pub revenue: Decimal,
    /// ISO currency code
    pub currency: String,
    /// Subscriptions sold
    pub count: u64,
}

/// All-time subscription revenue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRevenueTotal {
    /// Revenue
    pub total_revenue: Decimal,
    /// ISO currency code
    pub currency: String,
    /// Subscriptions sold
    pub total_count: u64,
    /// Revenue per plan name
    #[serde(default)]
    pub revenue_by_plan: BTreeMap<String, Decimal>,
    /// Subscriptions per plan name
    #[serde(default)]
    pub count_by_plan: BTreeMap<String, u64>,
}

/// Back-office statistics (admin role required)
#[derive(Debug, Clone)]
pub struct AdminStatsApi {
    client: ApiClient,
}

impl AdminStatsApi {
    /// Wrap a gateway client
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn tickets_sold_today(&self) -> Result<TicketStats, ApiError> {
        self.client
            .get_json(&format!("{TICKET_BASE}/admin/stats/tickets-sold-today"))
            .await
    }

    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn revenue_today(&self) -> Result<RevenueStats, ApiError> {
        self.client
            .get_json(&format!("{TICKET_BASE}/admin/stats/revenue-today"))
            .await
    }

    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn total_transactions(&self) -> Result<TransactionStats, ApiError> {
        self.client
            .get_json(&format!("{TICKET_BASE}/admin/stats/total-transactions"))
            .await
    }

    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn revenue_by_type(&self) -> Result<RevenueByType, ApiError> {
        self.client
            .get_json(&format!("{TICKET_BASE}/admin/stats/revenue-by-type"))
            .await
    }

    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn active_subscriptions(&self) -> Result<ActiveSubscriptions, ApiError> {
        self.client
            .get_json(&format!("{SUBSCRIPTION_BASE}/stats/active-count"))
            .await
    }

    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn subscription_revenue_today(&self) -> Result<SubscriptionRevenueToday, ApiError> {
        self.client
            .get_json(&format!("{SUBSCRIPTION_BASE}/stats/revenue-today"))
            .await
    }

    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn total_subscription_revenue(&self) -> Result<SubscriptionRevenueTotal, ApiError> {
        self.client
            .get_json(&format!("{SUBSCRIPTION_BASE}/stats/total-revenue"))
            .await
    }
}
