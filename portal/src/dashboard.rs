//! Back-office overview.

use ourbusway_client::AdminStatsApi;
use ourbusway_client::ApiError;
use ourbusway_client::admin_stats::{
    ActiveSubscriptions, RevenueByType, RevenueStats, SubscriptionRevenueToday,
    SubscriptionRevenueTotal, TicketStats, TransactionStats,
};
use rust_decimal::Decimal;

/// Every statistic the admin dashboard shows
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOverview {
    /// Tickets sold today
    pub tickets_sold_today: TicketStats,
    /// Ticket revenue today
    pub ticket_revenue_today: RevenueStats,
    /// All-time transactions
    pub transactions: TransactionStats,
    /// Revenue split by product line
    pub revenue_by_type: RevenueByType,
    /// Active subscriptions
    pub active_subscriptions: ActiveSubscriptions,
    /// Subscription revenue today
    pub subscription_revenue_today: SubscriptionRevenueToday,
    /// All-time subscription revenue
    pub subscription_revenue_total: SubscriptionRevenueTotal,
}

impl DashboardOverview {
    /// Fetch all statistics concurrently.
    ///
    /// # Errors
    ///
    /// The first [`ApiError`] reported; the other requests are dropped.
    #[tracing::instrument(skip(stats))]
    pub async fn load(stats: &AdminStatsApi) -> Result<Self, ApiError> {
        let (
            tickets_sold_today,
            ticket_revenue_today,
            transactions,
            revenue_by_type,
            active_subscriptions,
            subscription_revenue_today,
            subscription_revenue_total,
        ) = futures::try_join!(
            stats.tickets_sold_today(),
            stats.revenue_today(),
            stats.total_transactions(),
            stats.revenue_by_type(),
            stats.active_subscriptions(),
            stats.subscription_revenue_today(),
            stats.total_subscription_revenue(),
        )?;

        Ok(Self {
            tickets_sold_today,
            ticket_revenue_today,
            transactions,
            revenue_by_type,
            active_subscriptions,
            subscription_revenue_today,
            subscription_revenue_total,
        })
    }

    /// Ticket plus subscription revenue today
    #[must_use]
    pub fn combined_revenue_today(&self) -> Decimal {
        self.ticket_revenue_today.revenue + self.subscription_revenue_today.revenue
    }
}
