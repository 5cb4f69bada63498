use serde::Serialize;

/// Metrics shown on the customer's portal home.
#[derive(Debug, Serialize)]
pub struct CustomerDashboard {
    pub active_subscriptions: i64,
    pub stopped_subscriptions: i64,
    /// Canceled plus archived rows; what the customer sees as history.
    pub previous_subscriptions: i64,
    pub total_subscriptions: i64,
    /// Sum of plan prices over active subscriptions.
    pub monthly_cost: f64,
    /// Sum of plan prices over every subscription ever taken.
    pub lifetime_spend: f64,
    pub usage_last_30d_gb: f64,
}

/// Admin landing metrics.
#[derive(Debug, Serialize)]
pub struct AdminOverview {
    pub total_users: i64,
    pub total_customers: i64,
    pub total_admins: i64,
    pub pending_approvals: i64,
    pub total_plans: i64,
    pub active_plans: i64,
    pub total_subscriptions: i64,
    pub active_subscriptions: i64,
    pub stopped_subscriptions: i64,
    pub monthly_revenue: f64,
    pub lifetime_revenue: f64,
}

/// Per-plan subscriber breakdown for the revenue report.
#[derive(Debug, Serialize)]
pub struct PlanRevenue {
    pub plan_id: String,
    pub plan_name: String,
    pub category: String,
    pub price: f64,
    pub active_subscribers: i64,
    pub stopped_subscribers: i64,
    pub canceled_subscribers: i64,
    pub previous_subscribers: i64,
    pub total_subscribers: i64,
    /// Active subscribers times monthly price.
    pub monthly_revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct RevenueReport {
    pub plans: Vec<PlanRevenue>,
    pub monthly_revenue: f64,
    pub lifetime_revenue: f64,
}
