use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Service is running and billed.
    Active,
    /// Paused by the customer; can be resumed.
    Stopped,
    /// Ended by the customer; can be re-subscribed.
    Canceled,
    /// Archived: superseded by a newer subscription to the same plan.
    Previous,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Stopped => "stopped",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Previous => "previous",
        }
    }

    /// Active and stopped rows hold the plan; canceled and previous do not.
    pub fn is_live(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Stopped)
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "stopped" => Ok(SubscriptionStatus::Stopped),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "previous" => Ok(SubscriptionStatus::Previous),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub started_at: i64,
    /// Set when the subscription reaches a terminal state.
    pub ended_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Subscription joined with the plan columns the portal renders.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionWithPlan {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub plan_name: String,
    pub plan_category: String,
    pub plan_price: f64,
    pub plan_speed_mbps: f64,
    pub plan_data_cap_gb: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscription {
    pub plan_id: String,
}

/// Admin list filters; combined with `PaginationQuery` in the handler.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionFilter {
    pub user_id: Option<String>,
    pub plan_id: Option<String>,
    pub status: Option<SubscriptionStatus>,
}

/// Portal list filter.
#[derive(Debug, Default, Deserialize)]
pub struct OwnSubscriptionFilter {
    pub status: Option<SubscriptionStatus>,
}
