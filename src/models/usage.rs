use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// One day of metered traffic for a user. `UNIQUE(user_id, day)` in the
/// schema; repeated records for the same day accumulate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLog {
    pub id: String,
    pub user_id: String,
    /// Active subscription at the time of recording, when there was one.
    pub subscription_id: Option<String>,
    pub day: NaiveDate,
    pub gb_used: f64,
    pub created_at: i64,
}

/// Portal payload: record usage for the authenticated customer.
#[derive(Debug, Deserialize)]
pub struct RecordUsage {
    pub gb_used: f64,
    /// Defaults to today.
    #[serde(default)]
    pub day: Option<NaiveDate>,
}

impl RecordUsage {
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        validate_gb(self.gb_used)?;
        validate_day(self.day, today)
    }
}

/// Admin payload: record usage on behalf of a customer.
#[derive(Debug, Deserialize)]
pub struct AdminRecordUsage {
    pub user_id: String,
    pub gb_used: f64,
    #[serde(default)]
    pub day: Option<NaiveDate>,
}

impl AdminRecordUsage {
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        validate_gb(self.gb_used)?;
        validate_day(self.day, today)
    }
}

fn validate_gb(gb_used: f64) -> Result<()> {
    if !gb_used.is_finite() || gb_used <= 0.0 {
        return Err(AppError::BadRequest("gb_used must be a positive number".into()));
    }
    Ok(())
}

fn validate_day(day: Option<NaiveDate>, today: NaiveDate) -> Result<()> {
    if let Some(day) = day
        && day > today
    {
        return Err(AppError::BadRequest("Cannot record usage for a future day".into()));
    }
    Ok(())
}

/// Window selector for usage listing and summary endpoints.
#[derive(Debug, Deserialize)]
pub struct UsageWindowQuery {
    /// Trailing window in days, today inclusive (default: 30, max: 365).
    pub days: Option<i64>,
}

impl UsageWindowQuery {
    pub fn days(&self) -> i64 {
        self.days.unwrap_or(30).clamp(1, 365)
    }
}

/// Aggregates over a trailing usage window.
#[derive(Debug, Serialize)]
pub struct UsageSummary {
    pub window_days: i64,
    pub total_gb: f64,
    /// Mean over days that have a log row, not over the whole window.
    pub daily_average_gb: f64,
    pub days_logged: i64,
    /// Combined cap of the customer's active plans, when any.
    pub active_cap_gb: Option<f64>,
    pub percent_of_cap: Option<f64>,
}
