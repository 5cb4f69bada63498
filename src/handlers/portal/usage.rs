use axum::{
    extract::{Extension, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Query};
use crate::forecast::{self, MIN_SAMPLES, UsageForecast};
use crate::middleware::AuthSession;
use crate::models::{AuditAction, RecordUsage, UsageLog, UsageSummary, UsageWindowQuery};
use crate::util::{AuditLogBuilder, window_start};

/// Record traffic for a day (default today). A second record for the same
/// day adds onto the first.
pub async fn record_usage(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Json(input): Json<RecordUsage>,
) -> Result<Json<UsageLog>> {
    let today = queries::today();
    input.validate(today)?;
    let day = input.day.unwrap_or(today);

    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let subscription = queries::latest_active_subscription(&conn, &auth.user.id)?;
    let log = queries::record_usage(
        &conn,
        &auth.user.id,
        subscription.as_ref().map(|s| s.id.as_str()),
        day,
        input.gb_used,
    )?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(auth.actor_type(), Some(&auth.user.id))
        .action(AuditAction::RecordUsage)
        .resource("usage_log", &log.id)
        .details(&serde_json::json!({
            "day": day.to_string(),
            "gb_used": input.gb_used
        }))
        .names(&auth.audit_names())
        .save()?;

    Ok(Json(log))
}

/// Daily rows over a trailing window, oldest first.
pub async fn list_usage(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    Query(query): Query<UsageWindowQuery>,
) -> Result<Json<Vec<UsageLog>>> {
    let conn = state.db.get()?;
    let from_day = window_start(queries::today(), query.days());
    let logs = queries::list_usage_since(&conn, &auth.user.id, from_day)?;
    Ok(Json(logs))
}

/// Window aggregates against the active plan caps.
pub async fn usage_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    Query(query): Query<UsageWindowQuery>,
) -> Result<Json<UsageSummary>> {
    let conn = state.db.get()?;
    let window_days = query.days();
    let from_day = window_start(queries::today(), window_days);

    let (total_gb, days_logged) = queries::usage_window_totals(&conn, &auth.user.id, from_day)?;
    let active_cap_gb = queries::active_cap_for_user(&conn, &auth.user.id)?;

    let daily_average_gb = if days_logged > 0 {
        total_gb / days_logged as f64
    } else {
        0.0
    };
    let percent_of_cap = active_cap_gb
        .filter(|cap| *cap > 0.0)
        .map(|cap| total_gb / cap * 100.0);

    Ok(Json(UsageSummary {
        window_days,
        total_gb,
        daily_average_gb,
        days_logged,
        active_cap_gb,
        percent_of_cap,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    /// Days to extrapolate (default: 30, max: 365).
    pub horizon_days: Option<i64>,
}

impl ForecastQuery {
    pub fn horizon_days(&self) -> i64 {
        self.horizon_days.unwrap_or(30).clamp(1, 365)
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub samples: usize,
    pub required_samples: usize,
    /// Null until enough days are logged to fit a line.
    pub forecast: Option<UsageForecast>,
}

/// Least-squares projection of the customer's full usage history.
pub async fn usage_forecast(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>> {
    let conn = state.db.get()?;
    let logs = queries::list_all_usage(&conn, &auth.user.id)?;
    let forecast = forecast::forecast_usage(&logs, query.horizon_days());

    Ok(Json(ForecastResponse {
        samples: logs.len(),
        required_samples: MIN_SAMPLES,
        forecast,
    }))
}
