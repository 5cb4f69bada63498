use axum::extract::{Extension, State};

use crate::achievements::{self, AchievementReport, BadgeInputs};
use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::AuthSession;
use crate::util::window_start;

/// Badge progress derived from the customer's subscription and usage history.
pub async fn get_achievements(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<AchievementReport>> {
    let conn = state.db.get()?;
    let user_id = &auth.user.id;

    let (active, stopped, canceled, previous) = queries::user_subscription_counts(&conn, user_id)?;
    let distinct_categories = queries::count_distinct_plan_categories(&conn, user_id)?;
    let from_day = window_start(queries::today(), 30);
    let (_, days_logged) = queries::usage_window_totals(&conn, user_id, from_day)?;
    let lifetime_gb = queries::lifetime_usage_gb(&conn, user_id)?;

    let report = achievements::evaluate_badges(&BadgeInputs {
        total_subscriptions: active + stopped + canceled + previous,
        active_subscriptions: active,
        distinct_categories,
        days_logged_last_30: days_logged,
        lifetime_gb,
    });

    Ok(Json(report))
}
