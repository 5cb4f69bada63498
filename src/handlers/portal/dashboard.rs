use axum::extract::{Extension, State};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::AuthSession;
use crate::models::CustomerDashboard;
use crate::util::window_start;

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<CustomerDashboard>> {
    let conn = state.db.get()?;

    let (active, stopped, canceled, previous) =
        queries::user_subscription_counts(&conn, &auth.user.id)?;
    let monthly_cost = queries::user_monthly_cost(&conn, &auth.user.id)?;
    let lifetime_spend = queries::user_lifetime_spend(&conn, &auth.user.id)?;

    let from_day = window_start(queries::today(), 30);
    let (usage_last_30d_gb, _) = queries::usage_window_totals(&conn, &auth.user.id, from_day)?;

    Ok(Json(CustomerDashboard {
        active_subscriptions: active,
        stopped_subscriptions: stopped,
        previous_subscriptions: canceled + previous,
        total_subscriptions: active + stopped + canceled + previous,
        monthly_cost,
        lifetime_spend,
        usage_last_30d_gb,
    }))
}
