use axum::extract::State;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::models::{AdminOverview, RevenueReport};

/// Headline counts for the admin landing page.
pub async fn get_overview(State(state): State<AppState>) -> Result<Json<AdminOverview>> {
    let conn = state.db.get()?;
    Ok(Json(queries::admin_overview(&conn)?))
}

/// Per-plan revenue, highest earning plan first.
pub async fn get_revenue_report(State(state): State<AppState>) -> Result<Json<RevenueReport>> {
    let conn = state.db.get()?;
    Ok(Json(queries::revenue_report(&conn)?))
}
