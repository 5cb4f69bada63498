use axum::extract::State;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::models::Plan;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

/// Browse the active catalog, in stable catalog order.
pub async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<Plan>>> {
    let conn = state.db.get()?;
    let plans = queries::list_active_plans(&conn, query.category.as_deref())?;
    Ok(Json(plans))
}

/// Inactive plans are invisible to customers.
pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<Plan>> {
    let conn = state.db.get()?;
    let plan = queries::get_plan_by_id(&conn, &plan_id)?
        .filter(|p| p.active)
        .or_not_found(msg::PLAN_NOT_FOUND)?;
    Ok(Json(plan))
}
