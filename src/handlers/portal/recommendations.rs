use axum::extract::{Extension, State};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Query};
use crate::middleware::AuthSession;
use crate::recommend::{self, PlanRecommendation};
use crate::util::window_start;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    /// Overrides the profile budget for this request.
    pub budget: Option<f64>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub monthly_projection_gb: f64,
    pub budget: Option<f64>,
    pub recommendations: Vec<PlanRecommendation>,
}

/// Ranks the active catalog against the customer's trailing 30 days of
/// usage, best fit first.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<RecommendationResponse>> {
    let conn = state.db.get()?;

    let from_day = window_start(queries::today(), 30);
    let (window_total_gb, days_logged) =
        queries::usage_window_totals(&conn, &auth.user.id, from_day)?;
    let projection = recommend::monthly_projection(window_total_gb, days_logged);

    let budget = query.budget.or(auth.user.budget_limit);
    let plans = queries::list_active_plans(&conn, query.category.as_deref())?;
    let recommendations = recommend::recommend_plans(plans, projection, budget);

    Ok(Json(RecommendationResponse {
        monthly_projection_gb: projection,
        budget,
        recommendations,
    }))
}
