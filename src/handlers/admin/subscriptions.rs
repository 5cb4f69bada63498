use axum::extract::State;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Query};
use crate::models::{SubscriptionFilter, SubscriptionWithPlan};
use crate::pagination::{Paginated, PaginationQuery};

/// Cross-customer subscription listing, filterable by user, plan and status.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Query(filter): Query<SubscriptionFilter>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Paginated<SubscriptionWithPlan>>> {
    let conn = state.db.get()?;
    let (subscriptions, total) = queries::list_subscriptions_paginated(
        &conn,
        &filter,
        pagination.limit(),
        pagination.offset(),
    )?;
    Ok(Json(Paginated::new(
        subscriptions,
        total,
        pagination.limit(),
        pagination.offset(),
    )))
}
