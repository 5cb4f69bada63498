use axum::{
    extract::{Extension, State},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::middleware::AuthSession;
use crate::models::{ActorType, AuditAction, CreatePlan, Plan, UpdatePlan};
use crate::pagination::{Paginated, PaginationQuery};
use crate::util::AuditLogBuilder;

pub async fn create_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Json(input): Json<CreatePlan>,
) -> Result<Json<Plan>> {
    input.validate()?;
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    if queries::get_plan_by_name(&conn, &input.name)?.is_some() {
        return Err(AppError::Conflict("Plan name already exists".into()));
    }

    let plan = queries::create_plan(&conn, &input)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::Admin, Some(&auth.user.id))
        .action(AuditAction::CreatePlan)
        .resource("plan", &plan.id)
        .details(&serde_json::json!({
            "category": plan.category,
            "price": plan.price,
            "active": plan.active
        }))
        .names(&auth.audit_names().resource(plan.name.clone()))
        .save()?;

    Ok(Json(plan))
}

#[derive(Debug, Deserialize)]
pub struct PlanFilter {
    pub category: Option<String>,
    /// Admin listings can include retired plans.
    #[serde(default)]
    pub include_inactive: bool,
}

pub async fn list_plans(
    State(state): State<AppState>,
    Query(filter): Query<PlanFilter>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Paginated<Plan>>> {
    let conn = state.db.get()?;
    let (plans, total) = queries::list_plans_paginated(
        &conn,
        pagination.limit(),
        pagination.offset(),
        filter.category.as_deref(),
        filter.include_inactive,
    )?;
    Ok(Json(Paginated::new(
        plans,
        total,
        pagination.limit(),
        pagination.offset(),
    )))
}

pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<Plan>> {
    let conn = state.db.get()?;
    let plan = queries::get_plan_by_id(&conn, &plan_id)?.or_not_found(msg::PLAN_NOT_FOUND)?;
    Ok(Json(plan))
}

pub async fn update_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Path(plan_id): Path<String>,
    Json(input): Json<UpdatePlan>,
) -> Result<Json<Plan>> {
    input.validate()?;
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    if let Some(ref name) = input.name
        && let Some(existing) = queries::get_plan_by_name(&conn, name)?
        && existing.id != plan_id
    {
        return Err(AppError::Conflict("Plan name already exists".into()));
    }

    let plan = queries::update_plan(&conn, &plan_id, &input)?.or_not_found(msg::PLAN_NOT_FOUND)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::Admin, Some(&auth.user.id))
        .action(AuditAction::UpdatePlan)
        .resource("plan", &plan.id)
        .details(&serde_json::json!({
            "price": input.price,
            "active": input.active
        }))
        .names(&auth.audit_names().resource(plan.name.clone()))
        .save()?;

    Ok(Json(plan))
}

/// Plans with subscription history cannot be deleted; deactivate them
/// instead so past billing stays explainable.
pub async fn delete_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Path(plan_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let plan = queries::get_plan_by_id(&conn, &plan_id)?.or_not_found(msg::PLAN_NOT_FOUND)?;
    if queries::count_subscriptions_for_plan(&conn, &plan_id)? > 0 {
        return Err(AppError::Conflict(
            "Plan has subscriptions and cannot be deleted".into(),
        ));
    }

    queries::delete_plan(&conn, &plan_id)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::Admin, Some(&auth.user.id))
        .action(AuditAction::DeletePlan)
        .resource("plan", &plan.id)
        .details(&serde_json::json!({ "category": plan.category }))
        .names(&auth.audit_names().resource(plan.name.clone()))
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}
