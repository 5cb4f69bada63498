use axum::{
    extract::{Extension, State},
    http::HeaderMap,
};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::middleware::AuthSession;
use crate::models::{
    AuditAction, CreateSubscription, OwnSubscriptionFilter, Subscription, SubscriptionStatus,
    SubscriptionWithPlan,
};
use crate::util::AuditLogBuilder;

/// Subscribe the customer to a plan.
///
/// One live (active or stopped) subscription per plan and customer; a
/// canceled subscription to the same plan is archived as `previous` before
/// the new one is created, so re-subscribing keeps a clean history.
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Json(input): Json<CreateSubscription>,
) -> Result<Json<SubscriptionWithPlan>> {
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let plan = queries::get_plan_by_id(&conn, &input.plan_id)?.or_not_found(msg::PLAN_NOT_FOUND)?;
    if !plan.active {
        return Err(AppError::Conflict("Plan is not available".into()));
    }
    if queries::get_live_subscription(&conn, &auth.user.id, &plan.id)?.is_some() {
        return Err(AppError::Conflict(
            "Already subscribed to this plan".into(),
        ));
    }

    queries::archive_canceled_subscriptions(&conn, &auth.user.id, &plan.id)?;
    let subscription = queries::create_subscription(&conn, &auth.user.id, &plan.id)?;
    queries::increment_plan_popularity(&conn, &plan.id)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(auth.actor_type(), Some(&auth.user.id))
        .action(AuditAction::CreateSubscription)
        .resource("subscription", &subscription.id)
        .details(&serde_json::json!({
            "plan_id": plan.id,
            "plan_name": plan.name
        }))
        .names(&auth.audit_names().resource(plan.name.clone()))
        .save()?;

    let with_plan = queries::get_subscription_with_plan(&conn, &subscription.id)?
        .or_not_found(msg::SUBSCRIPTION_NOT_FOUND)?;
    Ok(Json(with_plan))
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    Query(filter): Query<OwnSubscriptionFilter>,
) -> Result<Json<Vec<SubscriptionWithPlan>>> {
    let conn = state.db.get()?;
    let subscriptions = queries::list_subscriptions_for_user(&conn, &auth.user.id, filter.status)?;
    Ok(Json(subscriptions))
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    Path(subscription_id): Path<String>,
) -> Result<Json<SubscriptionWithPlan>> {
    let conn = state.db.get()?;
    // Someone else's subscription id reads as absent, not as forbidden.
    let subscription = queries::get_subscription_with_plan(&conn, &subscription_id)?
        .filter(|s| s.user_id == auth.user.id)
        .or_not_found(msg::SUBSCRIPTION_NOT_FOUND)?;
    Ok(Json(subscription))
}

/// Shared transition plumbing for pause/resume/cancel.
fn transition(
    state: &AppState,
    auth: &AuthSession,
    headers: &HeaderMap,
    subscription_id: &str,
    from: &[SubscriptionStatus],
    to: SubscriptionStatus,
    action: AuditAction,
    conflict_msg: &str,
) -> Result<Subscription> {
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let existing = queries::get_subscription_by_id(&conn, subscription_id)?
        .filter(|s| s.user_id == auth.user.id)
        .or_not_found(msg::SUBSCRIPTION_NOT_FOUND)?;
    if !from.contains(&existing.status) {
        return Err(AppError::Conflict(conflict_msg.to_string()));
    }

    let stamp_ended_at = to == SubscriptionStatus::Canceled;
    let updated = queries::set_subscription_status(&conn, subscription_id, to, stamp_ended_at)?
        .or_not_found(msg::SUBSCRIPTION_NOT_FOUND)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, headers)
        .actor(auth.actor_type(), Some(&auth.user.id))
        .action(action)
        .resource("subscription", subscription_id)
        .details(&serde_json::json!({
            "from": existing.status.as_str(),
            "to": to.as_str()
        }))
        .names(&auth.audit_names())
        .save()?;

    Ok(updated)
}

/// Pause an active subscription. Paused plans keep the slot but stop billing.
pub async fn pause_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Path(subscription_id): Path<String>,
) -> Result<Json<Subscription>> {
    let subscription = transition(
        &state,
        &auth,
        &headers,
        &subscription_id,
        &[SubscriptionStatus::Active],
        SubscriptionStatus::Stopped,
        AuditAction::PauseSubscription,
        "Only active subscriptions can be paused",
    )?;
    Ok(Json(subscription))
}

pub async fn resume_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Path(subscription_id): Path<String>,
) -> Result<Json<Subscription>> {
    let subscription = transition(
        &state,
        &auth,
        &headers,
        &subscription_id,
        &[SubscriptionStatus::Stopped],
        SubscriptionStatus::Active,
        AuditAction::ResumeSubscription,
        "Only paused subscriptions can be resumed",
    )?;
    Ok(Json(subscription))
}

/// Cancel a live subscription. The row stays as history and the customer
/// can re-subscribe to the plan later.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Path(subscription_id): Path<String>,
) -> Result<Json<Subscription>> {
    let subscription = transition(
        &state,
        &auth,
        &headers,
        &subscription_id,
        &[SubscriptionStatus::Active, SubscriptionStatus::Stopped],
        SubscriptionStatus::Canceled,
        AuditAction::CancelSubscription,
        "Subscription is not live",
    )?;
    Ok(Json(subscription))
}
