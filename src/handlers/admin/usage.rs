use axum::{
    extract::{Extension, State},
    http::HeaderMap,
};

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::Json;
use crate::middleware::AuthSession;
use crate::models::{ActorType, AdminRecordUsage, AuditAction, UsageLog};
use crate::util::AuditLogBuilder;

/// Backfill traffic for any customer, e.g. from a collector export.
pub async fn record_usage_for_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Json(input): Json<AdminRecordUsage>,
) -> Result<Json<UsageLog>> {
    let today = queries::today();
    input.validate(today)?;
    let day = input.day.unwrap_or(today);

    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let target = queries::get_user_by_id(&conn, &input.user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    let subscription = queries::latest_active_subscription(&conn, &target.id)?;
    let log = queries::record_usage(
        &conn,
        &target.id,
        subscription.as_ref().map(|s| s.id.as_str()),
        day,
        input.gb_used,
    )?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::Admin, Some(&auth.user.id))
        .action(AuditAction::RecordUsage)
        .resource("usage_log", &log.id)
        .details(&serde_json::json!({
            "user_id": target.id,
            "day": day.to_string(),
            "gb_used": input.gb_used
        }))
        .names(&auth.audit_names().resource(target.name.clone()))
        .save()?;

    Ok(Json(log))
}
