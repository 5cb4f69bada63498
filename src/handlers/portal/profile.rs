use axum::{
    extract::{Extension, State},
    http::HeaderMap,
};

use crate::crypto;
use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::Json;
use crate::middleware::AuthSession;
use crate::models::{AuditAction, ChangePassword, UpdateProfile, User};
use crate::util::AuditLogBuilder;

pub async fn get_me(Extension(auth): Extension<AuthSession>) -> Json<User> {
    Json(auth.user)
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Json(input): Json<UpdateProfile>,
) -> Result<Json<User>> {
    input.validate()?;

    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let user = queries::update_profile(&conn, &auth.user.id, &input)?
        .or_not_found(msg::USER_NOT_FOUND)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(auth.actor_type(), Some(&auth.user.id))
        .action(AuditAction::UpdateProfile)
        .resource("user", &auth.user.id)
        .names(&auth.audit_names())
        .save()?;

    Ok(Json(user))
}

/// Change the account password. Requires the current password and revokes
/// every other session so stolen tokens die with the old credential.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Json(input): Json<ChangePassword>,
) -> Result<Json<serde_json::Value>> {
    input.validate()?;

    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    if !crypto::verify_password(&input.current_password, &auth.user.password_hash) {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    let password_hash = crypto::hash_password(&input.new_password)?;
    queries::set_password(&conn, &auth.user.id, &password_hash)?;
    let revoked = queries::revoke_other_sessions(&conn, &auth.user.id, &auth.session_id)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(auth.actor_type(), Some(&auth.user.id))
        .action(AuditAction::ChangePassword)
        .resource("user", &auth.user.id)
        .details(&serde_json::json!({ "revoked_sessions": revoked }))
        .names(&auth.audit_names())
        .save()?;

    Ok(Json(serde_json::json!({
        "success": true,
        "revoked_sessions": revoked
    })))
}

/// Revoke the session behind the presented token.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    queries::revoke_session(&conn, &auth.session_id)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(auth.actor_type(), Some(&auth.user.id))
        .action(AuditAction::RevokeSession)
        .resource("session", &auth.session_id)
        .names(&auth.audit_names().resource(auth.token_prefix.clone()))
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}
