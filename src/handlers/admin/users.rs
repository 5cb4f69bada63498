use axum::{
    extract::{Extension, State},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::middleware::AuthSession;
use crate::models::{ActorType, AuditAction, CreateUser, Role, UpdateUser, User};
use crate::pagination::{Paginated, PaginationQuery};
use crate::util::AuditLogBuilder;

pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Json(input): Json<CreateUser>,
) -> Result<Json<User>> {
    input.validate()?;
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    if queries::get_user_by_email(&conn, &input.email)?.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let password_hash = crate::crypto::hash_password(&input.password)?;
    let user = queries::create_user(&conn, &input, &password_hash)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::Admin, Some(&auth.user.id))
        .action(AuditAction::CreateUser)
        .resource("user", &user.id)
        .details(&serde_json::json!({
            "email": user.email,
            "role": user.role.as_str(),
            "approved": user.approved
        }))
        .names(&auth.audit_names().resource(user.name.clone()))
        .save()?;

    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub approved: Option<bool>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Paginated<User>>> {
    let conn = state.db.get()?;
    let (users, total) = queries::list_users_paginated(
        &conn,
        pagination.limit(),
        pagination.offset(),
        filter.role,
        filter.approved,
    )?;
    Ok(Json(Paginated::new(
        users,
        total,
        pagination.limit(),
        pagination.offset(),
    )))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>> {
    let conn = state.db.get()?;
    let user = queries::get_user_by_id(&conn, &user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>> {
    input.validate()?;
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let target = queries::get_user_by_id(&conn, &user_id)?.or_not_found(msg::USER_NOT_FOUND)?;

    // Demoting the only remaining admin would lock the back office.
    if target.role == Role::Admin
        && input.role == Some(Role::User)
        && queries::count_other_admins(&conn, &target.id)? == 0
    {
        return Err(AppError::Conflict("Cannot demote the last admin".into()));
    }

    let user = queries::update_user(&conn, &user_id, &input)?.or_not_found(msg::USER_NOT_FOUND)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::Admin, Some(&auth.user.id))
        .action(AuditAction::UpdateUser)
        .resource("user", &user.id)
        .details(&serde_json::json!({
            "role": input.role.map(|r| r.as_str()),
            "approved": input.approved
        }))
        .names(&auth.audit_names().resource(user.name.clone()))
        .save()?;

    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    if user_id == auth.user.id {
        return Err(AppError::BadRequest("Cannot delete yourself".into()));
    }

    let target = queries::get_user_by_id(&conn, &user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    if target.role == Role::Admin && queries::count_other_admins(&conn, &target.id)? == 0 {
        return Err(AppError::Conflict("Cannot delete the last admin".into()));
    }

    queries::delete_user(&conn, &user_id)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::Admin, Some(&auth.user.id))
        .action(AuditAction::DeleteUser)
        .resource("user", &target.id)
        .details(&serde_json::json!({ "email": target.email }))
        .names(&auth.audit_names().resource(target.name.clone()))
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Approving an already-approved account is a no-op and is not audited.
pub async fn approve_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<User>> {
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let target = queries::get_user_by_id(&conn, &user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    if target.approved {
        return Ok(Json(target));
    }

    let user = queries::approve_user(&conn, &user_id)?.or_not_found(msg::USER_NOT_FOUND)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::Admin, Some(&auth.user.id))
        .action(AuditAction::ApproveUser)
        .resource("user", &user.id)
        .details(&serde_json::json!({ "email": user.email }))
        .names(&auth.audit_names().resource(user.name.clone()))
        .save()?;

    Ok(Json(user))
}
