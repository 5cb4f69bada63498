use axum::{extract::State, http::HeaderMap};

use crate::crypto;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::extractors::Json;
use crate::models::{
    ActorType, AuditAction, AuditLogNames, CreateUser, LoginRequest, LoginResponse, Role, Signup,
    User,
};
use crate::util::AuditLogBuilder;

/// Register a new customer account. The account cannot log in until an
/// administrator approves it.
pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<Signup>,
) -> Result<Json<User>> {
    input.validate()?;

    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    if queries::get_user_by_email(&conn, &input.email)?.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let password_hash = crypto::hash_password(&input.password)?;
    let create = CreateUser {
        email: input.email,
        name: input.name,
        password: input.password,
        role: Role::User,
        approved: Some(false),
        phone: input.phone,
        address: input.address,
        budget_limit: input.budget_limit,
    };
    let user = queries::create_user(&conn, &create, &password_hash)?;

    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::Public, None)
        .action(AuditAction::RegisterUser)
        .resource("user", &user.id)
        .details(&serde_json::json!({ "email": user.email }))
        .names(&AuditLogNames::default().resource(user.name.clone()))
        .save()?;

    Ok(Json(user))
}

/// Exchange credentials for a session token.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let email = input.email.trim().to_lowercase();

    // Per-email attempt limiter on top of the per-IP layer; failed and
    // successful attempts both count.
    state
        .login_limiter
        .check(&email)
        .map_err(AppError::TooManyRequests)?;

    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let Some(user) = queries::get_user_by_email(&conn, &email)? else {
        return Err(AppError::Unauthorized);
    };
    if !crypto::verify_password(&input.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }
    if !user.approved {
        return Err(AppError::Forbidden(msg::ACCOUNT_PENDING.into()));
    }

    let (session, token) = queries::create_session(&conn, &user.id, state.session_ttl_secs)?;

    let actor_type = if user.is_admin() {
        ActorType::Admin
    } else {
        ActorType::Customer
    };
    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(actor_type, Some(&user.id))
        .action(AuditAction::CreateSession)
        .resource("session", &session.id)
        .names(
            &AuditLogNames {
                user_name: Some(user.name.clone()),
                user_email: Some(user.email.clone()),
                ..Default::default()
            }
            .resource(session.token_prefix.clone()),
        )
        .save()?;

    Ok(Json(LoginResponse {
        token,
        expires_at: session.expires_at,
        user,
    }))
}
