use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::models::{ActorType, AuditLogNames, Session, User};
use crate::util::extract_bearer_token;

/// The authenticated session attached to every portal and admin request.
#[derive(Clone)]
pub struct AuthSession {
    pub user: User,
    /// Session row id, used to revoke this session on logout.
    pub session_id: String,
    /// Visible token prefix (e.g. "fd_tok_a1b2c"), safe to log.
    pub token_prefix: String,
}

impl AuthSession {
    /// Audit actor classification for this session's user.
    pub fn actor_type(&self) -> ActorType {
        if self.user.is_admin() {
            ActorType::Admin
        } else {
            ActorType::Customer
        }
    }

    /// Get audit log names pre-populated with the user's name and email.
    /// Chain with `.resource()` to add the acted-on entity.
    pub fn audit_names(&self) -> AuditLogNames {
        AuditLogNames {
            user_name: Some(self.user.name.clone()),
            user_email: Some(self.user.email.clone()),
            ..Default::default()
        }
    }
}

/// Authenticate a request from its bearer session token.
/// Returns (Session, User) if the token maps to a live session.
fn authenticate_from_request(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(Session, User), StatusCode> {
    let token = extract_bearer_token(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    let conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let (session, user) = queries::get_session_by_token(&conn, token)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // Approval can be withdrawn after login; sessions of unapproved
    // accounts stop working immediately.
    if !user.approved {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok((session, user))
}

/// Require any authenticated, approved user. Attaches an [`AuthSession`].
pub async fn session_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (session, user) = authenticate_from_request(&state, request.headers())?;

    request.extensions_mut().insert(AuthSession {
        user,
        session_id: session.id,
        token_prefix: session.token_prefix,
    });
    Ok(next.run(request).await)
}

/// Require an authenticated admin. Attaches an [`AuthSession`].
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (session, user) = authenticate_from_request(&state, request.headers())?;

    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(AuthSession {
        user,
        session_id: session.id,
        token_prefix: session.token_prefix,
    });
    Ok(next.run(request).await)
}
