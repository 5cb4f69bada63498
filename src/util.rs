//! Shared utility functions for the Fiberdesk application.

use axum::http::HeaderMap;
use chrono::{Duration, NaiveDate};
use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::{ActorType, AuditAction, AuditLog, AuditLogNames};

pub const SECONDS_PER_DAY: i64 = 86400;

/// First calendar day of a trailing window that ends today (inclusive).
/// A 30-day window on 2026-08-25 starts at 2026-07-27.
pub fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days.max(1) - 1)
}

/// Extract client IP address and user-agent from request headers.
///
/// Tries `x-forwarded-for` first (for proxied requests), then `x-real-ip`,
/// and extracts the `user-agent` header for audit logging.
pub fn extract_request_info(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    (ip, user_agent)
}

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Builder for creating audit log entries.
///
/// Provides a fluent API for constructing audit logs with named methods
/// instead of positional parameters.
///
/// # Example
/// ```ignore
/// AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
///     .actor(ActorType::Customer, Some(&user.id))
///     .action(AuditAction::CreateSubscription)
///     .resource("subscription", &sub.id)
///     .details(&serde_json::json!({ "plan_id": plan.id }))
///     .names(&auth.audit_names().resource(plan.name.clone()))
///     .save()?;
/// ```
pub struct AuditLogBuilder<'a> {
    conn: &'a Connection,
    enabled: bool,
    headers: &'a HeaderMap,
    actor_type: ActorType,
    user_id: Option<&'a str>,
    action: AuditAction,
    resource_type: &'a str,
    resource_id: &'a str,
    details: Option<&'a serde_json::Value>,
    names: AuditLogNames,
}

impl<'a> AuditLogBuilder<'a> {
    /// Create a new audit log builder with required parameters.
    pub fn new(conn: &'a Connection, enabled: bool, headers: &'a HeaderMap) -> Self {
        Self {
            conn,
            enabled,
            headers,
            actor_type: ActorType::System,
            user_id: None,
            action: AuditAction::RecordUsage, // Placeholder, should always be set
            resource_type: "",
            resource_id: "",
            details: None,
            names: AuditLogNames::default(),
        }
    }

    /// Set the actor type and optional user ID.
    pub fn actor(mut self, actor_type: ActorType, user_id: Option<&'a str>) -> Self {
        self.actor_type = actor_type;
        self.user_id = user_id;
        self
    }

    /// Set the action being performed.
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = action;
        self
    }

    /// Set the resource type and ID being acted upon.
    pub fn resource(mut self, resource_type: &'a str, resource_id: &'a str) -> Self {
        self.resource_type = resource_type;
        self.resource_id = resource_id;
        self
    }

    /// Set optional details JSON.
    pub fn details(mut self, details: &'a serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Set human-readable names for display.
    pub fn names(mut self, names: &AuditLogNames) -> Self {
        self.names = names.clone();
        self
    }

    /// Save the audit log entry to the database.
    pub fn save(self) -> Result<AuditLog> {
        let (ip, ua) = extract_request_info(self.headers);
        queries::create_audit_log(
            self.conn,
            self.enabled,
            self.actor_type,
            self.user_id,
            self.action.as_ref(),
            self.resource_type,
            self.resource_id,
            self.details,
            ip.as_deref(),
            ua.as_deref(),
            &self.names,
        )
    }
}
