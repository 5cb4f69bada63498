mod analytics;
mod audit_logs;
mod plans;
mod subscriptions;
mod usage;
mod users;

pub use analytics::*;
pub use audit_logs::*;
pub use plans::*;
pub use subscriptions::*;
pub use usage::*;
pub use users::*;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::db::AppState;
use crate::middleware::admin_auth;

/// Back-office surface. Every route requires an admin session.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/overview", get(get_overview))
        .route("/admin/users", post(create_user))
        .route("/admin/users", get(list_users))
        .route("/admin/users/{user_id}", get(get_user))
        .route("/admin/users/{user_id}", put(update_user))
        .route("/admin/users/{user_id}", delete(delete_user))
        .route("/admin/users/{user_id}/approve", post(approve_user))
        .route("/admin/plans", post(create_plan))
        .route("/admin/plans", get(list_plans))
        .route("/admin/plans/{plan_id}", get(get_plan))
        .route("/admin/plans/{plan_id}", put(update_plan))
        .route("/admin/plans/{plan_id}", delete(delete_plan))
        .route("/admin/subscriptions", get(list_subscriptions))
        .route("/admin/usage", post(record_usage_for_user))
        .route("/admin/analytics/revenue", get(get_revenue_report))
        .route("/admin/audit-logs", get(query_audit_logs))
        .route("/admin/audit-logs/text", get(query_audit_logs_text))
        .layer(middleware::from_fn_with_state(state, admin_auth))
}
