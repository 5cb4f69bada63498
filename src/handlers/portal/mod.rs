mod achievements;
mod chat;
mod dashboard;
mod plans;
mod profile;
mod recommendations;
mod subscriptions;
mod usage;

pub use achievements::*;
pub use chat::*;
pub use dashboard::*;
pub use plans::*;
pub use profile::*;
pub use recommendations::*;
pub use subscriptions::*;
pub use usage::*;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::db::AppState;
use crate::middleware::session_auth;

/// Self-service surface for any authenticated, approved account.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/portal/me", get(get_me))
        .route("/portal/me", put(update_me))
        .route("/portal/me/password", put(change_password))
        .route("/portal/dashboard", get(get_dashboard))
        .route("/portal/plans", get(list_plans))
        .route("/portal/plans/{plan_id}", get(get_plan))
        .route("/portal/subscriptions", post(create_subscription))
        .route("/portal/subscriptions", get(list_subscriptions))
        .route("/portal/subscriptions/{subscription_id}", get(get_subscription))
        .route(
            "/portal/subscriptions/{subscription_id}/pause",
            post(pause_subscription),
        )
        .route(
            "/portal/subscriptions/{subscription_id}/resume",
            post(resume_subscription),
        )
        .route(
            "/portal/subscriptions/{subscription_id}/cancel",
            post(cancel_subscription),
        )
        .route("/portal/usage", post(record_usage))
        .route("/portal/usage", get(list_usage))
        .route("/portal/usage/summary", get(usage_summary))
        .route("/portal/usage/forecast", get(usage_forecast))
        .route("/portal/recommendations", get(get_recommendations))
        .route("/portal/achievements", get(get_achievements))
        .route("/portal/chat", post(chat))
        .layer(middleware::from_fn_with_state(state.clone(), session_auth))
}
