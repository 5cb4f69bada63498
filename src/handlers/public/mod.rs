mod auth;

pub use auth::*;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::db::AppState;
use crate::rate_limit;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Unauthenticated surface. Signup and login sit behind the strict
/// per-IP tier; health checks get the relaxed one.
pub fn router(rate_limit: RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .layer(rate_limit::strict_layer(rate_limit.strict_rpm))
        .merge(
            Router::new()
                .route("/health", get(health))
                .layer(rate_limit::relaxed_layer(rate_limit.relaxed_rpm)),
        )
}
