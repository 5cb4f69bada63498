mod from_row;
mod schema;
pub mod queries;

pub use from_row::*;
pub use schema::{init_audit_db, init_db};

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::rate_limit::LoginRateLimiter;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding database pools and configuration
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (users, plans, subscriptions, usage, sessions)
    pub db: DbPool,
    /// Audit log database pool (separate file to isolate growth)
    pub audit: DbPool,
    pub audit_log_enabled: bool,
    /// Lifetime of newly issued login sessions, in seconds.
    pub session_ttl_secs: i64,
    /// Per-email login attempt limiter, shared across handlers.
    pub login_limiter: Arc<LoginRateLimiter>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
