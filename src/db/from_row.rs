//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! This module provides a `FromRow` trait that models can implement to
//! define how they are constructed from database rows, plus helper functions
//! for common query patterns.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
///
/// This provides graceful error handling instead of panicking when database
/// contains invalid enum values (from corruption, migration errors, etc.).
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Parse an ISO `YYYY-MM-DD` column into a `NaiveDate`.
fn parse_day(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(col)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    /// Construct an instance from a database row.
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str =
    "id, email, name, password_hash, role, approved, phone, address, budget_limit, created_at, updated_at";

pub const PLAN_COLS: &str = "id, name, description, category, price, speed_mbps, data_cap_gb, validity_days, active, popularity_score, created_at, updated_at";

pub const SUBSCRIPTION_COLS: &str =
    "id, user_id, plan_id, status, started_at, ended_at, created_at, updated_at";

/// Joined columns for subscription detail views; requires `subscriptions s`
/// joined with `plans p`.
pub const SUBSCRIPTION_WITH_PLAN_COLS: &str = "s.id, s.user_id, s.plan_id, s.status, s.started_at, s.ended_at, s.created_at, s.updated_at, p.name, p.category, p.price, p.speed_mbps, p.data_cap_gb";

pub const USAGE_LOG_COLS: &str = "id, user_id, subscription_id, day, gb_used, created_at";

pub const SESSION_COLS: &str =
    "id, user_id, token_prefix, token_hash, created_at, expires_at, revoked_at";

pub const AUDIT_LOG_COLS: &str = "id, timestamp, actor_type, user_id, user_email, user_name, action, resource_type, resource_id, resource_name, details, ip_address, user_agent";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            password_hash: row.get(3)?,
            role: parse_enum(row, 4, "role")?,
            approved: row.get::<_, i32>(5)? != 0,
            phone: row.get(6)?,
            address: row.get(7)?,
            budget_limit: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl FromRow for Plan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Plan {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            price: row.get(4)?,
            speed_mbps: row.get(5)?,
            data_cap_gb: row.get(6)?,
            validity_days: row.get(7)?,
            active: row.get::<_, i32>(8)? != 0,
            popularity_score: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            user_id: row.get(1)?,
            plan_id: row.get(2)?,
            status: parse_enum(row, 3, "status")?,
            started_at: row.get(4)?,
            ended_at: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for SubscriptionWithPlan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(SubscriptionWithPlan {
            id: row.get(0)?,
            user_id: row.get(1)?,
            plan_id: row.get(2)?,
            status: parse_enum(row, 3, "status")?,
            started_at: row.get(4)?,
            ended_at: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            plan_name: row.get(8)?,
            plan_category: row.get(9)?,
            plan_price: row.get(10)?,
            plan_speed_mbps: row.get(11)?,
            plan_data_cap_gb: row.get(12)?,
        })
    }
}

impl FromRow for UsageLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(UsageLog {
            id: row.get(0)?,
            user_id: row.get(1)?,
            subscription_id: row.get(2)?,
            day: parse_day(row, 3, "day")?,
            gb_used: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Session {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Session {
            id: row.get(0)?,
            user_id: row.get(1)?,
            token_prefix: row.get(2)?,
            token_hash: row.get(3)?,
            created_at: row.get(4)?,
            expires_at: row.get(5)?,
            revoked_at: row.get(6)?,
        })
    }
}

impl FromRow for AuditLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let details: Option<String> = row.get(10)?;
        Ok(AuditLog {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            actor_type: parse_enum(row, 2, "actor_type")?,
            user_id: row.get(3)?,
            user_email: row.get(4)?,
            user_name: row.get(5)?,
            action: row.get(6)?,
            resource_type: row.get(7)?,
            resource_id: row.get(8)?,
            resource_name: row.get(9)?,
            details: details.and_then(|s| serde_json::from_str(&s).ok()),
            ip_address: row.get(11)?,
            user_agent: row.get(12)?,
        })
    }
}

impl FromRow for PlanRevenue {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PlanRevenue {
            plan_id: row.get(0)?,
            plan_name: row.get(1)?,
            category: row.get(2)?,
            price: row.get(3)?,
            active_subscribers: row.get(4)?,
            stopped_subscribers: row.get(5)?,
            canceled_subscribers: row.get(6)?,
            previous_subscribers: row.get(7)?,
            total_subscribers: row.get(8)?,
            monthly_revenue: row.get(9)?,
        })
    }
}
