use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params, types::Value};
use uuid::Uuid;

use crate::crypto::hash_secret;
use crate::error::Result;
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{
    AUDIT_LOG_COLS, FromRow, PLAN_COLS, SESSION_COLS, SUBSCRIPTION_COLS,
    SUBSCRIPTION_WITH_PLAN_COLS, USAGE_LOG_COLS, USER_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Current UTC calendar day; usage logs are keyed by this.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query for efficiency.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    /// Use this for Option<T> where Some(v) = set to v, None = set to NULL.
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    /// Double-Option update: outer None leaves the column alone, Some(inner)
    /// writes the inner value or NULL.
    fn set_opt_nullable<V: Into<Value>>(self, column: &'static str, value: Option<Option<V>>) -> Self {
        match value {
            Some(inner) => self.set_nullable(column, inner),
            None => self,
        }
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }

    /// Execute the update and return the updated entity using RETURNING clause.
    /// Returns None if no row matched. An update with no fields degenerates to
    /// a plain read of the current row.
    fn execute_returning<T: FromRow>(
        mut self,
        conn: &Connection,
        returning_cols: &str,
    ) -> Result<Option<T>> {
        if self.fields.is_empty() {
            let sql = format!("SELECT {} FROM {} WHERE id = ?", returning_cols, self.table);
            return conn
                .query_row(&sql, params![self.id], T::from_row)
                .optional()
                .map_err(Into::into);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? RETURNING {}",
            self.table,
            sets.join(", "),
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

// ============ Users ============

/// Create a user. The password must already be hashed by the caller.
///
/// Approval default: admins are usable immediately, customers wait for
/// approval unless the input says otherwise.
pub fn create_user(conn: &Connection, input: &CreateUser, password_hash: &str) -> Result<User> {
    let id = EntityType::User.gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();
    let approved = input.approved.unwrap_or(input.role == Role::Admin);

    conn.execute(
        "INSERT INTO users (id, email, name, password_hash, role, approved, phone, address, budget_limit, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &id,
            &email,
            &input.name,
            password_hash,
            input.role.as_str(),
            approved,
            &input.phone,
            &input.address,
            &input.budget_limit,
            now,
            now
        ],
    )?;

    Ok(User {
        id,
        email,
        name: input.name.clone(),
        password_hash: password_hash.to_string(),
        role: input.role,
        approved,
        phone: input.phone.clone(),
        address: input.address.clone(),
        budget_limit: input.budget_limit,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

pub fn list_users_paginated(
    conn: &Connection,
    limit: i64,
    offset: i64,
    role: Option<Role>,
    approved: Option<bool>,
) -> Result<(Vec<User>, i64)> {
    let mut where_clause = String::from("WHERE 1=1");
    if role.is_some() {
        where_clause.push_str(" AND role = ?");
    }
    if approved.is_some() {
        where_clause.push_str(" AND approved = ?");
    }

    let build_filter_params = || -> Vec<Box<dyn rusqlite::ToSql>> {
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(role) = role {
            params.push(Box::new(role.as_str()));
        }
        if let Some(approved) = approved {
            params.push(Box::new(approved));
        }
        params
    };

    let filter_params = build_filter_params();
    let filter_refs: Vec<&dyn rusqlite::ToSql> = filter_params.iter().map(|b| b.as_ref()).collect();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM users {}", where_clause),
        filter_refs.as_slice(),
        |row| row.get(0),
    )?;

    let mut select_params = build_filter_params();
    select_params.push(Box::new(limit));
    select_params.push(Box::new(offset));
    let select_refs: Vec<&dyn rusqlite::ToSql> = select_params.iter().map(|b| b.as_ref()).collect();

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        USER_COLS, where_clause
    ))?;
    let items = stmt
        .query_map(select_refs.as_slice(), User::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((items, total))
}

/// Admin-side update. Returns the updated user, or None if not found.
pub fn update_user(conn: &Connection, id: &str, input: &UpdateUser) -> Result<Option<User>> {
    UpdateBuilder::new("users", id)
        .with_updated_at()
        .set_opt("name", input.name.clone())
        .set_opt("role", input.role.map(|r| r.as_str().to_string()))
        .set_opt("approved", input.approved)
        .set_opt_nullable("phone", input.phone.clone())
        .set_opt_nullable("address", input.address.clone())
        .set_opt_nullable("budget_limit", input.budget_limit)
        .execute_returning(conn, USER_COLS)
}

/// Customer self-service profile update.
pub fn update_profile(conn: &Connection, id: &str, input: &UpdateProfile) -> Result<Option<User>> {
    UpdateBuilder::new("users", id)
        .with_updated_at()
        .set_opt("name", input.name.clone())
        .set_opt_nullable("phone", input.phone.clone())
        .set_opt_nullable("address", input.address.clone())
        .set_opt_nullable("budget_limit", input.budget_limit)
        .execute_returning(conn, USER_COLS)
}

pub fn approve_user(conn: &Connection, id: &str) -> Result<Option<User>> {
    UpdateBuilder::new("users", id)
        .with_updated_at()
        .set("approved", true)
        .execute_returning(conn, USER_COLS)
}

pub fn set_password(conn: &Connection, id: &str, password_hash: &str) -> Result<bool> {
    UpdateBuilder::new("users", id)
        .with_updated_at()
        .set("password_hash", password_hash.to_string())
        .execute(conn)
}

/// Delete a user and everything hanging off them. SQLite foreign keys are
/// not enforced by default, so dependent rows go explicitly.
pub fn delete_user(conn: &Connection, id: &str) -> Result<bool> {
    conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![id])?;
    conn.execute("DELETE FROM usage_logs WHERE user_id = ?1", params![id])?;
    conn.execute("DELETE FROM subscriptions WHERE user_id = ?1", params![id])?;
    let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .map_err(Into::into)
}

pub fn count_admins(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users WHERE role = 'admin'", [], |row| row.get(0))
        .map_err(Into::into)
}

/// Admins other than the given user; the last-admin guards key off this.
pub fn count_other_admins(conn: &Connection, user_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = 'admin' AND id != ?1",
        params![user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

// ============ Sessions ============

/// Generate a session token with fd_tok_ prefix.
pub fn generate_session_token() -> String {
    format!("fd_tok_{}", Uuid::new_v4().as_simple())
}

/// Create a login session. Returns the session row and the raw token;
/// the token is never recoverable afterwards.
pub fn create_session(conn: &Connection, user_id: &str, ttl_secs: i64) -> Result<(Session, String)> {
    let token = generate_session_token();
    let id = EntityType::Session.gen_id();
    let now = now();
    let session = Session {
        id,
        user_id: user_id.to_string(),
        token_prefix: token[..12].to_string(),
        token_hash: hash_secret(&token),
        created_at: now,
        expires_at: now + ttl_secs,
        revoked_at: None,
    };

    conn.execute(
        "INSERT INTO sessions (id, user_id, token_prefix, token_hash, created_at, expires_at, revoked_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
        params![
            &session.id,
            &session.user_id,
            &session.token_prefix,
            &session.token_hash,
            session.created_at,
            session.expires_at
        ],
    )?;

    Ok((session, token))
}

/// Look up a live session by raw token and return it with its user.
pub fn get_session_by_token(conn: &Connection, token: &str) -> Result<Option<(Session, User)>> {
    let hash = hash_secret(token);

    let session: Option<Session> = query_one(
        conn,
        &format!(
            "SELECT {} FROM sessions WHERE token_hash = ?1 AND revoked_at IS NULL AND expires_at > unixepoch()",
            SESSION_COLS
        ),
        &[&hash],
    )?;

    if let Some(session) = session
        && let Some(user) = get_user_by_id(conn, &session.user_id)?
    {
        return Ok(Some((session, user)));
    }

    Ok(None)
}

pub fn revoke_session(conn: &Connection, session_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE sessions SET revoked_at = ?1 WHERE id = ?2 AND revoked_at IS NULL",
        params![now(), session_id],
    )?;
    Ok(affected > 0)
}

/// Revoke every session of a user except one (used after password change).
pub fn revoke_other_sessions(conn: &Connection, user_id: &str, keep_session_id: &str) -> Result<usize> {
    let affected = conn.execute(
        "UPDATE sessions SET revoked_at = ?1 WHERE user_id = ?2 AND id != ?3 AND revoked_at IS NULL",
        params![now(), user_id, keep_session_id],
    )?;
    Ok(affected)
}

/// Drop sessions that can never authenticate again.
pub fn delete_dead_sessions(conn: &Connection) -> Result<usize> {
    let affected = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= unixepoch() OR revoked_at IS NOT NULL",
        [],
    )?;
    Ok(affected)
}

// ============ Plans ============

pub fn create_plan(conn: &Connection, input: &CreatePlan) -> Result<Plan> {
    let id = EntityType::Plan.gen_id();
    let now = now();
    let validity_days = input.validity_days.unwrap_or(30);
    let active = input.active.unwrap_or(true);

    conn.execute(
        "INSERT INTO plans (id, name, description, category, price, speed_mbps, data_cap_gb, validity_days, active, popularity_score, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11)",
        params![
            &id,
            &input.name,
            &input.description,
            &input.category,
            input.price,
            input.speed_mbps,
            input.data_cap_gb,
            validity_days,
            active,
            now,
            now
        ],
    )?;

    Ok(Plan {
        id,
        name: input.name.clone(),
        description: input.description.clone(),
        category: input.category.clone(),
        price: input.price,
        speed_mbps: input.speed_mbps,
        data_cap_gb: input.data_cap_gb,
        validity_days,
        active,
        popularity_score: 0,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_plan_by_id(conn: &Connection, id: &str) -> Result<Option<Plan>> {
    query_one(
        conn,
        &format!("SELECT {} FROM plans WHERE id = ?1", PLAN_COLS),
        &[&id],
    )
}

pub fn get_plan_by_name(conn: &Connection, name: &str) -> Result<Option<Plan>> {
    query_one(
        conn,
        &format!("SELECT {} FROM plans WHERE name = ?1", PLAN_COLS),
        &[&name],
    )
}

/// Catalog listing in stable fetch order. The recommender depends on this
/// order for its tie-breaking, so keep it deterministic.
pub fn list_active_plans(conn: &Connection, category: Option<&str>) -> Result<Vec<Plan>> {
    match category {
        Some(category) => query_all(
            conn,
            &format!(
                "SELECT {} FROM plans WHERE active = 1 AND category = ?1 ORDER BY created_at ASC, id ASC",
                PLAN_COLS
            ),
            &[&category],
        ),
        None => query_all(
            conn,
            &format!(
                "SELECT {} FROM plans WHERE active = 1 ORDER BY created_at ASC, id ASC",
                PLAN_COLS
            ),
            &[],
        ),
    }
}

pub fn list_plans_paginated(
    conn: &Connection,
    limit: i64,
    offset: i64,
    category: Option<&str>,
    include_inactive: bool,
) -> Result<(Vec<Plan>, i64)> {
    let mut where_clause = String::from("WHERE 1=1");
    if !include_inactive {
        where_clause.push_str(" AND active = 1");
    }
    if category.is_some() {
        where_clause.push_str(" AND category = ?");
    }

    let build_filter_params = || -> Vec<Box<dyn rusqlite::ToSql>> {
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(category) = category {
            params.push(Box::new(category.to_string()));
        }
        params
    };

    let filter_params = build_filter_params();
    let filter_refs: Vec<&dyn rusqlite::ToSql> = filter_params.iter().map(|b| b.as_ref()).collect();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM plans {}", where_clause),
        filter_refs.as_slice(),
        |row| row.get(0),
    )?;

    let mut select_params = build_filter_params();
    select_params.push(Box::new(limit));
    select_params.push(Box::new(offset));
    let select_refs: Vec<&dyn rusqlite::ToSql> = select_params.iter().map(|b| b.as_ref()).collect();

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM plans {} ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
        PLAN_COLS, where_clause
    ))?;
    let items = stmt
        .query_map(select_refs.as_slice(), Plan::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((items, total))
}

pub fn update_plan(conn: &Connection, id: &str, input: &UpdatePlan) -> Result<Option<Plan>> {
    UpdateBuilder::new("plans", id)
        .with_updated_at()
        .set_opt("name", input.name.clone())
        .set_opt_nullable("description", input.description.clone())
        .set_opt("category", input.category.clone())
        .set_opt("price", input.price)
        .set_opt("speed_mbps", input.speed_mbps)
        .set_opt("data_cap_gb", input.data_cap_gb)
        .set_opt("validity_days", input.validity_days)
        .set_opt("active", input.active)
        .set_opt("popularity_score", input.popularity_score)
        .execute_returning(conn, PLAN_COLS)
}

pub fn delete_plan(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM plans WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

pub fn count_subscriptions_for_plan(conn: &Connection, plan_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM subscriptions WHERE plan_id = ?1",
        params![plan_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

/// Bump the lifetime subscription counter on a plan.
pub fn increment_plan_popularity(conn: &Connection, plan_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE plans SET popularity_score = popularity_score + 1, updated_at = ?1 WHERE id = ?2",
        params![now(), plan_id],
    )?;
    Ok(())
}

// ============ Subscriptions ============

/// The customer's live (active or stopped) subscription to a plan, if any.
pub fn get_live_subscription(
    conn: &Connection,
    user_id: &str,
    plan_id: &str,
) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE user_id = ?1 AND plan_id = ?2 AND status IN ('active', 'stopped')",
            SUBSCRIPTION_COLS
        ),
        &[&user_id, &plan_id],
    )
}

/// Demote a customer's canceled subscriptions to a plan into the archive
/// state. Called before re-subscribing so history stays unambiguous.
pub fn archive_canceled_subscriptions(
    conn: &Connection,
    user_id: &str,
    plan_id: &str,
) -> Result<usize> {
    let affected = conn.execute(
        "UPDATE subscriptions SET status = 'previous', updated_at = ?1
         WHERE user_id = ?2 AND plan_id = ?3 AND status = 'canceled'",
        params![now(), user_id, plan_id],
    )?;
    Ok(affected)
}

pub fn create_subscription(conn: &Connection, user_id: &str, plan_id: &str) -> Result<Subscription> {
    let id = EntityType::Subscription.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO subscriptions (id, user_id, plan_id, status, started_at, ended_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'active', ?4, NULL, ?5, ?6)",
        params![&id, user_id, plan_id, now, now, now],
    )?;

    Ok(Subscription {
        id,
        user_id: user_id.to_string(),
        plan_id: plan_id.to_string(),
        status: SubscriptionStatus::Active,
        started_at: now,
        ended_at: None,
        created_at: now,
        updated_at: now,
    })
}

/// The user's most recently taken active subscription; usage rows snapshot
/// this so a log keeps pointing at the plan it was metered under.
pub fn latest_active_subscription(conn: &Connection, user_id: &str) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE user_id = ?1 AND status = 'active'
             ORDER BY created_at DESC LIMIT 1",
            SUBSCRIPTION_COLS
        ),
        &[&user_id],
    )
}

pub fn get_subscription_by_id(conn: &Connection, id: &str) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!("SELECT {} FROM subscriptions WHERE id = ?1", SUBSCRIPTION_COLS),
        &[&id],
    )
}

pub fn get_subscription_with_plan(conn: &Connection, id: &str) -> Result<Option<SubscriptionWithPlan>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions s JOIN plans p ON p.id = s.plan_id WHERE s.id = ?1",
            SUBSCRIPTION_WITH_PLAN_COLS
        ),
        &[&id],
    )
}

pub fn list_subscriptions_for_user(
    conn: &Connection,
    user_id: &str,
    status: Option<SubscriptionStatus>,
) -> Result<Vec<SubscriptionWithPlan>> {
    match status {
        Some(status) => query_all(
            conn,
            &format!(
                "SELECT {} FROM subscriptions s JOIN plans p ON p.id = s.plan_id
                 WHERE s.user_id = ?1 AND s.status = ?2 ORDER BY s.created_at DESC",
                SUBSCRIPTION_WITH_PLAN_COLS
            ),
            &[&user_id, &status.as_str()],
        ),
        None => query_all(
            conn,
            &format!(
                "SELECT {} FROM subscriptions s JOIN plans p ON p.id = s.plan_id
                 WHERE s.user_id = ?1 ORDER BY s.created_at DESC",
                SUBSCRIPTION_WITH_PLAN_COLS
            ),
            &[&user_id],
        ),
    }
}

pub fn list_subscriptions_paginated(
    conn: &Connection,
    filter: &SubscriptionFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<SubscriptionWithPlan>, i64)> {
    let mut where_clause = String::from("WHERE 1=1");
    if filter.user_id.is_some() {
        where_clause.push_str(" AND s.user_id = ?");
    }
    if filter.plan_id.is_some() {
        where_clause.push_str(" AND s.plan_id = ?");
    }
    if filter.status.is_some() {
        where_clause.push_str(" AND s.status = ?");
    }

    let build_filter_params = || -> Vec<Box<dyn rusqlite::ToSql>> {
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(ref v) = filter.user_id {
            params.push(Box::new(v.clone()));
        }
        if let Some(ref v) = filter.plan_id {
            params.push(Box::new(v.clone()));
        }
        if let Some(v) = filter.status {
            params.push(Box::new(v.as_str()));
        }
        params
    };

    let filter_params = build_filter_params();
    let filter_refs: Vec<&dyn rusqlite::ToSql> = filter_params.iter().map(|b| b.as_ref()).collect();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM subscriptions s {}", where_clause),
        filter_refs.as_slice(),
        |row| row.get(0),
    )?;

    let mut select_params = build_filter_params();
    select_params.push(Box::new(limit));
    select_params.push(Box::new(offset));
    let select_refs: Vec<&dyn rusqlite::ToSql> = select_params.iter().map(|b| b.as_ref()).collect();

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM subscriptions s JOIN plans p ON p.id = s.plan_id {}
         ORDER BY s.created_at DESC LIMIT ? OFFSET ?",
        SUBSCRIPTION_WITH_PLAN_COLS, where_clause
    ))?;
    let items = stmt
        .query_map(select_refs.as_slice(), SubscriptionWithPlan::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((items, total))
}

/// Move a subscription to a new status. `ended_at` is stamped only when the
/// transition terminates service (cancel).
pub fn set_subscription_status(
    conn: &Connection,
    id: &str,
    status: SubscriptionStatus,
    stamp_ended_at: bool,
) -> Result<Option<Subscription>> {
    let builder = UpdateBuilder::new("subscriptions", id)
        .with_updated_at()
        .set("status", status.as_str().to_string());
    let builder = if stamp_ended_at {
        builder.set("ended_at", now())
    } else {
        builder
    };
    builder.execute_returning(conn, SUBSCRIPTION_COLS)
}

/// Per-status counts for one user: (active, stopped, canceled, previous).
pub fn user_subscription_counts(conn: &Connection, user_id: &str) -> Result<(i64, i64, i64, i64)> {
    conn.query_row(
        "SELECT
            SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END),
            SUM(CASE WHEN status = 'stopped' THEN 1 ELSE 0 END),
            SUM(CASE WHEN status = 'canceled' THEN 1 ELSE 0 END),
            SUM(CASE WHEN status = 'previous' THEN 1 ELSE 0 END)
         FROM subscriptions WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok((
                row.get::<_, Option<i64>>(0)?.unwrap_or(0),
                row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                row.get::<_, Option<i64>>(3)?.unwrap_or(0),
            ))
        },
    )
    .map_err(Into::into)
}

/// Sum of plan prices over the user's active subscriptions.
pub fn user_monthly_cost(conn: &Connection, user_id: &str) -> Result<f64> {
    conn.query_row(
        "SELECT COALESCE(SUM(p.price), 0) FROM subscriptions s
         JOIN plans p ON p.id = s.plan_id
         WHERE s.user_id = ?1 AND s.status = 'active'",
        params![user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

/// Distinct plan categories the user ever subscribed to.
pub fn count_distinct_plan_categories(conn: &Connection, user_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(DISTINCT p.category) FROM subscriptions s
         JOIN plans p ON p.id = s.plan_id
         WHERE s.user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

/// Sum of plan prices over every subscription the user ever took.
pub fn user_lifetime_spend(conn: &Connection, user_id: &str) -> Result<f64> {
    conn.query_row(
        "SELECT COALESCE(SUM(p.price), 0) FROM subscriptions s
         JOIN plans p ON p.id = s.plan_id
         WHERE s.user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

// ============ Usage Logs ============

/// Record usage for a day. Repeated records for the same day accumulate.
pub fn record_usage(
    conn: &Connection,
    user_id: &str,
    subscription_id: Option<&str>,
    day: NaiveDate,
    gb_used: f64,
) -> Result<UsageLog> {
    let id = EntityType::UsageLog.gen_id();
    let sql = format!(
        "INSERT INTO usage_logs (id, user_id, subscription_id, day, gb_used, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id, day) DO UPDATE SET gb_used = usage_logs.gb_used + excluded.gb_used
         RETURNING {}",
        USAGE_LOG_COLS
    );
    conn.query_row(
        &sql,
        params![&id, user_id, subscription_id, day.to_string(), gb_used, now()],
        UsageLog::from_row,
    )
    .map_err(Into::into)
}

/// Usage rows on or after `from_day`, oldest first.
pub fn list_usage_since(conn: &Connection, user_id: &str, from_day: NaiveDate) -> Result<Vec<UsageLog>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM usage_logs WHERE user_id = ?1 AND day >= ?2 ORDER BY day ASC",
            USAGE_LOG_COLS
        ),
        &[&user_id, &from_day.to_string()],
    )
}

/// Every usage row for a user, oldest first. Forecasting input.
pub fn list_all_usage(conn: &Connection, user_id: &str) -> Result<Vec<UsageLog>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM usage_logs WHERE user_id = ?1 ORDER BY day ASC",
            USAGE_LOG_COLS
        ),
        &[&user_id],
    )
}

/// (total GB, days logged) over the window starting at `from_day`.
pub fn usage_window_totals(
    conn: &Connection,
    user_id: &str,
    from_day: NaiveDate,
) -> Result<(f64, i64)> {
    conn.query_row(
        "SELECT COALESCE(SUM(gb_used), 0), COUNT(*) FROM usage_logs WHERE user_id = ?1 AND day >= ?2",
        params![user_id, from_day.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(Into::into)
}

/// Total GB the user ever logged.
pub fn lifetime_usage_gb(conn: &Connection, user_id: &str) -> Result<f64> {
    conn.query_row(
        "SELECT COALESCE(SUM(gb_used), 0) FROM usage_logs WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

/// Combined data cap of the user's active plans; None when nothing is active.
pub fn active_cap_for_user(conn: &Connection, user_id: &str) -> Result<Option<f64>> {
    conn.query_row(
        "SELECT SUM(p.data_cap_gb) FROM subscriptions s
         JOIN plans p ON p.id = s.plan_id
         WHERE s.user_id = ?1 AND s.status = 'active'",
        params![user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

// ============ Analytics ============

pub fn admin_overview(conn: &Connection) -> Result<AdminOverview> {
    let (total_users, total_admins, pending_approvals): (i64, i64, i64) = conn.query_row(
        "SELECT
            COUNT(*),
            SUM(CASE WHEN role = 'admin' THEN 1 ELSE 0 END),
            SUM(CASE WHEN role = 'user' AND approved = 0 THEN 1 ELSE 0 END)
         FROM users",
        [],
        |row| {
            Ok((
                row.get(0)?,
                row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                row.get::<_, Option<i64>>(2)?.unwrap_or(0),
            ))
        },
    )?;

    let (total_plans, active_plans): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), SUM(CASE WHEN active = 1 THEN 1 ELSE 0 END) FROM plans",
        [],
        |row| Ok((row.get(0)?, row.get::<_, Option<i64>>(1)?.unwrap_or(0))),
    )?;

    let (total_subscriptions, active_subscriptions, stopped_subscriptions): (i64, i64, i64) = conn
        .query_row(
            "SELECT
                COUNT(*),
                SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END),
                SUM(CASE WHEN status = 'stopped' THEN 1 ELSE 0 END)
             FROM subscriptions",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                    row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                ))
            },
        )?;

    let monthly_revenue: f64 = conn.query_row(
        "SELECT COALESCE(SUM(p.price), 0) FROM subscriptions s
         JOIN plans p ON p.id = s.plan_id WHERE s.status = 'active'",
        [],
        |row| row.get(0),
    )?;

    let lifetime_revenue: f64 = conn.query_row(
        "SELECT COALESCE(SUM(p.price), 0) FROM subscriptions s
         JOIN plans p ON p.id = s.plan_id",
        [],
        |row| row.get(0),
    )?;

    Ok(AdminOverview {
        total_users,
        total_customers: total_users - total_admins,
        total_admins,
        pending_approvals,
        total_plans,
        active_plans,
        total_subscriptions,
        active_subscriptions,
        stopped_subscriptions,
        monthly_revenue,
        lifetime_revenue,
    })
}

/// Per-plan subscriber and revenue breakdown, most lucrative plans first.
pub fn revenue_report(conn: &Connection) -> Result<RevenueReport> {
    let plans: Vec<PlanRevenue> = query_all(
        conn,
        "SELECT
            p.id, p.name, p.category, p.price,
            COALESCE(SUM(CASE WHEN s.status = 'active' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN s.status = 'stopped' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN s.status = 'canceled' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN s.status = 'previous' THEN 1 ELSE 0 END), 0),
            COUNT(s.id),
            COALESCE(SUM(CASE WHEN s.status = 'active' THEN 1 ELSE 0 END), 0) * p.price AS monthly_revenue
         FROM plans p
         LEFT JOIN subscriptions s ON s.plan_id = p.id
         GROUP BY p.id
         ORDER BY monthly_revenue DESC, p.created_at ASC",
        &[],
    )?;

    let monthly_revenue = plans.iter().map(|p| p.monthly_revenue).sum();
    let lifetime_revenue = plans
        .iter()
        .map(|p| p.total_subscribers as f64 * p.price)
        .sum();

    Ok(RevenueReport {
        plans,
        monthly_revenue,
        lifetime_revenue,
    })
}

// ============ Audit Logs ============

#[allow(clippy::too_many_arguments)]
pub fn create_audit_log(
    conn: &Connection,
    enabled: bool,
    actor_type: ActorType,
    user_id: Option<&str>,
    action: &str,
    resource_type: &str,
    resource_id: &str,
    details: Option<&serde_json::Value>,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
    names: &AuditLogNames,
) -> Result<AuditLog> {
    let log = AuditLog {
        id: EntityType::AuditLog.gen_id(),
        timestamp: now(),
        actor_type,
        user_id: user_id.map(String::from),
        user_email: names.user_email.clone(),
        user_name: names.user_name.clone(),
        action: action.to_string(),
        resource_type: resource_type.to_string(),
        resource_id: resource_id.to_string(),
        resource_name: names.resource_name.clone(),
        details: details.cloned(),
        ip_address: ip_address.map(String::from),
        user_agent: user_agent.map(String::from),
    };

    // Skip database insert if audit logging is disabled
    if !enabled {
        return Ok(log);
    }

    let details_str = log.details.as_ref().map(|d| d.to_string());

    conn.execute(
        "INSERT INTO audit_logs (id, timestamp, actor_type, user_id, user_email, user_name, action, resource_type, resource_id, resource_name, details, ip_address, user_agent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            &log.id,
            log.timestamp,
            log.actor_type.as_ref(),
            &log.user_id,
            &log.user_email,
            &log.user_name,
            &log.action,
            &log.resource_type,
            &log.resource_id,
            &log.resource_name,
            &details_str,
            &log.ip_address,
            &log.user_agent
        ],
    )?;

    Ok(log)
}

pub fn query_audit_logs(conn: &Connection, query: &AuditLogQuery) -> Result<(Vec<AuditLog>, i64)> {
    // Helper to build filter params (avoids duplication between COUNT and SELECT)
    let build_filter_params = || -> Vec<Box<dyn rusqlite::ToSql>> {
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(ref v) = query.actor_type {
            params.push(Box::new(v.as_ref().to_string()));
        }
        if let Some(ref v) = query.user_id {
            params.push(Box::new(v.clone()));
        }
        if let Some(ref v) = query.action {
            params.push(Box::new(v.clone()));
        }
        if let Some(ref v) = query.resource_type {
            params.push(Box::new(v.clone()));
        }
        if let Some(ref v) = query.resource_id {
            params.push(Box::new(v.clone()));
        }
        if let Some(v) = query.from_timestamp {
            params.push(Box::new(v));
        }
        if let Some(v) = query.to_timestamp {
            params.push(Box::new(v));
        }
        params
    };

    // Build WHERE clause
    let mut where_clause = String::from("WHERE 1=1");
    if query.actor_type.is_some() {
        where_clause.push_str(" AND actor_type = ?");
    }
    if query.user_id.is_some() {
        where_clause.push_str(" AND user_id = ?");
    }
    if query.action.is_some() {
        where_clause.push_str(" AND action = ?");
    }
    if query.resource_type.is_some() {
        where_clause.push_str(" AND resource_type = ?");
    }
    if query.resource_id.is_some() {
        where_clause.push_str(" AND resource_id = ?");
    }
    if query.from_timestamp.is_some() {
        where_clause.push_str(" AND timestamp >= ?");
    }
    if query.to_timestamp.is_some() {
        where_clause.push_str(" AND timestamp <= ?");
    }

    // Get total count
    let count_sql = format!("SELECT COUNT(*) FROM audit_logs {}", where_clause);
    let filter_params = build_filter_params();
    let filter_refs: Vec<&dyn rusqlite::ToSql> = filter_params.iter().map(|b| b.as_ref()).collect();
    let total: i64 = conn.query_row(&count_sql, filter_refs.as_slice(), |row| row.get(0))?;

    // Build SELECT query with pagination
    let select_sql = format!(
        "SELECT {} FROM audit_logs {} ORDER BY timestamp DESC LIMIT ? OFFSET ?",
        AUDIT_LOG_COLS, where_clause
    );

    // Reuse filter params and add pagination
    let mut select_params = build_filter_params();
    select_params.push(Box::new(query.limit()));
    select_params.push(Box::new(query.offset()));

    let mut stmt = conn.prepare(&select_sql)?;
    let select_refs: Vec<&dyn rusqlite::ToSql> = select_params.iter().map(|b| b.as_ref()).collect();
    let logs = stmt
        .query_map(select_refs.as_slice(), AuditLog::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((logs, total))
}

/// Delete audit rows older than the cutoff. Returns rows removed.
pub fn purge_audit_logs_before(conn: &Connection, cutoff_timestamp: i64) -> Result<usize> {
    let affected = conn.execute(
        "DELETE FROM audit_logs WHERE timestamp < ?1",
        params![cutoff_timestamp],
    )?;
    Ok(affected)
}
