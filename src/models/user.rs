use serde::{Deserialize, Serialize};

use crate::crypto::MIN_PASSWORD_LEN;
use crate::error::{AppError, Result};

use super::deserialize_optional_nullable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Customers start unapproved and cannot log in until an admin approves.
    pub approved: bool,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Monthly spend ceiling used by the plan recommender. None = no budget.
    pub budget_limit: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Self-service registration payload. Always creates an unapproved customer.
#[derive(Debug, Deserialize)]
pub struct Signup {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub budget_limit: Option<f64>,
}

impl Signup {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_name(&self.name)?;
        validate_password(&self.password)?;
        validate_budget_limit(self.budget_limit)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Admin-side user creation. Admins are approved immediately; customers
/// default to unapproved unless `approved` is set explicitly.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub budget_limit: Option<f64>,
}

impl CreateUser {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_name(&self.name)?;
        validate_password(&self.password)?;
        validate_budget_limit(self.budget_limit)?;
        Ok(())
    }
}

/// Admin-side user update.
#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub approved: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub address: Option<Option<String>>,
    /// Use null to clear the budget, omit to leave unchanged.
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub budget_limit: Option<Option<f64>>,
}

impl UpdateUser {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            validate_name(name)?;
        }
        if let Some(Some(limit)) = self.budget_limit {
            validate_budget_limit(Some(limit))?;
        }
        Ok(())
    }
}

/// Customer self-service profile update. Role and approval are not touchable
/// from the portal.
#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub budget_limit: Option<Option<f64>>,
}

impl UpdateProfile {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            validate_name(name)?;
        }
        if let Some(Some(limit)) = self.budget_limit {
            validate_budget_limit(Some(limit))?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePassword {
    pub fn validate(&self) -> Result<()> {
        validate_password(&self.new_password)
    }
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("Email must not be empty".into()));
    }
    // Not RFC-grade validation; the unique index is the real gate. This just
    // rejects obvious garbage before it reaches the database.
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::BadRequest("Email must contain '@'".into()));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(AppError::BadRequest(format!("Invalid email address: {}", email)));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn validate_budget_limit(limit: Option<f64>) -> Result<()> {
    if let Some(limit) = limit
        && (!limit.is_finite() || limit < 0.0)
    {
        return Err(AppError::BadRequest(
            "Budget limit must be a non-negative number".into(),
        ));
    }
    Ok(())
}
