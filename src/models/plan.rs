use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::deserialize_optional_nullable;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Free-form grouping, e.g. "fiber", "dsl", "wireless".
    pub category: String,
    /// Monthly price in the account currency.
    pub price: f64,
    pub speed_mbps: f64,
    pub data_cap_gb: f64,
    /// Billing cycle length; subscriptions renew on this cadence.
    pub validity_days: i64,
    /// Inactive plans are hidden from customers but kept for history.
    pub active: bool,
    /// Lifetime count of subscriptions taken on this plan.
    pub popularity_score: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlan {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub price: f64,
    pub speed_mbps: f64,
    pub data_cap_gb: f64,
    #[serde(default)]
    pub validity_days: Option<i64>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl CreatePlan {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("Plan name must not be empty".into()));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::BadRequest("Category must not be empty".into()));
        }
        validate_price(self.price)?;
        validate_positive("Speed", self.speed_mbps)?;
        validate_positive("Data cap", self.data_cap_gb)?;
        if let Some(days) = self.validity_days
            && days <= 0
        {
            return Err(AppError::BadRequest("Validity must be at least 1 day".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlan {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub speed_mbps: Option<f64>,
    pub data_cap_gb: Option<f64>,
    pub validity_days: Option<i64>,
    pub active: Option<bool>,
    /// Admin override for the popularity counter.
    pub popularity_score: Option<i64>,
}

impl UpdatePlan {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name
            && name.trim().is_empty()
        {
            return Err(AppError::BadRequest("Plan name must not be empty".into()));
        }
        if let Some(ref category) = self.category
            && category.trim().is_empty()
        {
            return Err(AppError::BadRequest("Category must not be empty".into()));
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(speed) = self.speed_mbps {
            validate_positive("Speed", speed)?;
        }
        if let Some(cap) = self.data_cap_gb {
            validate_positive("Data cap", cap)?;
        }
        if let Some(days) = self.validity_days
            && days <= 0
        {
            return Err(AppError::BadRequest("Validity must be at least 1 day".into()));
        }
        if let Some(score) = self.popularity_score
            && score < 0
        {
            return Err(AppError::BadRequest("Popularity score must not be negative".into()));
        }
        Ok(())
    }
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::BadRequest("Price must be a non-negative number".into()));
    }
    Ok(())
}

fn validate_positive(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::BadRequest(format!("{} must be a positive number", what)));
    }
    Ok(())
}
