//! Prefixed ID generation for Fiberdesk entities.
//!
//! Every row ID carries an `fd_` brand prefix plus an entity tag, so an ID
//! seen in a log line or a support ticket identifies its table at a glance.
//!
//! Format: `fd_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &[
    "fd_usr_",
    "fd_plan_",
    "fd_sub_",
    "fd_use_",
    "fd_ses_",
    "fd_log_",
];

/// Validate that a string is a valid Fiberdesk prefixed ID.
///
/// This is a cheap check to reject garbage before hitting the database.
/// Validates format: `fd_{entity}_{32_hex_chars}`
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];

    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that have prefixed IDs in Fiberdesk.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    User,
    Plan,
    Subscription,
    UsageLog,
    Session,
    AuditLog,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::User => "fd_usr",
            Self::Plan => "fd_plan",
            Self::Subscription => "fd_sub",
            Self::UsageLog => "fd_use",
            Self::Session => "fd_ses",
            Self::AuditLog => "fd_log",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}
