use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActorType {
    Admin,
    Customer,
    Public,
    System,
}

/// Every action that can appear in the audit trail.
///
/// The snake_case serialization doubles as the stored `action` string, and
/// `formatted()` turns it into a verb phrase: `create_plan` -> "created plan".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    RegisterUser,
    CreateSession,
    RevokeSession,
    CreateUser,
    UpdateUser,
    ApproveUser,
    DeleteUser,
    UpdateProfile,
    ChangePassword,
    CreatePlan,
    UpdatePlan,
    DeletePlan,
    CreateSubscription,
    PauseSubscription,
    ResumeSubscription,
    CancelSubscription,
    RecordUsage,
    BootstrapAdmin,
    SeedDemoData,
    PurgeAuditLogs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: String,
    pub timestamp: i64,
    pub actor_type: ActorType,
    /// Acting user, when the actor was a logged-in account.
    pub user_id: Option<String>,
    /// Email of the acting user at the time of the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Name of the acting user at the time of the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    /// Name of the resource being acted upon (e.g., plan name, user name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Names to include in an audit log entry for human-readable display.
/// All fields are optional - IDs will be shown as fallback.
#[derive(Debug, Clone, Default)]
pub struct AuditLogNames {
    /// Name of the acting user
    pub user_name: Option<String>,
    /// Email of the acting user
    pub user_email: Option<String>,
    /// Name of the resource being acted upon
    pub resource_name: Option<String>,
}

impl AuditLogNames {
    /// Set the resource name.
    pub fn resource(mut self, name: impl Into<Option<String>>) -> Self {
        self.resource_name = name.into();
        self
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub actor_type: Option<ActorType>,
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub from_timestamp: Option<i64>,
    pub to_timestamp: Option<i64>,
    /// Maximum number of items to return (default: 50, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
}

impl AuditLogQuery {
    /// Get the limit, clamped to valid range
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    /// Get the offset, minimum 0
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

impl AuditLog {
    /// Format as a human-readable string for display.
    ///
    /// Format: `[TIMESTAMP] [ActorType] "Actor" VERB RESOURCE`
    ///
    /// Examples:
    /// - `[2025-01-15 14:32:05] [Admin]    "Rory Williams" approved user "Amy Pond"`
    /// - `[2025-01-15 14:32:05] [Customer] "Amy Pond" created subscription "Fiber 100"`
    pub fn formatted(&self) -> String {
        use chrono::{TimeZone, Utc};

        let timestamp = Utc
            .timestamp_opt(self.timestamp, 0)
            .single()
            .map(|dt| format!("[{}]", dt.format("%Y-%m-%d %H:%M:%S")))
            .unwrap_or_else(|| format!("[{}]", self.timestamp));

        // Actor type in brackets - fixed width for alignment (10 chars)
        // [Customer] is longest at 10 chars, pad others to match
        let actor_type = match self.actor_type {
            ActorType::Admin => "[Admin]   ",
            ActorType::Customer => "[Customer]",
            ActorType::Public => "[Public]  ",
            ActorType::System => "[System]  ",
        };

        // Actor name quoted, or (id) if no name
        let actor_display = self
            .user_name
            .as_ref()
            .map(|n| format!("\"{}\"", n))
            .or_else(|| self.user_id.as_ref().map(|id| format!("({})", id)))
            .unwrap_or_default();

        // Convert action to past-tense verb + object
        let verb_phrase = Self::action_to_verb_phrase(&self.action, &self.resource_type);

        // Resource: prefer name (quoted), fall back to ID
        let resource_display = self
            .resource_name
            .as_ref()
            .map(|n| format!("\"{}\"", n))
            .unwrap_or_else(|| self.resource_id.clone());

        if actor_display.is_empty() {
            format!("{} {} {} {}", timestamp, actor_type, verb_phrase, resource_display)
        } else {
            format!(
                "{} {} {} {} {}",
                timestamp, actor_type, actor_display, verb_phrase, resource_display
            )
        }
    }

    /// Convert an action string to a past-tense verb phrase.
    /// e.g., "create_plan" -> "created plan"
    fn action_to_verb_phrase(action: &str, resource_type: &str) -> String {
        let parts: Vec<&str> = action.split('_').collect();
        if parts.is_empty() {
            return action.to_string();
        }

        let verb = Self::to_past_tense(parts[0]);

        // If action has more parts, use them as the object
        // Otherwise fall back to resource_type
        if parts.len() > 1 {
            let object = parts[1..].join(" ");
            format!("{} {}", verb, object)
        } else {
            format!("{} {}", verb, resource_type)
        }
    }

    /// Convert a verb to past tense.
    fn to_past_tense(verb: &str) -> &str {
        match verb {
            "register" => "registered",
            "create" => "created",
            "update" => "updated",
            "delete" => "deleted",
            "approve" => "approved",
            "change" => "changed",
            "pause" => "paused",
            "resume" => "resumed",
            "cancel" => "canceled",
            "record" => "recorded",
            "revoke" => "revoked",
            "seed" => "seeded",
            "bootstrap" => "bootstrapped",
            "purge" => "purged",
            other => other, // Unknown verbs pass through unchanged
        }
    }
}

/// Wrapper for AuditLog that includes a human-readable `formatted` field.
/// Used in JSON responses so an admin console can display readable text
/// without calling the separate text endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogResponse {
    #[serde(flatten)]
    pub log: AuditLog,
    pub formatted: String,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(log: AuditLog) -> Self {
        let formatted = log.formatted();
        Self { log, formatted }
    }
}
