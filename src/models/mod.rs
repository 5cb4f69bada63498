mod analytics;
mod audit_log;
mod plan;
mod session;
mod subscription;
mod usage;
mod user;

pub use analytics::*;
pub use audit_log::*;
pub use plan::*;
pub use session::*;
pub use subscription::*;
pub use usage::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Deserialize a double Option field where:
/// - Field absent in JSON → None (don't update)
/// - Field present with null → Some(None) (set to NULL in DB)
/// - Field present with value → Some(Some(value)) (set to value)
pub(crate) fn deserialize_optional_nullable<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(Some(value))
}
